//! The cipher engine driven by the harness.
//!
//! The harness never looks inside the authenticated encryption transform: it hands the engine a
//! masked key, a nonce, associated data and a message, plus the randomness source the engine
//! may draw its masks from, and gets back the length of what was written. [`CipherEngine`] is
//! that contract. [`ReferenceEngine`] is a plain software implementation, used by tests and by
//! the device simulator; it is not protected against side channels.

mod aead_cipher;
mod error;

pub use aead_cipher::{Aes128Gcm128, CipherEngine, ReferenceEngine};
pub use error::{Error, Result};
