//! Host side of the masked AEAD evaluation harness.
//!
//! [`client::HarnessClient`] sends frames to a device and reads back its responses while keeping
//! a [`unroll::DeviceMirror`] of the device state, so the key, nonce and PRNG seed of every traced
//! encryption can be recovered offline. [`capture`] drives batched trace acquisition and [`kat`]
//! checks a device or a local engine against known answer vectors.
pub mod capture;
pub mod client;
pub mod config;
pub mod error;
pub mod kat;
pub mod unroll;

pub use capture::{run_capture, Capture, CaptureSettings};
pub use client::{Decrypted, HarnessClient};
pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use unroll::{DeviceMirror, RunInputs};
