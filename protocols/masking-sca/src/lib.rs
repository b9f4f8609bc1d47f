//! Higher order masking of the harness key and the shadow PRNG state used to refresh it.
//!
//! A key of [`const_sca::KEY_WORDS`] words is held as `D` shares per word ([`MaskedKey`]); the
//! key value is the XOR of the shares of each word and is never stored unmasked. Between two
//! cipher invocations the shares are either refreshed ([`simple_refresh`], value preserving) or
//! replaced ([`MaskedKey::rerandomize`]), drawing from a [`RandomSource`].
//!
//! The [`ShadowState`] keeps three generator slots apart so that the randomness consumed by the
//! cipher, the next nonce and the share refresh never come from the same stream. The generator
//! step itself is a black box behind the [`Permutation`] trait.

mod error;
mod prng;
mod shadow;
mod shares;

pub use error::{Error, Result};
pub use prng::{RandomSource, ShadowPrng};
pub use shadow::{
    bundle_from_bytes, bundle_to_bytes, Bundle, ChaChaPermutation, Permutation, ShadowState, Slot,
};
pub use shares::{simple_refresh, MaskedKey};

pub use rand_chacha::rand_core;
