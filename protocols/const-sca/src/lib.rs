//! Central repository for all the harness constants

#![cfg_attr(feature = "no_std", no_std)]

pub const HEADER_SIZE: usize = 4;
pub const HEADER_FIELD_OFFSET: usize = 0;
pub const HEADER_OPERATION_OFFSET: usize = 1;
pub const HEADER_LEN_OFFSET: usize = 2;
pub const HEADER_LEN_SIZE: usize = 2;

pub const FIELD_CIPHERTEXT: u8 = 0;
pub const FIELD_ASSOCIATED_DATA: u8 = 1;
pub const FIELD_PLAINTEXT: u8 = 2;
pub const FIELD_NONCE: u8 = 3;
pub const FIELD_KEY: u8 = 4;
pub const FIELD_SEED: u8 = 5;
pub const FIELD_REPEAT_COUNT: u8 = 6;
pub const FIELD_FIXED_KEY: u8 = 7;

pub const OPERATION_STORE: u8 = 0;
pub const OPERATION_ENCRYPT: u8 = 1;
pub const OPERATION_DECRYPT: u8 = 2;

/// Number of 32 bit words in an unmasked key.
pub const KEY_WORDS: usize = 4;
pub const KEY_SIZE: usize = KEY_WORDS * 4;
pub const NONCE_SIZE: usize = 16;
pub const TAG_SIZE: usize = 16;
pub const SEED_SIZE: usize = 16;
pub const WORD_SIZE: usize = 4;

/// Largest masking order accepted by the harness.
pub const MAX_SHARES: usize = 8;
pub const DEFAULT_SHARES: usize = 4;
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 256;

/// Number of 128 bit bundles in a shadow state. Bundle 3 is the capacity row.
pub const SHADOW_BUNDLES: usize = 4;
pub const BUNDLE_WORDS: usize = 4;
/// Words buffered by the shadow PRNG between two refills.
pub const PRNG_TABLE_WORDS: usize = 16;

pub const DEFAULT_TRANSMIT_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_REPEAT_COUNT: u32 = 1;
