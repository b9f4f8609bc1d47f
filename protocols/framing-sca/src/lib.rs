//! The harness link protocol is binary, with fixed message framing.
//! Each message begins with a four byte header naming the destination field, the operation to
//! run once the field is stored and the payload length, followed by exactly `length` payload
//! bytes.
//!
//! | Protocol Type | Byte Length | Description |
//! |---------------|-------------|-------------|
//! | `field_id`    | `U8`  | Destination of the payload: `0` ciphertext, `1` associated data, `2` plaintext, `3` nonce, `4` masked key, `5` PRNG seed, `6` repeat count, `7` fixed key flag. |
//! | `operation`   | `U8`  | `0` store only, `1` run encryption, `2` run decryption once the payload is stored. |
//! | `length`      | `U16` | Little endian length of the payload, not including this header. |
//! | `payload`     | `BYTES` | Field specific payload of `length` bytes. |
//!
//! The device answers an encryption run with the last ciphertext (`clen` bytes) and a decryption
//! run with the recovered plaintext (`mlen` bytes). Store operations get no answer.

#![no_std]
extern crate alloc;

/// Harness frame type
pub mod frame;

/// Harness framing errors
pub mod error;

/// Harness frame header
pub mod header;

pub use error::Error;
pub use frame::Frame;
pub use header::{Field, FieldLimits, Header, Operation};
