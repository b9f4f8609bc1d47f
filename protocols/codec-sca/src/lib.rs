#![no_std]

extern crate alloc;

mod decoder;
mod encoder;
pub mod error;

pub use error::{Error, Result};

pub use decoder::{Decoder, ProtocolState};
pub use encoder::Encoder;

pub use framing_sca::{self, Field, FieldLimits, Frame, Header, Operation};
