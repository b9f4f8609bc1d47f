use crate::header::Field;
use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    UnexpectedHeaderLength(isize),
    UnknownField(u8),
    UnknownOperation(u8),
    /// The payload does not fit in the 16 bit length field.
    LengthOverflow(usize),
    CapacityExceeded {
        field: Field,
        length: usize,
        capacity: usize,
    },
    InvalidShares(usize),
    WriteBufferTooSmall {
        needed: usize,
        available: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            UnexpectedHeaderLength(i) => {
                write!(f, "Unexpected `Header` length: `{}`", i)
            }
            UnknownField(id) => write!(f, "Unknown field id: `{}`", id),
            UnknownOperation(op) => write!(f, "Unknown operation: `{}`", op),
            LengthOverflow(len) => {
                write!(f, "Payload of `{}` bytes does not fit a frame", len)
            }
            CapacityExceeded {
                field,
                length,
                capacity,
            } => write!(
                f,
                "Length `{}` exceeds the `{:?}` capacity of `{}` bytes",
                length, field, capacity
            ),
            InvalidShares(d) => write!(f, "Unsupported number of shares: `{}`", d),
            WriteBufferTooSmall { needed, available } => write!(
                f,
                "Write buffer too small: needed `{}` bytes, got `{}`",
                needed, available
            ),
        }
    }
}
