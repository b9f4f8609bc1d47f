use core::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// Masking order outside `1..=MAX_SHARES`
    InvalidShares(usize),
    /// Serialized key does not hold `KEY_WORDS * shares` words
    InvalidKeyLength { expected: usize, actual: usize },
    /// Two keys with different masking orders were combined
    SharesMismatch { expected: usize, actual: usize },
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            InvalidShares(d) => write!(f, "Unsupported number of shares: `{}`", d),
            InvalidKeyLength { expected, actual } => write!(
                f,
                "Masked key must be `{}` bytes, got `{}`",
                expected, actual
            ),
            SharesMismatch { expected, actual } => write!(
                f,
                "Masked keys have `{}` and `{}` shares",
                expected, actual
            ),
        }
    }
}
