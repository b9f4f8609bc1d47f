use core::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The decoder needs this many more bytes before it can make progress.
    MissingBytes(usize),
    /// A header was rejected; the decoder is waiting for a new header.
    FramingError(framing_sca::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<framing_sca::Error> for Error {
    fn from(e: framing_sca::Error) -> Self {
        Error::FramingError(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            MissingBytes(n) => write!(f, "Missing `{}` bytes", n),
            FramingError(e) => write!(f, "Framing error: `{}`", e),
        }
    }
}
