use core::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// Output buffer can not hold the result
    OutputTooSmall { needed: usize, available: usize },
    /// Ciphertext shorter than the authentication tag
    CiphertextTooShort(usize),
    /// Tag mismatch on decryption, the output still holds the unverified plaintext
    AuthenticationFailed,
    /// Errors from the `aes_gcm` crate
    Aead(aes_gcm::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            OutputTooSmall { needed, available } => write!(
                f,
                "Output buffer too small: needed `{}` bytes, got `{}`",
                needed, available
            ),
            CiphertextTooShort(len) => {
                write!(f, "Ciphertext of `{}` bytes is shorter than the tag", len)
            }
            AuthenticationFailed => write!(f, "Authentication failed"),
            Aead(e) => write!(f, "AEAD error: `{:?}`", e),
        }
    }
}

impl From<aes_gcm::Error> for Error {
    fn from(e: aes_gcm::Error) -> Self {
        Error::Aead(e)
    }
}
