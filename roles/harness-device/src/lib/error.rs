use std::fmt;

use codec_sca::framing_sca;

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors of the device role.
///
/// Protocol level errors never reach the binary: the session logs them and goes back to waiting
/// for a header.
#[derive(Debug)]
pub enum DeviceError {
    /// I/O-related error.
    Io(std::io::Error),
    /// Error from the `framing_sca` crate.
    Framing(framing_sca::Error),
    /// Error from the `codec_sca` crate.
    Codec(codec_sca::Error),
    /// Error from the `masking_sca` crate.
    Masking(masking_sca::Error),
    /// Error from the `cipher_sca` crate.
    Cipher(cipher_sca::Error),
    /// Configuration file can not be loaded.
    Config(ext_config::ConfigError),
    /// Logging can not be initialised.
    Logging(config_helpers_sca::logging::Error),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DeviceError::*;
        match self {
            Io(e) => write!(f, "I/O error: `{:?}`", e),
            Framing(e) => write!(f, "Framing error: `{}`", e),
            Codec(e) => write!(f, "Codec error: `{}`", e),
            Masking(e) => write!(f, "Masking error: `{}`", e),
            Cipher(e) => write!(f, "Cipher error: `{}`", e),
            Config(e) => write!(f, "Config error: `{}`", e),
            Logging(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(e: std::io::Error) -> DeviceError {
        DeviceError::Io(e)
    }
}

impl From<framing_sca::Error> for DeviceError {
    fn from(e: framing_sca::Error) -> DeviceError {
        DeviceError::Framing(e)
    }
}

impl From<codec_sca::Error> for DeviceError {
    fn from(e: codec_sca::Error) -> DeviceError {
        DeviceError::Codec(e)
    }
}

impl From<masking_sca::Error> for DeviceError {
    fn from(e: masking_sca::Error) -> DeviceError {
        DeviceError::Masking(e)
    }
}

impl From<cipher_sca::Error> for DeviceError {
    fn from(e: cipher_sca::Error) -> DeviceError {
        DeviceError::Cipher(e)
    }
}

impl From<ext_config::ConfigError> for DeviceError {
    fn from(e: ext_config::ConfigError) -> DeviceError {
        DeviceError::Config(e)
    }
}

impl From<config_helpers_sca::logging::Error> for DeviceError {
    fn from(e: config_helpers_sca::logging::Error) -> DeviceError {
        DeviceError::Logging(e)
    }
}
