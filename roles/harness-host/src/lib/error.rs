use std::fmt;

use codec_sca::framing_sca;

pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug)]
pub enum HostError {
    /// I/O-related error.
    Io(std::io::Error),
    /// No response from the device in time.
    Timeout { expected: usize },
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
    /// Capture output can not be serialized.
    Json(serde_json::Error),
    /// Malformed hex string.
    Hex(hex::FromHexError),
    /// Malformed known answer test file.
    Kat { line: usize, reason: String },
    /// Capture settings rejected.
    InvalidSettings(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HostError::*;
        match self {
            Io(e) => write!(f, "I/O error: `{:?}`", e),
            Timeout { expected } => {
                write!(f, "Timed out waiting for a `{}` byte response", expected)
            }
            Framing(e) => write!(f, "Framing error: `{}`", e),
            Codec(e) => write!(f, "Codec error: `{}`", e),
            Masking(e) => write!(f, "Masking error: `{}`", e),
            Cipher(e) => write!(f, "Cipher error: `{}`", e),
            Config(e) => write!(f, "Config error: `{}`", e),
            Logging(e) => write!(f, "{}", e),
            Json(e) => write!(f, "JSON error: `{}`", e),
            Hex(e) => write!(f, "Hex error: `{}`", e),
            Kat { line, reason } => write!(f, "KAT file line {}: {}", line, reason),
            InvalidSettings(reason) => write!(f, "Invalid settings: {}", reason),
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> HostError {
        HostError::Io(e)
    }
}

impl From<framing_sca::Error> for HostError {
    fn from(e: framing_sca::Error) -> HostError {
        HostError::Framing(e)
    }
}

impl From<codec_sca::Error> for HostError {
    fn from(e: codec_sca::Error) -> HostError {
        HostError::Codec(e)
    }
}

impl From<masking_sca::Error> for HostError {
    fn from(e: masking_sca::Error) -> HostError {
        HostError::Masking(e)
    }
}

impl From<cipher_sca::Error> for HostError {
    fn from(e: cipher_sca::Error) -> HostError {
        HostError::Cipher(e)
    }
}

impl From<ext_config::ConfigError> for HostError {
    fn from(e: ext_config::ConfigError) -> HostError {
        HostError::Config(e)
    }
}

impl From<config_helpers_sca::logging::Error> for HostError {
    fn from(e: config_helpers_sca::logging::Error) -> HostError {
        HostError::Logging(e)
    }
}

impl From<serde_json::Error> for HostError {
    fn from(e: serde_json::Error) -> HostError {
        HostError::Json(e)
    }
}

impl From<hex::FromHexError> for HostError {
    fn from(e: hex::FromHexError) -> HostError {
        HostError::Hex(e)
    }
}
