//! Helpers shared by the harness device and host binaries: logging initialisation and serde
//! helpers for their TOML configuration files.

mod toml;
pub use toml::duration_from_toml;

pub mod logging;
