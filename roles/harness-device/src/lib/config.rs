use config_helpers_sca::duration_from_toml;
use const_sca::{
    DEFAULT_MAX_MESSAGE_LEN, DEFAULT_REPEAT_COUNT, DEFAULT_SHARES, DEFAULT_TRANSMIT_TIMEOUT_MS,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Configuration of the device simulator.
///
/// The device listens on [`DeviceConfig::listen_address`] for a single host at a time. Field
/// capacities are derived from [`DeviceConfig::max_message_len`] and
/// [`DeviceConfig::shares`].
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DeviceConfig {
    listen_address: String,
    #[serde(default = "default_shares")]
    shares: usize,
    #[serde(default = "default_max_message_len")]
    max_message_len: usize,
    #[serde(
        default = "default_transmit_timeout",
        deserialize_with = "duration_from_toml"
    )]
    transmit_timeout: Duration,
    #[serde(default)]
    report_auth_status: bool,
    #[serde(default = "default_repeat_count")]
    repeat_count: u32,
    #[serde(default = "default_fixed_key")]
    fixed_key: bool,
    #[serde(skip)]
    log_file: Option<PathBuf>,
}

fn default_shares() -> usize {
    DEFAULT_SHARES
}

fn default_max_message_len() -> usize {
    DEFAULT_MAX_MESSAGE_LEN
}

fn default_transmit_timeout() -> Duration {
    Duration::from_millis(DEFAULT_TRANSMIT_TIMEOUT_MS)
}

fn default_repeat_count() -> u32 {
    DEFAULT_REPEAT_COUNT
}

fn default_fixed_key() -> bool {
    true
}

impl DeviceConfig {
    /// Creates a new instance of the [`DeviceConfig`], every other setting takes its default.
    pub fn new(listen_address: String, shares: usize, max_message_len: usize) -> Self {
        Self {
            listen_address,
            shares,
            max_message_len,
            transmit_timeout: default_transmit_timeout(),
            report_auth_status: false,
            repeat_count: DEFAULT_REPEAT_COUNT,
            fixed_key: true,
            log_file: None,
        }
    }

    /// Returns the address the device listens on.
    pub fn listen_address(&self) -> &String {
        &self.listen_address
    }

    /// Returns the number of shares of the masked key.
    pub fn shares(&self) -> usize {
        self.shares
    }

    /// Returns the largest plaintext or associated data length accepted.
    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Returns the time allowed to send one response back.
    pub fn transmit_timeout(&self) -> Duration {
        self.transmit_timeout
    }

    /// Whether decrypt responses carry a trailing authentication status byte.
    pub fn report_auth_status(&self) -> bool {
        self.report_auth_status
    }

    /// Returns the repeat count used until the host sends one.
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Returns the key mode used until the host sends one.
    pub fn fixed_key(&self) -> bool {
        self.fixed_key
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn set_log_file(&mut self, log_file: Option<PathBuf>) {
        if let Some(log_file) = log_file {
            self.log_file = Some(log_file);
        }
    }

    pub fn set_report_auth_status(&mut self, report_auth_status: bool) {
        self.report_auth_status = report_auth_status;
    }

    pub fn set_transmit_timeout(&mut self, transmit_timeout: Duration) {
        self.transmit_timeout = transmit_timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ext_config::{Config, File, FileFormat};

    fn parse(src: &str) -> DeviceConfig {
        Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()
            .and_then(|settings| settings.try_deserialize::<DeviceConfig>())
            .unwrap()
    }

    #[test]
    fn missing_settings_take_defaults() {
        let config = parse("listen_address = \"127.0.0.1:34300\"");
        assert_eq!(config.shares(), 4);
        assert_eq!(config.max_message_len(), 256);
        assert_eq!(config.transmit_timeout(), Duration::from_millis(100));
        assert!(!config.report_auth_status());
        assert_eq!(config.repeat_count(), 1);
        assert!(config.fixed_key());
        assert!(config.log_file().is_none());
    }

    #[test]
    fn every_setting_is_read() {
        let config = parse(
            r#"
            listen_address = "0.0.0.0:4000"
            shares = 2
            max_message_len = 64
            transmit_timeout = { unit = "milliseconds", value = 250 }
            report_auth_status = true
            repeat_count = 10
            fixed_key = false
            "#,
        );
        assert_eq!(config.listen_address(), "0.0.0.0:4000");
        assert_eq!(config.shares(), 2);
        assert_eq!(config.max_message_len(), 64);
        assert_eq!(config.transmit_timeout(), Duration::from_millis(250));
        assert!(config.report_auth_status());
        assert_eq!(config.repeat_count(), 10);
        assert!(!config.fixed_key());
    }
}
