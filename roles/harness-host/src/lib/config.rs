use config_helpers_sca::duration_from_toml;
use const_sca::{DEFAULT_MAX_MESSAGE_LEN, DEFAULT_SHARES};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Configuration of the host tools. `shares`, `max_message_len` and `report_auth_status` must
/// match the device.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct HostConfig {
    device_address: String,
    #[serde(default = "default_shares")]
    shares: usize,
    #[serde(default = "default_max_message_len")]
    max_message_len: usize,
    #[serde(default)]
    report_auth_status: bool,
    #[serde(
        default = "default_response_timeout",
        deserialize_with = "duration_from_toml"
    )]
    response_timeout: Duration,
    #[serde(skip)]
    log_file: Option<PathBuf>,
}

fn default_shares() -> usize {
    DEFAULT_SHARES
}

fn default_max_message_len() -> usize {
    DEFAULT_MAX_MESSAGE_LEN
}

fn default_response_timeout() -> Duration {
    Duration::from_secs(5)
}

impl HostConfig {
    pub fn new(device_address: String, shares: usize, max_message_len: usize) -> Self {
        Self {
            device_address,
            shares,
            max_message_len,
            report_auth_status: false,
            response_timeout: default_response_timeout(),
            log_file: None,
        }
    }

    pub fn device_address(&self) -> &String {
        &self.device_address
    }

    pub fn shares(&self) -> usize {
        self.shares
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    pub fn report_auth_status(&self) -> bool {
        self.report_auth_status
    }

    /// Longest wait for a complete response.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use ext_config::{Config, File, FileFormat};

    fn parse(src: &str) -> HostConfig {
        Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()
            .and_then(|settings| settings.try_deserialize::<HostConfig>())
            .unwrap()
    }

    #[test]
    fn only_the_device_address_is_required() {
        let config = parse("device_address = \"127.0.0.1:34300\"");
        assert_eq!(config.shares(), DEFAULT_SHARES);
        assert_eq!(config.max_message_len(), DEFAULT_MAX_MESSAGE_LEN);
        assert!(!config.report_auth_status());
        assert_eq!(config.response_timeout(), Duration::from_secs(5));
        assert!(config.log_file().is_none());
    }

    #[test]
    fn response_timeout_is_a_duration_table() {
        let config = parse(
            "device_address = \"device:1\"\n\
             shares = 2\n\
             response_timeout = { unit = \"milliseconds\", value = 250 }",
        );
        assert_eq!(config.shares(), 2);
        assert_eq!(config.response_timeout(), Duration::from_millis(250));
    }
}
