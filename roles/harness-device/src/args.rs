//! CLI argument parsing for the device binary.

use clap::Parser;
use ext_config::{Config, File, FileFormat};
use harness_device::{DeviceConfig, DeviceResult};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Masked AEAD harness device", long_about = None)]
pub struct Args {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the TOML configuration file",
        default_value = "device-config.toml"
    )]
    pub config_path: PathBuf,
    #[arg(
        short = 'f',
        long = "log-file",
        help = "Path to the log file. If not set, logs will only be written to stdout."
    )]
    pub log_file: Option<PathBuf>,
}

/// Parses CLI arguments and loads the [`DeviceConfig`] from the specified file.
pub fn process_cli_args() -> DeviceResult<DeviceConfig> {
    let args = Args::parse();
    let mut config: DeviceConfig = Config::builder()
        .add_source(File::from(args.config_path.as_path()).format(FileFormat::Toml))
        .build()
        .and_then(|settings| settings.try_deserialize::<DeviceConfig>())?;

    config.set_log_file(args.log_file);

    Ok(config)
}
