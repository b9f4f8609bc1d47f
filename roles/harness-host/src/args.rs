//! CLI argument parsing for the host binary.
//!
//! Global options select the configuration and log file, the subcommand selects the driver.

use clap::{ArgAction, Parser, Subcommand};
use ext_config::{Config, File, FileFormat};
use harness_host::{CaptureSettings, HostConfig, HostResult};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Masked AEAD harness host", long_about = None)]
pub struct Args {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the TOML configuration file",
        default_value = "host-config.toml",
        global = true
    )]
    pub config_path: PathBuf,
    #[arg(
        short = 'f',
        long = "log-file",
        help = "Path to the log file. If not set, logs will only be written to stdout.",
        global = true
    )]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record batched encryptions together with their unrolled inputs.
    Capture {
        #[arg(short = 'n', long, help = "Total number of encryptions")]
        number: u32,
        #[arg(short = 'b', long, help = "Encryptions per run", default_value_t = 1)]
        batch: u32,
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        fixed_key: bool,
        #[arg(long, value_parser = parse_key, help = "Fixed key as 32 hex digits")]
        key: Option<[u8; 16]>,
        #[arg(long, default_value_t = 16)]
        message_len: usize,
        #[arg(long, default_value_t = 0)]
        ad_len: usize,
        #[arg(short = 'o', long, default_value = "capture.json")]
        output: PathBuf,
    },
    /// Check known answer vectors.
    Kat {
        file: PathBuf,
        #[arg(long, help = "Run the vectors on the local engine instead of the device")]
        reference: bool,
    },
}

impl Command {
    pub fn capture_settings(&self) -> Option<CaptureSettings> {
        match self {
            Command::Capture {
                number,
                batch,
                fixed_key,
                key,
                message_len,
                ad_len,
                ..
            } => Some(CaptureSettings {
                number: *number,
                batch: *batch,
                fixed_key: *fixed_key,
                key: *key,
                message_len: *message_len,
                ad_len: *ad_len,
            }),
            Command::Kat { .. } => None,
        }
    }
}

fn parse_key(src: &str) -> Result<[u8; 16], String> {
    let bytes = hex::decode(src).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("key of {} bytes, expected 16", b.len()))
}

/// Parses CLI arguments and loads the [`HostConfig`] from the specified file.
pub fn process_cli_args() -> HostResult<(HostConfig, Command)> {
    let args = Args::parse();
    let mut config: HostConfig = Config::builder()
        .add_source(File::from(args.config_path.as_path()).format(FileFormat::Toml))
        .build()
        .and_then(|settings| settings.try_deserialize::<HostConfig>())?;

    config.set_log_file(args.log_file);

    Ok((config, args.command))
}
