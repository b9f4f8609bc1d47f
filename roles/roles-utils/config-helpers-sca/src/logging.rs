use std::{fmt, fs::OpenOptions, io, path::Path, str::FromStr, sync::Mutex};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, util::TryInitError, EnvFilter, Registry};

#[derive(Debug)]
pub enum Error {
    /// The log file can not be opened for appending
    LogFile(io::Error),
    /// A global subscriber is already installed
    Subscriber(TryInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LogFile(e) => write!(f, "Failed to open log file: {}", e),
            Error::Subscriber(e) => write!(f, "Failed to set global subscriber: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::LogFile(e)
    }
}

impl From<TryInitError> for Error {
    fn from(e: TryInitError) -> Self {
        Error::Subscriber(e)
    }
}

/// Level used when `RUST_LOG` is unset or does not name a level.
pub fn level_filter(rust_log: Option<&str>) -> LevelFilter {
    rust_log
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(LevelFilter::INFO)
}

/// Initialize logging to stdout and optionally to a file.
///
/// The level comes from `RUST_LOG`, defaulting to `info`. When `log_file` is set every event is
/// also appended to it, without ANSI colours.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), Error> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = EnvFilter::new(level_filter(rust_log.as_deref()).to_string());
    let stdout_layer = tracing_fmt::layer().with_writer(io::stdout);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file_layer = tracing_fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            Registry::default()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()?;
        }
        None => {
            Registry::default()
                .with(env_filter)
                .with(stdout_layer)
                .try_init()?;
        }
    }
    Ok(())
}
