use cipher_sca::ReferenceEngine;
use config_helpers_sca::logging::init_logging;
use harness_host::{capture, kat, HarnessClient, HostConfig, HostResult};
use rand::rngs::OsRng;
use std::fs;
use tokio::select;
use tracing::{error, info};

use crate::args::{process_cli_args, Command};

mod args;

async fn run(config: &HostConfig, command: Command) -> HostResult<()> {
    let mut rng = OsRng;
    match &command {
        Command::Capture { output, .. } => {
            let Some(settings) = command.capture_settings() else {
                return Ok(());
            };
            let mut client = HarnessClient::connect(config).await?;
            let capture = capture::run_capture(&mut client, &settings, &mut rng).await?;
            if !capture.all_verified() {
                error!("Some batches do not match the reference engine");
            }
            capture.write_json(output)?;
        }
        Command::Kat { file, reference } => {
            let vectors = kat::parse_kat(&fs::read_to_string(file)?)?;
            info!("Loaded {} vectors from {}", vectors.len(), file.display());
            let report = if *reference {
                kat::run_on_reference(
                    &mut ReferenceEngine::new(),
                    config.shares(),
                    &vectors,
                    &mut rng,
                )?
            } else {
                let mut client = HarnessClient::connect(config).await?;
                kat::run_on_device(&mut client, &vectors, &mut rng).await?
            };
            if report.failed > 0 {
                error!("{} known answer tests failed", report.failed);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let (config, command) = match process_cli_args() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return;
        }
    };
    if let Err(e) = init_logging(config.log_file()) {
        eprintln!("{}", e);
        return;
    }

    select! {
        done = run(&config, command) => {
            if let Err(e) = done {
                error!("{}", e);
            }
        }
        interrupt_signal = tokio::signal::ctrl_c() => {
            match interrupt_signal {
                Ok(()) => info!("Interrupt received"),
                Err(err) => error!("Unable to listen for interrupt signal: {}", err),
            }
        }
    }
}
