use cipher_sca::ReferenceEngine;
use config_helpers_sca::logging::init_logging;
use harness_device::{link, signals::TracingSignals, Session};
use tokio::{net::TcpListener, select};
use tracing::{error, info};

use crate::args::process_cli_args;

mod args;

#[tokio::main]
async fn main() {
    let config = match process_cli_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return;
        }
    };
    if let Err(e) = init_logging(config.log_file()) {
        eprintln!("{}", e);
        return;
    }

    let session = match Session::from_config(&config, ReferenceEngine::new(), TracingSignals::new())
    {
        Ok(session) => session,
        Err(e) => {
            error!("Invalid device configuration: {}", e);
            return;
        }
    };
    let listener = match TcpListener::bind(config.listen_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.listen_address(), e);
            return;
        }
    };
    info!(
        shares = config.shares(),
        max_message_len = config.max_message_len(),
        "Device listening on {}",
        config.listen_address()
    );

    select! {
        served = link::serve(
            listener,
            session,
            config.transmit_timeout(),
            config.report_auth_status(),
        ) => {
            if let Err(e) = served {
                error!("Link failed: {}", e);
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
