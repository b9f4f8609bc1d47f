//! TCP stand-in for the device serial line.
//!
//! A reader task forwards every chunk received from the host through a bounded channel to the
//! task owning the [`Session`], which is the only place device state is touched. Responses are
//! written back under a timeout; a response that can not be sent in time is dropped.

use async_channel::{bounded, Receiver};
use cipher_sca::CipherEngine;
use masking_sca::Permutation;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{tcp::OwnedWriteHalf, TcpListener, TcpStream},
    task, time,
};
use tracing::{debug, error, info, trace, warn};

use crate::{error::DeviceResult, session::Session, signals::Signals};

const LINK_CHANNEL_SIZE: usize = 64;
const READ_CHUNK_SIZE: usize = 512;

/// Accept hosts one after the other, forever. The session outlives every connection.
pub async fn serve<E, S, P>(
    listener: TcpListener,
    mut session: Session<E, S, P>,
    transmit_timeout: Duration,
    report_auth_status: bool,
) -> DeviceResult<()>
where
    E: CipherEngine,
    S: Signals,
    P: Permutation,
{
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Host connected from {}", peer);
        serve_connection(stream, &mut session, transmit_timeout, report_auth_status).await;
        info!("Host {} disconnected", peer);
    }
}

/// Serve a single host until it disconnects. A frame left incomplete by the host is dropped,
/// stored fields are kept.
pub async fn serve_connection<E, S, P>(
    stream: TcpStream,
    session: &mut Session<E, S, P>,
    transmit_timeout: Duration,
    report_auth_status: bool,
) where
    E: CipherEngine,
    S: Signals,
    P: Permutation,
{
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to disable Nagle on the link: {}", e);
    }
    let (mut reader, mut writer) = stream.into_split();
    let (sender, receiver) = bounded::<Vec<u8>>(LINK_CHANNEL_SIZE);

    // RECEIVE BYTES FROM THE HOST
    let reader_task = task::spawn(async move {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => {
                    debug!("Link closed by the host");
                    break;
                }
                Ok(n) => {
                    if let Err(e) = sender.send(chunk[..n].to_vec()).await {
                        error!("Failed to forward received bytes: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from link: {}", e);
                    break;
                }
            }
        }
        sender.close();
    });

    process(&receiver, session, &mut writer, transmit_timeout, report_auth_status).await;

    if let Err(e) = reader_task.await {
        warn!("Link reader task ended abnormally: {}", e);
    }

    // a new host always starts with a header
    if session.state().is_awaiting_data() {
        debug!(
            "Dropping partial frame, {} bytes were still missing",
            session.missing()
        );
    }
    session.reset_protocol();
}

async fn process<E, S, P>(
    receiver: &Receiver<Vec<u8>>,
    session: &mut Session<E, S, P>,
    writer: &mut OwnedWriteHalf,
    transmit_timeout: Duration,
    report_auth_status: bool,
) where
    E: CipherEngine,
    S: Signals,
    P: Permutation,
{
    while let Ok(chunk) = receiver.recv().await {
        trace!("Received {} bytes", chunk.len());
        for response in session.receive(&chunk) {
            let bytes = response.to_wire(report_auth_status);
            match time::timeout(transmit_timeout, writer.write_all(&bytes)).await {
                Ok(Ok(())) => trace!("Sent {} bytes", bytes.len()),
                Ok(Err(e)) => warn!("Failed to send response: {}", e),
                Err(_) => warn!(
                    "Response of {} bytes not sent within {:?}, dropped",
                    bytes.len(),
                    transmit_timeout
                ),
            }
        }
    }
}
