//! Three-way session handshake.
//!
//! The *receiver* initiates: it sends an enquiry carrying a randomized
//! initial sequence number, the sender replies with the transfer parameters,
//! and the receiver confirms. Every step is retried on a fixed interval up
//! to a retry budget; exhausting the budget is fatal.
//!
//! The confirmation can be lost without stalling the session: the sender
//! starts transmitting data as soon as it has sent its parameters at least
//! once, and the receiver re-confirms whenever it sees a parameter frame
//! again during the data phase.

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::timeout;

use crate::core::constants::{HANDSHAKE_MAX_RETRIES, HANDSHAKE_RETRY_INTERVAL, SIZE_UNIT};
use crate::core::{HandshakeError, Seq};
use crate::session::params::{SessionConfig, SessionParams};
use crate::transport::{DriftSocket, Packet};

/// Initiate a session as the receiving peer.
///
/// Sends an enquiry with a fresh random initial sequence number, waits for
/// the sender's parameters, and confirms them. A fresh enquiry goes out on
/// every retry so the exchange survives loss in either direction.
pub async fn initiate(
    socket: &mut DriftSocket,
    peer: SocketAddr,
) -> Result<SessionParams, HandshakeError> {
    initiate_with(socket, peer, HANDSHAKE_RETRY_INTERVAL, HANDSHAKE_MAX_RETRIES).await
}

pub(crate) async fn initiate_with(
    socket: &mut DriftSocket,
    peer: SocketAddr,
    retry_interval: Duration,
    max_retries: u32,
) -> Result<SessionParams, HandshakeError> {
    socket.connect(peer).await?;
    let initial_seq = Seq::random_initial(&mut rand::thread_rng());
    let enquiry = Packet::Enquiry { seq: initial_seq };
    debug!("initiating handshake with {peer}, initial seq {initial_seq}");

    for attempt in 1..=max_retries {
        socket.send_packet(&enquiry).await?;

        match timeout(retry_interval, socket.recv_packet()).await {
            Err(_) => {
                debug!("handshake attempt {attempt}/{max_retries}: no reply");
            }
            Ok(result) => match result? {
                Ok(Packet::Params {
                    payload_units,
                    window_size,
                }) => {
                    socket.send_packet(&Packet::Confirm).await?;
                    let params = SessionParams {
                        peer,
                        initial_seq,
                        datagram_size: payload_units as usize * SIZE_UNIT,
                        window_size: window_size as usize,
                    };
                    info!(
                        "session established with {peer}: datagram {} bytes, window {}",
                        params.datagram_size, params.window_size
                    );
                    return Ok(params);
                }
                Ok(other) => {
                    debug!("handshake: ignoring {} frame", other.kind());
                }
                Err(err) => {
                    warn!("handshake: discarding malformed datagram: {err}");
                }
            },
        }
    }

    Err(HandshakeError::Timeout {
        attempts: max_retries,
    })
}

/// Accept a session as the sending peer.
///
/// Blocks until an enquiry arrives from any address, locks onto that peer,
/// then replies with the configured parameters until the receiver confirms.
/// Repeated enquiries during this phase mean the previous reply was lost and
/// simply trigger another one.
pub async fn accept(
    socket: &mut DriftSocket,
    config: &SessionConfig,
) -> Result<SessionParams, HandshakeError> {
    accept_with(socket, config, HANDSHAKE_RETRY_INTERVAL, HANDSHAKE_MAX_RETRIES).await
}

pub(crate) async fn accept_with(
    socket: &mut DriftSocket,
    config: &SessionConfig,
    retry_interval: Duration,
    max_retries: u32,
) -> Result<SessionParams, HandshakeError> {
    let (initial_seq, peer) = loop {
        let (result, addr) = socket.recv_packet_from().await?;
        match result {
            Ok(Packet::Enquiry { seq }) => break (seq, addr),
            Ok(other) => debug!("awaiting enquiry: ignoring {} frame", other.kind()),
            Err(err) => warn!("awaiting enquiry: discarding malformed datagram: {err}"),
        }
    };

    socket.connect(peer).await?;
    debug!("enquiry from {peer}, initial seq {initial_seq}");

    let params_frame = Packet::Params {
        payload_units: config.payload_units(),
        window_size: config.window_size as u8,
    };

    for attempt in 1..=max_retries {
        socket.send_packet(&params_frame).await?;

        match timeout(retry_interval, socket.recv_packet()).await {
            Err(_) => {
                debug!("awaiting confirm, attempt {attempt}/{max_retries}");
            }
            Ok(result) => match result? {
                Ok(Packet::Confirm) => {
                    let params = SessionParams {
                        peer,
                        initial_seq,
                        datagram_size: config.datagram_size,
                        window_size: config.window_size,
                    };
                    info!(
                        "session established with {peer}: datagram {} bytes, window {}",
                        params.datagram_size, params.window_size
                    );
                    return Ok(params);
                }
                // A repeated enquiry means our parameter frame was lost.
                Ok(Packet::Enquiry { .. }) => {
                    debug!("enquiry repeated, re-sending parameters");
                }
                Ok(other) => {
                    debug!("awaiting confirm: ignoring {} frame", other.kind());
                }
                Err(err) => {
                    warn!("awaiting confirm: discarding malformed datagram: {err}");
                }
            },
        }
    }

    Err(HandshakeError::Timeout {
        attempts: max_retries,
    })
}
