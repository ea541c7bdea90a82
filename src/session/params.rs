//! Session configuration and negotiated parameters.

use std::net::SocketAddr;

use crate::core::constants::{
    DEFAULT_DATAGRAM_SIZE, DEFAULT_WINDOW_SIZE, HEADER_SIZE, SIZE_UNIT,
};
use crate::core::Seq;

/// Sender-side knobs offered during the handshake.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Datagram capacity in bytes. Must be a multiple of
    /// [`SIZE_UNIT`](crate::core::constants::SIZE_UNIT) and at most
    /// `255 * SIZE_UNIT` to fit the parameter frame.
    pub datagram_size: usize,
    /// Sliding-window size in packets, at most 255.
    pub window_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            datagram_size: DEFAULT_DATAGRAM_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl SessionConfig {
    /// Datagram capacity expressed in wire units.
    pub fn payload_units(&self) -> u8 {
        (self.datagram_size / SIZE_UNIT) as u8
    }
}

/// Parameters both peers agreed on during the handshake.
#[derive(Debug, Clone, Copy)]
pub struct SessionParams {
    /// Address of the remote peer.
    pub peer: SocketAddr,
    /// First sequence number of the session, drawn by the receiver.
    pub initial_seq: Seq,
    /// Datagram capacity in bytes.
    pub datagram_size: usize,
    /// Sliding-window size in packets.
    pub window_size: usize,
}

impl SessionParams {
    /// File bytes that fit in one data packet.
    pub fn max_payload(&self) -> usize {
        self.datagram_size - HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.datagram_size, 8 * 1024);
        assert_eq!(config.window_size, 8);
        assert_eq!(config.payload_units(), 8);
    }

    #[test]
    fn test_max_payload_excludes_header() {
        let params = SessionParams {
            peer: "127.0.0.1:9000".parse().unwrap(),
            initial_seq: Seq::new(0),
            datagram_size: 1024,
            window_size: 4,
        };
        assert_eq!(params.max_payload(), 1024 - HEADER_SIZE);
    }
}
