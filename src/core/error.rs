//! Error types for the DRIFT protocol.

use thiserror::Error;

/// Errors from encoding or decoding wire packets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Datagram is shorter than the fixed header it claims to carry.
    #[error("datagram too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum bytes required.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Control byte is not part of the protocol.
    #[error("unknown control byte: {0}")]
    UnknownControl(u8),

    /// Ack-family frame with a length that matches no ack-family shape.
    #[error("invalid frame length {len} for control byte {control}")]
    InvalidLength {
        /// Control byte of the offending frame.
        control: u8,
        /// Length of the offending datagram.
        len: usize,
    },
}

/// Errors establishing a session.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// No usable reply within the retry budget. Fatal.
    #[error("handshake failed: no reply after {attempts} attempts")]
    Timeout {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Socket-level failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors during an established transfer.
///
/// Packet loss, reordering and duplication are recovered inside the engines
/// and never surface here; these are the unrecoverable transport failures.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Socket or file i/o failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The session's ack loop already failed and reported its error.
    #[error("session failed earlier; transfer cannot continue")]
    SessionFailed,
}

/// Top-level DRIFT errors.
#[derive(Debug, Error)]
pub enum DriftError {
    /// Handshake error.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Transfer error.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// A batch must contain at least one file to terminate the session.
    #[error("batch contains no files")]
    EmptyBatch,

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
