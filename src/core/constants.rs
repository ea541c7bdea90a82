//! Protocol constants shared by both peers.
//!
//! These values are fixed by the wire protocol and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// CONTROL BYTES
// =============================================================================

/// Data packet, more of the current file follows.
pub const CONTROL_DATA: u8 = 0;

/// Data packet carrying the final bytes of a file.
pub const CONTROL_EOF: u8 = 3;

/// Data packet carrying the final bytes of the final file in the batch.
pub const CONTROL_EOT: u8 = 4;

/// Handshake enquiry from the receiver, carries the initial sequence number.
pub const CONTROL_ENQUIRY: u8 = 5;

/// Acknowledgment family: cumulative ack, parameter reply, or confirmation,
/// discriminated by datagram length.
pub const CONTROL_ACK: u8 = 6;

// =============================================================================
// FRAME SIZES
// =============================================================================

/// Data/ack/enquiry header size (control byte + 4-byte sequence number).
pub const HEADER_SIZE: usize = 5;

/// Size of a handshake confirmation frame (bare control byte).
pub const CONFIRM_FRAME_SIZE: usize = 1;

/// Size of a parameter reply frame (control byte + size units + window).
pub const PARAMS_FRAME_SIZE: usize = 3;

/// The unit in which the negotiated datagram size is expressed on the wire.
pub const SIZE_UNIT: usize = 1024;

/// Default negotiated datagram capacity.
pub const DEFAULT_DATAGRAM_SIZE: usize = 8 * 1024;

/// Default negotiated window size, in packets.
pub const DEFAULT_WINDOW_SIZE: usize = 8;

// =============================================================================
// SEQUENCE SPACE
// =============================================================================

/// Headroom kept below `u32::MAX` when drawing an initial sequence number,
/// sized for a 1 GiB file at the default payload size.
pub const INITIAL_SEQ_HEADROOM: u32 = 131_080;

// =============================================================================
// RETRANSMISSION
// =============================================================================

/// Duplicate cumulative acks tolerated before fast retransmit fires.
pub const DUP_ACK_THRESHOLD: u32 = 3;

// =============================================================================
// HANDSHAKE
// =============================================================================

/// Interval between handshake attempts.
pub const HANDSHAKE_RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Attempts before the handshake fails fatally.
pub const HANDSHAKE_MAX_RETRIES: u32 = 40;

// =============================================================================
// RECEIVER
// =============================================================================

/// How long the receiver waits for a datagram before re-sending its current
/// cumulative ack to re-request the expected packet.
pub const RECEIVER_STALL_TIMEOUT: Duration = Duration::from_millis(500);
