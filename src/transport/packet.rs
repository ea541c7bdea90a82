//! Wire packet codec.
//!
//! Fixed-layout frames: a control byte, then for data/ack/enquiry frames a
//! little-endian `u32` sequence number, then payload bytes up to the
//! negotiated datagram capacity.
//!
//! Wire format:
//! ```text
//! +0  control (1 byte)     0 = data, 3 = end-of-file data,
//!                          4 = end-of-transmission data,
//!                          5 = handshake enquiry, 6 = ack family
//! +1  sequence (4 bytes LE) data/ack/enquiry frames only
//! +5  payload (variable)   data frames only
//! ```
//!
//! The ack family reuses control byte 6 and is discriminated by length:
//! 1 byte is a handshake confirmation, 3 bytes a parameter reply, 5 or more
//! a cumulative acknowledgment.
//!
//! The codec is pure and stateless; it knows nothing about window or file
//! state.

use crate::core::constants::{
    CONFIRM_FRAME_SIZE, CONTROL_ACK, CONTROL_DATA, CONTROL_ENQUIRY, CONTROL_EOF, CONTROL_EOT,
    HEADER_SIZE, PARAMS_FRAME_SIZE,
};
use crate::core::{CodecError, Seq};

/// Control marker carried by a data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlag {
    /// More of the current file follows.
    None,
    /// This packet carries the final bytes of the current file.
    EndOfFile,
    /// This packet carries the final bytes of the final file in the batch.
    EndOfTransmission,
}

impl ControlFlag {
    /// The control byte this flag encodes to.
    pub const fn control_byte(self) -> u8 {
        match self {
            ControlFlag::None => CONTROL_DATA,
            ControlFlag::EndOfFile => CONTROL_EOF,
            ControlFlag::EndOfTransmission => CONTROL_EOT,
        }
    }

    /// Whether this flag terminates the current file.
    pub const fn is_boundary(self) -> bool {
        !matches!(self, ControlFlag::None)
    }
}

/// A decoded wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// File bytes tagged with their position in the stream.
    Data {
        /// Position of this packet in the session's sequence space.
        seq: Seq,
        /// End-of-file / end-of-transmission marker.
        flag: ControlFlag,
        /// At most `max_payload` file bytes.
        payload: Vec<u8>,
    },
    /// Cumulative acknowledgment: all packets below `seq` were delivered.
    Ack {
        /// The receiver's next expected sequence number.
        seq: Seq,
    },
    /// Handshake enquiry from the receiver.
    Enquiry {
        /// The randomized initial sequence number for the session.
        seq: Seq,
    },
    /// Handshake parameter reply from the sender.
    Params {
        /// Negotiated datagram capacity in [`SIZE_UNIT`] units.
        ///
        /// [`SIZE_UNIT`]: crate::core::constants::SIZE_UNIT
        payload_units: u8,
        /// Negotiated window size in packets.
        window_size: u8,
    },
    /// Handshake confirmation from the receiver.
    Confirm,
}

impl Packet {
    /// Encode this packet into a fresh byte buffer.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Packet::Data { seq, flag, payload } => {
                let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
                buf.push(flag.control_byte());
                buf.extend_from_slice(&seq.raw().to_le_bytes());
                buf.extend_from_slice(payload);
                buf
            }
            Packet::Ack { seq } => {
                let mut buf = Vec::with_capacity(HEADER_SIZE);
                buf.push(CONTROL_ACK);
                buf.extend_from_slice(&seq.raw().to_le_bytes());
                buf
            }
            Packet::Enquiry { seq } => {
                let mut buf = Vec::with_capacity(HEADER_SIZE);
                buf.push(CONTROL_ENQUIRY);
                buf.extend_from_slice(&seq.raw().to_le_bytes());
                buf
            }
            Packet::Params {
                payload_units,
                window_size,
            } => vec![CONTROL_ACK, *payload_units, *window_size],
            Packet::Confirm => vec![CONTROL_ACK],
        }
    }

    /// Decode a received datagram.
    ///
    /// Truncated datagrams are rejected; callers discard them without
    /// advancing any sequence counter.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let control = *data.first().ok_or(CodecError::TooShort {
            expected: 1,
            actual: 0,
        })?;

        match control {
            CONTROL_DATA | CONTROL_EOF | CONTROL_EOT => {
                let seq = decode_seq(data)?;
                let flag = match control {
                    CONTROL_EOF => ControlFlag::EndOfFile,
                    CONTROL_EOT => ControlFlag::EndOfTransmission,
                    _ => ControlFlag::None,
                };
                Ok(Packet::Data {
                    seq,
                    flag,
                    payload: data[HEADER_SIZE..].to_vec(),
                })
            }
            CONTROL_ENQUIRY => Ok(Packet::Enquiry {
                seq: decode_seq(data)?,
            }),
            CONTROL_ACK => match data.len() {
                CONFIRM_FRAME_SIZE => Ok(Packet::Confirm),
                PARAMS_FRAME_SIZE => Ok(Packet::Params {
                    payload_units: data[1],
                    window_size: data[2],
                }),
                len if len >= HEADER_SIZE => Ok(Packet::Ack {
                    seq: decode_seq(data)?,
                }),
                len => Err(CodecError::InvalidLength { control, len }),
            },
            other => Err(CodecError::UnknownControl(other)),
        }
    }

    /// Short name of the frame kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Data { .. } => "data",
            Packet::Ack { .. } => "ack",
            Packet::Enquiry { .. } => "enquiry",
            Packet::Params { .. } => "params",
            Packet::Confirm => "confirm",
        }
    }
}

fn decode_seq(data: &[u8]) -> Result<Seq, CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }
    Ok(Seq::new(u32::from_le_bytes(data[1..5].try_into().unwrap())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_roundtrip() {
        let packet = Packet::Data {
            seq: Seq::new(0xDEAD_BEEF),
            flag: ControlFlag::None,
            payload: vec![1, 2, 3, 4, 5],
        };
        let encoded = packet.encode();
        assert_eq!(encoded.len(), HEADER_SIZE + 5);
        assert_eq!(encoded[0], CONTROL_DATA);
        assert_eq!(Packet::decode(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_boundary_flags_roundtrip() {
        for flag in [ControlFlag::EndOfFile, ControlFlag::EndOfTransmission] {
            let packet = Packet::Data {
                seq: Seq::new(7),
                flag,
                payload: Vec::new(),
            };
            let decoded = Packet::decode(&packet.encode()).unwrap();
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn test_ack_roundtrip() {
        let packet = Packet::Ack { seq: Seq::new(42) };
        let encoded = packet.encode();
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(Packet::decode(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_enquiry_roundtrip() {
        let packet = Packet::Enquiry {
            seq: Seq::new(u32::MAX - 5),
        };
        assert_eq!(Packet::decode(&packet.encode()).unwrap(), packet);
    }

    #[test]
    fn test_ack_family_length_discrimination() {
        assert_eq!(Packet::decode(&[CONTROL_ACK]).unwrap(), Packet::Confirm);
        assert_eq!(
            Packet::decode(&[CONTROL_ACK, 8, 4]).unwrap(),
            Packet::Params {
                payload_units: 8,
                window_size: 4
            }
        );
        assert!(matches!(
            Packet::decode(&[CONTROL_ACK, 0]),
            Err(CodecError::InvalidLength { control: 6, len: 2 })
        ));
    }

    #[test]
    fn test_truncated_data_rejected() {
        let encoded = Packet::Data {
            seq: Seq::new(1),
            flag: ControlFlag::None,
            payload: vec![0xAA; 16],
        }
        .encode();
        for cut in 1..HEADER_SIZE {
            assert!(matches!(
                Packet::decode(&encoded[..cut]),
                Err(CodecError::TooShort { .. })
            ));
        }
    }

    #[test]
    fn test_empty_datagram_rejected() {
        assert!(matches!(
            Packet::decode(&[]),
            Err(CodecError::TooShort { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn test_unknown_control_rejected() {
        assert!(matches!(
            Packet::decode(&[9, 0, 0, 0, 0]),
            Err(CodecError::UnknownControl(9))
        ));
    }

    #[test]
    fn test_empty_payload_data() {
        // An empty file still produces one tagged data packet.
        let packet = Packet::Data {
            seq: Seq::new(3),
            flag: ControlFlag::EndOfFile,
            payload: Vec::new(),
        };
        let encoded = packet.encode();
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(Packet::decode(&encoded).unwrap(), packet);
    }
}
