//! Receiver-side reassembly buffer.
//!
//! Restores sequence order from whatever the network delivers: in-order
//! packets are released immediately together with any buffered run they
//! unblock, out-of-order packets within the window are parked in a bounded
//! slot ring, and everything else is dropped. Delivery stops at a file
//! boundary even when more segments are buffered, because the window keeps
//! running across files.

use std::collections::VecDeque;

use crate::core::Seq;
use crate::transport::ControlFlag;

/// One in-order unit of file data released by the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Boundary marker carried by the packet.
    pub flag: ControlFlag,
    /// The packet's file bytes.
    pub payload: Vec<u8>,
}

/// What a received data packet did to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The packet was the expected one; it and any unblocked run are
    /// released, oldest first, stopping after a file boundary.
    Delivered {
        /// In-order segments ready to be written out.
        segments: Vec<Segment>,
        /// The new cumulative acknowledgment to send.
        ack: Seq,
    },
    /// Already-delivered packet; harmless retransmission artifact.
    Duplicate {
        /// The unchanged cumulative acknowledgment to re-send.
        ack: Seq,
    },
    /// Ahead of the expected packet but within the window; parked.
    Buffered {
        /// The unchanged cumulative acknowledgment to re-send.
        ack: Seq,
    },
    /// Too far ahead to buffer; dropped.
    OutOfWindow {
        /// The unchanged cumulative acknowledgment to re-send.
        ack: Seq,
    },
}

impl ReceiveOutcome {
    /// The cumulative acknowledgment this outcome calls for.
    pub fn ack(&self) -> Seq {
        match self {
            ReceiveOutcome::Delivered { ack, .. }
            | ReceiveOutcome::Duplicate { ack }
            | ReceiveOutcome::Buffered { ack }
            | ReceiveOutcome::OutOfWindow { ack } => *ack,
        }
    }
}

/// Bounded out-of-order buffer keyed by distance from the expected packet.
///
/// Invariant: `slots` always holds exactly `capacity` entries; slot `i`
/// corresponds to sequence number `expected + i`. Slot 0 is only ever
/// occupied transiently, while a drain is in progress.
#[derive(Debug)]
pub struct Reassembly {
    expected: Seq,
    slots: VecDeque<Option<Segment>>,
    capacity: usize,
}

impl Reassembly {
    /// Create a buffer expecting `initial_seq` first, holding at most
    /// `capacity` out-of-order packets (the negotiated window size).
    pub fn new(initial_seq: Seq, capacity: usize) -> Self {
        let mut slots = VecDeque::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            expected: initial_seq,
            slots,
            capacity,
        }
    }

    /// The next sequence number needed in order, i.e. the current
    /// cumulative acknowledgment.
    pub fn expected(&self) -> Seq {
        self.expected
    }

    /// Apply one received data packet.
    pub fn on_data(&mut self, seq: Seq, flag: ControlFlag, payload: Vec<u8>) -> ReceiveOutcome {
        if seq.before(self.expected) {
            return ReceiveOutcome::Duplicate { ack: self.expected };
        }

        let offset = seq.distance(self.expected) as usize;
        if offset == 0 {
            let segments = self.drain_from(Segment { flag, payload });
            return ReceiveOutcome::Delivered {
                segments,
                ack: self.expected,
            };
        }
        if offset >= self.capacity {
            return ReceiveOutcome::OutOfWindow { ack: self.expected };
        }

        // Re-buffering a duplicate of a parked packet just overwrites it.
        self.slots[offset] = Some(Segment { flag, payload });
        ReceiveOutcome::Buffered { ack: self.expected }
    }

    /// Release segments already buffered at the front of the window, if any.
    ///
    /// A drain stops at a file boundary, so the head of the next file can be
    /// sitting in the buffer when a file completes; the next consumer picks
    /// it up here before reading the socket.
    pub fn take_ready(&mut self) -> Option<(Vec<Segment>, Seq)> {
        let first = self.slots.front_mut()?.take()?;
        let segments = self.drain_from(first);
        Some((segments, self.expected))
    }

    /// Release `first` and the contiguous buffered run behind it, stopping
    /// after a boundary segment. Advances `expected` past everything
    /// released and keeps the slot ring aligned with it.
    fn drain_from(&mut self, first: Segment) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = first;
        loop {
            self.expected = self.expected.next();
            self.slots.pop_front();
            self.slots.push_back(None);

            let stop = current.flag.is_boundary();
            segments.push(current);
            if stop {
                break;
            }
            match self.slots.front_mut().and_then(|slot| slot.take()) {
                Some(next) => current = next,
                None => break,
            }
        }
        segments
    }
}
