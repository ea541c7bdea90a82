//! Sender-side sliding window.
//!
//! Tracks the contiguous run of unacknowledged packets, applies cumulative
//! acknowledgments, counts duplicate acks toward fast retransmit, and owns
//! the retransmission timer state. Pure state machine: no sockets, no tasks.

use std::collections::VecDeque;

use tokio::time::{Duration, Instant};

use crate::core::constants::DUP_ACK_THRESHOLD;
use crate::core::Seq;
use crate::transport::RtoEstimator;

/// Result of applying a cumulative acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The window base advanced, retiring this many packets.
    Advanced {
        /// Packets removed from the window.
        retired: u32,
    },
    /// The ack repeats the current base; the counter has not yet tripped.
    DuplicateAck {
        /// Consecutive duplicates seen so far.
        repeats: u32,
    },
    /// The duplicate threshold tripped; the base packet should be re-sent now.
    FastRetransmit,
    /// The ack is behind the window or ahead of anything in flight; ignored.
    Stale,
}

/// One packet awaiting acknowledgment.
#[derive(Debug, Clone)]
struct SentPacket {
    seq: Seq,
    frame: Vec<u8>,
    sent_at: Instant,
    retransmits: u32,
}

/// The sliding send window.
///
/// Invariant: `outstanding` holds exactly the packets in
/// `[base, next_seq)`, oldest first.
#[derive(Debug)]
pub struct SendWindow {
    base: Seq,
    next_seq: Seq,
    capacity: usize,
    outstanding: VecDeque<SentPacket>,
    dup_acks: u32,
    rto: RtoEstimator,
}

impl SendWindow {
    /// Create a window starting at `initial_seq` with room for `capacity`
    /// in-flight packets.
    pub fn new(initial_seq: Seq, capacity: usize) -> Self {
        Self {
            base: initial_seq,
            next_seq: initial_seq,
            capacity,
            outstanding: VecDeque::with_capacity(capacity),
            dup_acks: 0,
            rto: RtoEstimator::new(),
        }
    }

    /// Oldest unacknowledged sequence number.
    pub fn base(&self) -> Seq {
        self.base
    }

    /// Sequence number the next pushed packet will take.
    pub fn next_seq(&self) -> Seq {
        self.next_seq
    }

    /// Packets currently in flight.
    pub fn in_flight(&self) -> u32 {
        self.outstanding.len() as u32
    }

    /// Whether no packets are awaiting acknowledgment.
    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Whether the window has no room for another packet.
    pub fn is_full(&self) -> bool {
        self.outstanding.len() >= self.capacity
    }

    /// The retransmission estimator.
    pub fn rto(&self) -> &RtoEstimator {
        &self.rto
    }

    /// Mutable access to the retransmission estimator.
    pub fn rto_mut(&mut self) -> &mut RtoEstimator {
        &mut self.rto
    }

    /// Admit an encoded frame to the window, assigning it the next sequence
    /// number. The caller must have checked [`is_full`](Self::is_full).
    pub fn push(&mut self, frame: Vec<u8>) -> Seq {
        debug_assert!(!self.is_full());
        let seq = self.next_seq;
        self.outstanding.push_back(SentPacket {
            seq,
            frame,
            sent_at: Instant::now(),
            retransmits: 0,
        });
        self.next_seq = self.next_seq.next();
        seq
    }

    /// Apply a cumulative acknowledgment for everything below `ack`.
    pub fn on_ack(&mut self, ack: Seq) -> AckOutcome {
        let advance = ack.distance(self.base);

        if advance == 0 {
            if self.outstanding.is_empty() {
                return AckOutcome::Stale;
            }
            self.dup_acks += 1;
            if self.dup_acks >= DUP_ACK_THRESHOLD {
                self.dup_acks = 0;
                return AckOutcome::FastRetransmit;
            }
            return AckOutcome::DuplicateAck {
                repeats: self.dup_acks,
            };
        }

        // Acks for packets never sent (or far behind, wrapped into the upper
        // half of the ring) are ignored.
        if advance > self.in_flight() {
            return AckOutcome::Stale;
        }

        for _ in 0..advance {
            self.outstanding.pop_front();
        }
        self.base = ack;
        self.dup_acks = 0;
        AckOutcome::Advanced { retired: advance }
    }

    /// If the oldest packet's timer has expired, mark it retransmitted and
    /// return a copy of its frame. Backs the timeout off for the next expiry.
    pub fn take_retransmit(&mut self) -> Option<Vec<u8>> {
        let rto = self.rto.rto();
        let packet = self.outstanding.front_mut()?;
        if packet.sent_at.elapsed() < rto {
            return None;
        }
        packet.retransmits += 1;
        packet.sent_at = Instant::now();
        let frame = packet.frame.clone();
        self.rto.backoff();
        Some(frame)
    }

    /// Mark the oldest packet retransmitted for a fast retransmit and return
    /// a copy of its frame. Does not back the timer off; duplicate acks prove
    /// the link is alive.
    pub fn mark_fast_retransmit(&mut self) -> Option<Vec<u8>> {
        let packet = self.outstanding.front_mut()?;
        packet.retransmits += 1;
        packet.sent_at = Instant::now();
        Some(packet.frame.clone())
    }

    /// Time until the oldest packet's timer expires, or `None` when nothing
    /// is in flight.
    pub fn time_until_retransmit(&self) -> Option<Duration> {
        let packet = self.outstanding.front()?;
        Some(self.rto.rto().saturating_sub(packet.sent_at.elapsed()))
    }

    /// Sequence number of the oldest in-flight packet, for diagnostics.
    pub fn oldest_seq(&self) -> Option<Seq> {
        self.outstanding.front().map(|p| p.seq)
    }
}
