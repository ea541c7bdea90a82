//! Retransmission timeout estimation.
//!
//! The timeout starts conservative, doubles on every expiry while a loss
//! episode lasts, and is re-derived from the observed per-packet pace after
//! each completed file.

use std::time::Duration;

/// Timing constants for the retransmission estimator.
pub mod constants {
    use std::time::Duration;

    /// Timeout used before any pace has been observed.
    pub const INITIAL_RTO: Duration = Duration::from_millis(2000);

    /// Floor for the adaptive timeout.
    pub const MIN_RTO: Duration = Duration::from_millis(100);

    /// Ceiling for the adaptive timeout.
    pub const MAX_RTO: Duration = Duration::from_secs(60);

    /// Safety margin applied to the observed per-packet time.
    pub const FILE_RTO_MULTIPLIER: f64 = 1.5;

    /// Exponential backoff factor applied on each expiry.
    pub const BACKOFF_MULTIPLIER: u32 = 2;
}

use constants::{BACKOFF_MULTIPLIER, FILE_RTO_MULTIPLIER, INITIAL_RTO, MAX_RTO, MIN_RTO};

/// Adaptive retransmission timeout.
#[derive(Debug, Clone)]
pub struct RtoEstimator {
    rto: Duration,
}

impl Default for RtoEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RtoEstimator {
    /// Start with the conservative initial timeout.
    pub fn new() -> Self {
        Self { rto: INITIAL_RTO }
    }

    /// Current retransmission timeout.
    pub fn rto(&self) -> Duration {
        self.rto
    }

    /// Double the timeout after an expiry, up to the ceiling.
    ///
    /// Repeated timeouts on the same packet back off exponentially so a dead
    /// link is probed at a decaying rate instead of flooding.
    pub fn backoff(&mut self) {
        self.rto = (self.rto * BACKOFF_MULTIPLIER).min(MAX_RTO);
    }

    /// Re-derive the timeout from a completed file's pace.
    ///
    /// Sets the timeout to [`FILE_RTO_MULTIPLIER`]× the mean per-packet time,
    /// clamped to `[MIN_RTO, MAX_RTO]`. This also resets any backoff
    /// accumulated during the file.
    ///
    /// [`FILE_RTO_MULTIPLIER`]: constants::FILE_RTO_MULTIPLIER
    pub fn on_file_complete(&mut self, elapsed: Duration, packets: u64) {
        if packets == 0 {
            return;
        }
        let per_packet = elapsed / packets as u32;
        self.rto = per_packet.mul_f64(FILE_RTO_MULTIPLIER).clamp(MIN_RTO, MAX_RTO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_initial() {
        assert_eq!(RtoEstimator::new().rto(), INITIAL_RTO);
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        let mut est = RtoEstimator::new();
        est.backoff();
        assert_eq!(est.rto(), INITIAL_RTO * 2);
        for _ in 0..20 {
            est.backoff();
        }
        assert_eq!(est.rto(), MAX_RTO);
    }

    #[test]
    fn test_file_pace_sets_rto() {
        let mut est = RtoEstimator::new();
        // 100 packets in 10s: 100ms each, times the margin.
        est.on_file_complete(Duration::from_secs(10), 100);
        assert_eq!(est.rto(), Duration::from_millis(150));
    }

    #[test]
    fn test_file_pace_clamps_to_floor() {
        let mut est = RtoEstimator::new();
        est.on_file_complete(Duration::from_micros(500), 1000);
        assert_eq!(est.rto(), MIN_RTO);
    }

    #[test]
    fn test_file_pace_resets_backoff() {
        let mut est = RtoEstimator::new();
        est.backoff();
        est.backoff();
        est.on_file_complete(Duration::from_secs(1), 5);
        assert_eq!(est.rto(), Duration::from_millis(300));
    }

    #[test]
    fn test_zero_packets_is_noop() {
        let mut est = RtoEstimator::new();
        est.on_file_complete(Duration::from_secs(1), 0);
        assert_eq!(est.rto(), INITIAL_RTO);
    }
}
