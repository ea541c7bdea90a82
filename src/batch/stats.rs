//! Per-file and per-batch transfer reports.

use std::path::PathBuf;
use std::time::Duration;

use crate::batch::digest::FileDigest;

/// Record of one transferred file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path the file was read from or written to.
    pub path: PathBuf,
    /// File bytes moved.
    pub bytes: u64,
    /// Transfer time for this file.
    pub elapsed: Duration,
    /// Digest of the on-disk contents.
    pub digest: FileDigest,
}

/// Result of comparing two batch reports file by file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// File pairs compared (the shorter report bounds this).
    pub compared: usize,
    /// Pairs whose digests agree.
    pub matched: usize,
}

impl VerifyOutcome {
    /// Whether every compared pair matched.
    pub fn is_clean(&self) -> bool {
        self.matched == self.compared
    }
}

/// Summary of one batch transfer, built up one file at a time.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    files: Vec<FileReport>,
    total_elapsed: Duration,
}

impl BatchReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed file.
    pub fn record(&mut self, report: FileReport) {
        self.files.push(report);
    }

    /// Set the wall time for the whole batch, handshake included.
    pub fn set_total_elapsed(&mut self, elapsed: Duration) {
        self.total_elapsed = elapsed;
    }

    /// The per-file records, in transfer order.
    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    /// Number of files in the batch.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// File bytes moved across the whole batch.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    /// Wall time for the whole batch.
    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    /// Mean per-file transfer time, or `None` for an empty report.
    pub fn mean_file_time(&self) -> Option<Duration> {
        if self.files.is_empty() {
            return None;
        }
        let sum: Duration = self.files.iter().map(|f| f.elapsed).sum();
        Some(sum / self.files.len() as u32)
    }

    /// Compare this report's digests against the peer's, position by
    /// position.
    pub fn verify_against(&self, other: &BatchReport) -> VerifyOutcome {
        let compared = self.files.len().min(other.files.len());
        let matched = self
            .files
            .iter()
            .zip(other.files.iter())
            .filter(|(a, b)| a.digest == b.digest)
            .count();
        VerifyOutcome { compared, matched }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(byte: u8, bytes: u64, millis: u64) -> FileReport {
        FileReport {
            path: PathBuf::from(format!("file-{byte}")),
            bytes,
            elapsed: Duration::from_millis(millis),
            digest: FileDigest::of_bytes(&[byte]),
        }
    }

    #[test]
    fn test_totals_and_mean() {
        let mut batch = BatchReport::new();
        batch.record(report(1, 100, 10));
        batch.record(report(2, 300, 30));

        assert_eq!(batch.file_count(), 2);
        assert_eq!(batch.total_bytes(), 400);
        assert_eq!(batch.mean_file_time(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_empty_report_has_no_mean() {
        assert_eq!(BatchReport::new().mean_file_time(), None);
    }

    #[test]
    fn test_verify_matching_batches() {
        let mut a = BatchReport::new();
        let mut b = BatchReport::new();
        for byte in 0..3 {
            a.record(report(byte, 10, 1));
            b.record(report(byte, 10, 1));
        }
        let outcome = a.verify_against(&b);
        assert_eq!(
            outcome,
            VerifyOutcome {
                compared: 3,
                matched: 3
            }
        );
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_verify_flags_mismatch() {
        let mut a = BatchReport::new();
        let mut b = BatchReport::new();
        a.record(report(1, 10, 1));
        b.record(report(2, 10, 1));
        let outcome = a.verify_against(&b);
        assert_eq!(outcome.matched, 0);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_verify_bounds_by_shorter_report() {
        let mut a = BatchReport::new();
        let b = BatchReport::new();
        a.record(report(1, 10, 1));
        assert_eq!(a.verify_against(&b).compared, 0);
    }
}
