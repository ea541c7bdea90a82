//! Batch transfer: controllers, integrity digests, and reports.

mod controller;
mod digest;
mod stats;

pub use controller::{BatchReceiver, BatchSender};
pub use digest::{file_digest, FileDigest};
pub use stats::{BatchReport, FileReport, VerifyOutcome};
