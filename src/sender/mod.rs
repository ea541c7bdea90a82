//! Sending side: sliding window and transfer engine.

mod engine;
mod window;

pub use engine::{FileSendReport, FileSender};
pub use window::{AckOutcome, SendWindow};
