//! DRIFT: reliable, ordered file transfer over UDP datagrams.
//!
//! The crate layers a sliding-window ARQ protocol on top of plain UDP so a
//! batch of files can cross a lossy, reordering network and arrive intact
//! and in order. Sessions are negotiated with a three-way handshake, data
//! packets are retired by cumulative acknowledgments, losses are repaired by
//! adaptive timeouts and fast retransmit, and both peers hash what they have
//! afterwards so the results can be compared out of band.
//!
//! # Layers
//!
//! - [`core`]: sequence numbers, protocol constants, error types
//! - [`transport`]: wire codec, UDP socket wrapper, retransmission timing
//! - [`session`]: handshake and negotiated parameters
//! - [`sender`] / [`receiver`]: the two per-role transfer engines
//! - [`batch`]: multi-file controllers, digests, and reports
//!
//! # Example
//!
//! ```no_run
//! use drift_protocol::batch::{BatchReceiver, BatchSender};
//! use drift_protocol::session::SessionConfig;
//! use drift_protocol::transport::DriftSocket;
//!
//! # async fn run() -> Result<(), drift_protocol::DriftError> {
//! // Sending peer: wait for a receiver, then stream the batch.
//! let socket = DriftSocket::bind("0.0.0.0:4433".parse().unwrap()).await?;
//! let report = BatchSender::new(SessionConfig::default())
//!     .run(socket, &["a.bin".into(), "b.bin".into()])
//!     .await?;
//! println!("sent {} bytes", report.total_bytes());
//!
//! // Receiving peer (elsewhere): initiate and collect the files.
//! let socket = DriftSocket::bind("0.0.0.0:0".parse().unwrap()).await?;
//! let report = BatchReceiver::new("incoming")
//!     .run(socket, "198.51.100.7:4433".parse().unwrap())
//!     .await?;
//! println!("received {} files", report.file_count());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod core;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod transport;

pub use crate::batch::{BatchReceiver, BatchReport, BatchSender};
pub use crate::core::{DriftError, Seq};
pub use crate::session::{SessionConfig, SessionParams};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::batch::{BatchReceiver, BatchReport, BatchSender, FileDigest, FileReport};
    pub use crate::core::{CodecError, DriftError, HandshakeError, Seq, TransferError};
    pub use crate::receiver::{FileOutcome, FileReceiver};
    pub use crate::sender::{FileSendReport, FileSender};
    pub use crate::session::{SessionConfig, SessionParams};
    pub use crate::transport::{ControlFlag, DriftSocket, Packet};
}
