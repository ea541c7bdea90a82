//! Batch controllers: one handshake, many files, one report.
//!
//! [`BatchSender`] and [`BatchReceiver`] tie the session, engine, and
//! reporting layers together into the two peer roles. The receiver drives
//! the handshake; the sender drives termination by marking the last file
//! end-of-transmission.

use std::net::SocketAddr;
use std::path::PathBuf;

use log::info;
use tokio::fs::File;
use tokio::io::BufWriter;
use tokio::time::Instant;

use crate::batch::digest::file_digest;
use crate::batch::stats::{BatchReport, FileReport};
use crate::core::DriftError;
use crate::receiver::FileReceiver;
use crate::sender::FileSender;
use crate::session::{handshake, SessionConfig};
use crate::transport::DriftSocket;

/// Sends a batch of files to whichever receiver initiates a session.
#[derive(Debug, Clone, Default)]
pub struct BatchSender {
    config: SessionConfig,
}

impl BatchSender {
    /// Controller offering `config` during the handshake.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Wait for a receiver, then stream every file in `files` in order.
    ///
    /// The last file's final packet carries the end-of-transmission marker,
    /// so an empty batch is rejected up front: without it the session could
    /// never terminate.
    pub async fn run(
        &self,
        mut socket: DriftSocket,
        files: &[PathBuf],
    ) -> Result<BatchReport, DriftError> {
        if files.is_empty() {
            return Err(DriftError::EmptyBatch);
        }

        let params = handshake::accept(&mut socket, &self.config).await?;
        let sender = FileSender::new(socket, params);

        let started = Instant::now();
        let mut report = BatchReport::new();
        let total = files.len();

        for (index, path) in files.iter().enumerate() {
            let last_in_batch = index + 1 == total;
            let sent = sender.send_file(path, last_in_batch).await?;
            let digest = file_digest(path).await?;
            report.record(FileReport {
                path: path.clone(),
                bytes: sent.bytes,
                elapsed: sent.elapsed,
                digest,
            });
        }

        sender.shutdown().await?;
        report.set_total_elapsed(started.elapsed());
        info!(
            "batch sent: {} files, {} bytes in {:?}",
            report.file_count(),
            report.total_bytes(),
            report.total_elapsed()
        );
        Ok(report)
    }
}

/// Receives a batch of files from a sender into a directory.
#[derive(Debug, Clone)]
pub struct BatchReceiver {
    output_dir: PathBuf,
}

impl BatchReceiver {
    /// Controller writing received files under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Initiate a session with `peer` and receive files until the sender
    /// signals end-of-transmission.
    ///
    /// Files land as `received-0`, `received-1`, ... in transfer order; any
    /// mapping back to original names travels out of band.
    pub async fn run(
        &self,
        mut socket: DriftSocket,
        peer: SocketAddr,
    ) -> Result<BatchReport, DriftError> {
        let params = handshake::initiate(&mut socket, peer).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let mut receiver = FileReceiver::new(socket, params);

        let started = Instant::now();
        let mut report = BatchReport::new();
        let mut index = 0usize;

        loop {
            let path = self.output_dir.join(format!("received-{index}"));
            let mut sink = BufWriter::new(File::create(&path).await?);

            let file_started = Instant::now();
            let outcome = receiver.receive_file(&mut sink).await?;
            drop(sink);

            let digest = file_digest(&path).await?;
            report.record(FileReport {
                path,
                bytes: outcome.bytes,
                elapsed: file_started.elapsed(),
                digest,
            });
            index += 1;

            if outcome.end_of_session {
                break;
            }
        }

        report.set_total_elapsed(started.elapsed());
        info!(
            "batch received: {} files, {} bytes in {:?}",
            report.file_count(),
            report.total_bytes(),
            report.total_elapsed()
        );
        Ok(report)
    }
}
