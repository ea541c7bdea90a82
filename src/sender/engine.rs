//! Sender transfer engine.
//!
//! [`FileSender`] streams files through the sliding window while a spawned
//! acknowledgment loop retires packets, fires retransmissions, and applies
//! backpressure. The two halves share the window behind a mutex; the ack
//! loop signals the file pump through [`Notify`] handles whenever space opens
//! up or the window fully drains.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

use crate::core::TransferError;
use crate::sender::window::{AckOutcome, SendWindow};
use crate::session::SessionParams;
use crate::transport::{ControlFlag, DriftSocket, Packet};

/// Outcome of sending one file.
#[derive(Debug, Clone, Copy)]
pub struct FileSendReport {
    /// File bytes transmitted (excluding headers and retransmissions).
    pub bytes: u64,
    /// Distinct data packets the file was split into.
    pub packets: u64,
    /// Wall time from first read to last first-transmission.
    pub elapsed: Duration,
}

/// First error from the ack loop, held for the next caller.
///
/// The error itself is handed out once; later callers get a generic
/// session-failed error so they still stop.
#[derive(Debug, Default)]
struct FailureSlot {
    error: Option<TransferError>,
    failed: bool,
}

impl FailureSlot {
    fn set(&mut self, err: TransferError) {
        if !self.failed {
            self.failed = true;
            self.error = Some(err);
        }
    }

    fn check(&mut self) -> Result<(), TransferError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if self.failed {
            return Err(TransferError::SessionFailed);
        }
        Ok(())
    }
}

/// Streams a batch of files to the remote receiver over one session.
///
/// The window persists across files, so acknowledgments for the tail of one
/// file and the head of the next can interleave freely.
#[derive(Debug)]
pub struct FileSender {
    socket: DriftSocket,
    session: SessionParams,
    window: Arc<Mutex<SendWindow>>,
    space: Arc<Notify>,
    drained: Arc<Notify>,
    failure: Arc<Mutex<FailureSlot>>,
    ack_task: JoinHandle<()>,
}

impl FileSender {
    /// Start the engine over an established session.
    ///
    /// `socket` must already be connected to the peer. The acknowledgment
    /// loop starts immediately and runs until the engine is dropped.
    pub fn new(socket: DriftSocket, session: SessionParams) -> Self {
        let window = Arc::new(Mutex::new(SendWindow::new(
            session.initial_seq,
            session.window_size,
        )));
        let space = Arc::new(Notify::new());
        let drained = Arc::new(Notify::new());
        let failure = Arc::new(Mutex::new(FailureSlot::default()));

        let ack_task = {
            let socket = socket.clone();
            let window = Arc::clone(&window);
            let space = Arc::clone(&space);
            let drained = Arc::clone(&drained);
            let failure = Arc::clone(&failure);
            tokio::spawn(async move {
                if let Err(err) = ack_loop(socket, &window, &space, &drained).await {
                    warn!("ack loop stopped: {err}");
                    failure.lock().await.set(err);
                    // Wake both waiters so they observe the failure.
                    space.notify_one();
                    drained.notify_one();
                }
            })
        };

        Self {
            socket,
            session,
            window,
            space,
            drained,
            failure,
            ack_task,
        }
    }

    /// Read `path` and stream it through the window.
    ///
    /// Returns once every packet of the file has been transmitted at least
    /// once; acknowledgment of the tail may still be outstanding. Set
    /// `last_in_batch` on the final file so its last packet carries the
    /// end-of-transmission marker instead of end-of-file.
    pub async fn send_file(
        &self,
        path: impl AsRef<Path>,
        last_in_batch: bool,
    ) -> Result<FileSendReport, TransferError> {
        let path = path.as_ref();
        let mut file = File::open(path).await?;
        let total = file.metadata().await?.len();
        let max_payload = self.session.max_payload() as u64;

        let started = Instant::now();
        let mut remaining = total;
        let mut packets = 0u64;

        // An empty file still yields one boundary packet.
        loop {
            let chunk_len = remaining.min(max_payload) as usize;
            let mut payload = vec![0u8; chunk_len];
            file.read_exact(&mut payload).await?;
            remaining -= chunk_len as u64;

            let flag = if remaining > 0 {
                ControlFlag::None
            } else if last_in_batch {
                ControlFlag::EndOfTransmission
            } else {
                ControlFlag::EndOfFile
            };

            loop {
                self.check_failure().await?;
                if !self.window.lock().await.is_full() {
                    break;
                }
                self.space.notified().await;
            }

            let frame = {
                let mut window = self.window.lock().await;
                let seq = window.next_seq();
                let frame = Packet::Data { seq, flag, payload }.encode();
                window.push(frame.clone());
                trace!("sending seq {seq} ({} bytes, {flag:?})", frame.len());
                frame
            };
            self.socket.send(&frame).await?;
            packets += 1;

            if remaining == 0 {
                break;
            }
        }

        let elapsed = started.elapsed();
        self.window
            .lock()
            .await
            .rto_mut()
            .on_file_complete(elapsed, packets);
        info!(
            "sent {} ({total} bytes in {packets} packets, {elapsed:?})",
            path.display()
        );

        Ok(FileSendReport {
            bytes: total,
            packets,
            elapsed,
        })
    }

    /// Wait until every transmitted packet has been acknowledged.
    pub async fn wait_until_drained(&self) -> Result<(), TransferError> {
        loop {
            self.check_failure().await?;
            if self.window.lock().await.is_empty() {
                return Ok(());
            }
            self.drained.notified().await;
        }
    }

    /// Wait for the window to drain, then stop the acknowledgment loop.
    pub async fn shutdown(self) -> Result<(), TransferError> {
        self.wait_until_drained().await
        // Drop aborts the ack task.
    }

    /// Negotiated session parameters.
    pub fn session(&self) -> &SessionParams {
        &self.session
    }

    async fn check_failure(&self) -> Result<(), TransferError> {
        self.failure.lock().await.check()
    }
}

impl Drop for FileSender {
    fn drop(&mut self) {
        self.ack_task.abort();
    }
}

/// Receive acknowledgments and drive retransmissions.
///
/// Sleeps until the oldest in-flight packet's timer would expire, or until a
/// datagram arrives, whichever comes first. Only socket failures escape;
/// everything the protocol can recover from is handled in place.
async fn ack_loop(
    mut socket: DriftSocket,
    window: &Mutex<SendWindow>,
    space: &Notify,
    drained: &Notify,
) -> Result<(), TransferError> {
    loop {
        let wait = {
            let window = window.lock().await;
            window.time_until_retransmit().unwrap_or(window.rto().rto())
        };

        match timeout(wait, socket.recv_packet()).await {
            // Timer expired before anything arrived.
            Err(_) => {
                let frame = {
                    let mut window = window.lock().await;
                    let frame = window.take_retransmit();
                    if frame.is_some() {
                        debug!(
                            "timeout, retransmitting seq {} (rto now {:?})",
                            window.base(),
                            window.rto().rto()
                        );
                    }
                    frame
                };
                if let Some(frame) = frame {
                    socket.send(&frame).await?;
                }
            }
            Ok(io_result) => match io_result? {
                Ok(Packet::Ack { seq }) => {
                    let retransmit = {
                        let mut window = window.lock().await;
                        match window.on_ack(seq) {
                            AckOutcome::Advanced { retired } => {
                                trace!("ack {seq}, retired {retired}");
                                space.notify_one();
                                if window.is_empty() {
                                    drained.notify_one();
                                }
                                None
                            }
                            AckOutcome::DuplicateAck { repeats } => {
                                trace!("duplicate ack {seq} (x{repeats})");
                                None
                            }
                            AckOutcome::FastRetransmit => {
                                debug!("fast retransmit of seq {seq}");
                                window.mark_fast_retransmit()
                            }
                            AckOutcome::Stale => {
                                trace!("stale ack {seq}");
                                None
                            }
                        }
                    };
                    if let Some(frame) = retransmit {
                        socket.send(&frame).await?;
                    }
                }
                Ok(other) => {
                    trace!("ignoring {} frame", other.kind());
                }
                Err(err) => {
                    debug!("discarding malformed datagram: {err}");
                }
            },
        }
    }
}
