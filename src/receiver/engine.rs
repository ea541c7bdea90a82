//! Receiver transfer engine.
//!
//! [`FileReceiver`] pulls data packets off the socket, runs them through the
//! reassembly buffer, writes released segments to the caller's sink, and
//! answers every packet with the current cumulative acknowledgment. When the
//! socket goes quiet it re-sends that acknowledgment to nudge the sender.

use std::io;
use std::time::Duration;

use log::{debug, info, trace};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::core::constants::RECEIVER_STALL_TIMEOUT;
use crate::core::{Seq, TransferError};
use crate::receiver::reassembly::{Reassembly, ReceiveOutcome, Segment};
use crate::session::SessionParams;
use crate::transport::{ControlFlag, DriftSocket, Packet};

/// Outcome of receiving one file.
#[derive(Debug, Clone, Copy)]
pub struct FileOutcome {
    /// File bytes written to the sink.
    pub bytes: u64,
    /// Whether the file closed the whole session (end-of-transmission).
    pub end_of_session: bool,
}

/// Receives a batch of files over one session, one call per file.
///
/// The reassembly buffer persists across calls: when a drain stops at a
/// file boundary with the next file's head already buffered, the next call
/// picks those segments up before touching the socket.
#[derive(Debug)]
pub struct FileReceiver {
    socket: DriftSocket,
    reassembly: Reassembly,
    stall_timeout: Duration,
}

impl FileReceiver {
    /// Start the engine over an established session.
    ///
    /// `socket` must already be connected to the peer.
    pub fn new(socket: DriftSocket, session: SessionParams) -> Self {
        Self {
            socket,
            reassembly: Reassembly::new(session.initial_seq, session.window_size),
            stall_timeout: RECEIVER_STALL_TIMEOUT,
        }
    }

    /// Receive one complete file into `sink`.
    ///
    /// Returns when a packet marked end-of-file or end-of-transmission has
    /// been written out in order; the outcome says which. The sink is
    /// flushed before returning.
    pub async fn receive_file<W>(&mut self, sink: &mut W) -> Result<FileOutcome, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut bytes = 0u64;

        // Segments past the previous file's boundary may already be here.
        if let Some((segments, ack)) = self.reassembly.take_ready() {
            let (written, boundary) = write_segments(sink, segments).await?;
            bytes += written;
            self.send_ack(ack).await?;
            if let Some(flag) = boundary {
                return finish(sink, bytes, flag).await;
            }
        }

        loop {
            match timeout(self.stall_timeout, self.socket.recv_packet()).await {
                // Quiet link: re-request the expected packet.
                Err(_) => {
                    let ack = self.reassembly.expected();
                    debug!("stalled, re-sending ack {ack}");
                    self.send_ack(ack).await?;
                }
                Ok(io_result) => match io_result? {
                    Ok(Packet::Data { seq, flag, payload }) => {
                        match self.reassembly.on_data(seq, flag, payload) {
                            ReceiveOutcome::Delivered { segments, ack } => {
                                let (written, boundary) = write_segments(sink, segments).await?;
                                bytes += written;
                                self.send_ack(ack).await?;
                                if let Some(flag) = boundary {
                                    return finish(sink, bytes, flag).await;
                                }
                            }
                            outcome => {
                                trace!("seq {seq}: {outcome:?}");
                                self.send_ack(outcome.ack()).await?;
                            }
                        }
                    }
                    // Our handshake confirmation was lost; answer again.
                    Ok(Packet::Params { .. }) => {
                        debug!("parameter frame during data phase, re-confirming");
                        self.socket.send_packet(&Packet::Confirm).await?;
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

    async fn send_ack(&self, seq: Seq) -> io::Result<()> {
        self.socket.send_packet(&Packet::Ack { seq }).await
    }
}

async fn write_segments<W>(
    sink: &mut W,
    segments: Vec<Segment>,
) -> io::Result<(u64, Option<ControlFlag>)>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = 0u64;
    let mut boundary = None;
    for segment in segments {
        sink.write_all(&segment.payload).await?;
        bytes += segment.payload.len() as u64;
        if segment.flag.is_boundary() {
            boundary = Some(segment.flag);
        }
    }
    Ok((bytes, boundary))
}

async fn finish<W>(
    sink: &mut W,
    bytes: u64,
    flag: ControlFlag,
) -> Result<FileOutcome, TransferError>
where
    W: AsyncWrite + Unpin,
{
    sink.flush().await?;
    let end_of_session = flag == ControlFlag::EndOfTransmission;
    info!(
        "file complete: {bytes} bytes{}",
        if end_of_session { ", session closed" } else { "" }
    );
    Ok(FileOutcome {
        bytes,
        end_of_session,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Seq;

    async fn connected_pair() -> (DriftSocket, DriftSocket) {
        let a = DriftSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let b = DriftSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        a.connect(b.local_addr().unwrap()).await.unwrap();
        b.connect(a.local_addr().unwrap()).await.unwrap();
        (a, b)
    }

    fn receiver_for(socket: DriftSocket, initial: u32, window: usize) -> FileReceiver {
        let session = SessionParams {
            peer: "127.0.0.1:1".parse().unwrap(),
            initial_seq: Seq::new(initial),
            datagram_size: 1024,
            window_size: window,
        };
        FileReceiver::new(socket, session)
    }

    async fn send_data(socket: &DriftSocket, seq: u32, flag: ControlFlag, payload: &[u8]) {
        socket
            .send_packet(&Packet::Data {
                seq: Seq::new(seq),
                flag,
                payload: payload.to_vec(),
            })
            .await
            .unwrap();
    }

    async fn expect_ack(socket: &mut DriftSocket, seq: u32) {
        match socket.recv_packet().await.unwrap().unwrap() {
            Packet::Ack { seq: got } => assert_eq!(got, Seq::new(seq)),
            other => panic!("unexpected frame: {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_reordered_packets_written_in_order() {
        let (socket, mut peer) = connected_pair().await;
        let mut receiver = receiver_for(socket, 10, 4);

        // Deliver 11, then 10, then the boundary at 12.
        send_data(&peer, 11, ControlFlag::None, b"world").await;
        send_data(&peer, 10, ControlFlag::None, b"hello ").await;
        send_data(&peer, 12, ControlFlag::EndOfFile, b"!").await;

        let mut sink = Vec::new();
        let outcome = receiver.receive_file(&mut sink).await.unwrap();

        assert_eq!(sink, b"hello world!");
        assert_eq!(outcome.bytes, 12);
        assert!(!outcome.end_of_session);

        // Buffered 11 re-acked 10, then cumulative acks 12 and 13.
        expect_ack(&mut peer, 10).await;
        expect_ack(&mut peer, 12).await;
        expect_ack(&mut peer, 13).await;
    }

    #[tokio::test]
    async fn test_duplicate_data_written_once() {
        let (socket, mut peer) = connected_pair().await;
        let mut receiver = receiver_for(socket, 20, 4);

        send_data(&peer, 20, ControlFlag::None, b"once").await;
        send_data(&peer, 20, ControlFlag::None, b"once").await;
        send_data(&peer, 21, ControlFlag::EndOfTransmission, b"").await;

        let mut sink = Vec::new();
        let outcome = receiver.receive_file(&mut sink).await.unwrap();

        assert_eq!(sink, b"once");
        assert!(outcome.end_of_session);

        expect_ack(&mut peer, 21).await;
        // The duplicate re-triggers the same cumulative ack.
        expect_ack(&mut peer, 21).await;
        expect_ack(&mut peer, 22).await;
    }

    #[tokio::test]
    async fn test_next_file_head_survives_boundary() {
        let (socket, mut peer) = connected_pair().await;
        let mut receiver = receiver_for(socket, 0, 4);

        // File 2's only packet arrives before file 1's boundary, so it is
        // sitting in the buffer when the first file completes.
        send_data(&peer, 1, ControlFlag::EndOfTransmission, b"second").await;
        send_data(&peer, 0, ControlFlag::EndOfFile, b"first").await;

        let mut sink1 = Vec::new();
        let outcome1 = receiver.receive_file(&mut sink1).await.unwrap();
        assert_eq!(sink1, b"first");
        assert!(!outcome1.end_of_session);

        // File 2 comes straight out of the buffer, no new packets needed.
        let mut sink2 = Vec::new();
        let outcome2 = receiver.receive_file(&mut sink2).await.unwrap();
        assert_eq!(sink2, b"second");
        assert!(outcome2.end_of_session);

        expect_ack(&mut peer, 0).await;
        expect_ack(&mut peer, 1).await;
        expect_ack(&mut peer, 2).await;
    }

    #[tokio::test]
    async fn test_stall_resends_current_ack() {
        let (socket, mut peer) = connected_pair().await;
        let mut receiver = receiver_for(socket, 5, 4);
        receiver.stall_timeout = Duration::from_millis(30);

        let receive_task = tokio::spawn(async move {
            let mut sink = Vec::new();
            let outcome = receiver.receive_file(&mut sink).await.unwrap();
            (sink, outcome)
        });

        // Nothing sent yet: the stall timer must re-ack the expected seq.
        expect_ack(&mut peer, 5).await;

        send_data(&peer, 5, ControlFlag::EndOfFile, b"late").await;
        let (sink, outcome) = receive_task.await.unwrap();
        assert_eq!(sink, b"late");
        assert_eq!(outcome.bytes, 4);
    }

    #[tokio::test]
    async fn test_params_during_data_phase_reconfirmed() {
        let (socket, mut peer) = connected_pair().await;
        let mut receiver = receiver_for(socket, 0, 4);

        peer.send_packet(&Packet::Params {
            payload_units: 1,
            window_size: 4,
        })
        .await
        .unwrap();
        send_data(&peer, 0, ControlFlag::EndOfTransmission, b"x").await;

        let mut sink = Vec::new();
        receiver.receive_file(&mut sink).await.unwrap();

        match peer.recv_packet().await.unwrap().unwrap() {
            Packet::Confirm => {}
            other => panic!("unexpected frame: {}", other.kind()),
        }
        expect_ack(&mut peer, 1).await;
    }

    #[tokio::test]
    async fn test_out_of_window_packet_dropped() {
        let (socket, mut peer) = connected_pair().await;
        let mut receiver = receiver_for(socket, 0, 2);

        // Window of 2: seq 3 is unbufferable and must vanish.
        send_data(&peer, 3, ControlFlag::None, b"far").await;
        send_data(&peer, 0, ControlFlag::EndOfTransmission, b"near").await;

        let mut sink = Vec::new();
        receiver.receive_file(&mut sink).await.unwrap();
        assert_eq!(sink, b"near");

        expect_ack(&mut peer, 0).await;
        expect_ack(&mut peer, 1).await;
    }
}
