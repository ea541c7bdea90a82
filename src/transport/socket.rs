//! Async UDP socket wrapper speaking [`Packet`] frames.
//!
//! A thin layer over [`tokio::net::UdpSocket`]: every send encodes a packet,
//! every receive decodes one. Decode failures are returned separately from
//! i/o failures so callers can discard malformed datagrams and keep reading.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::core::CodecError;
use crate::transport::packet::Packet;

/// Largest datagram a UDP socket can hand us.
const RECV_BUFFER_SIZE: usize = 65_535;

/// A UDP socket that sends and receives protocol frames.
///
/// The underlying socket is shared; cloning produces a second handle with its
/// own receive buffer, so one clone can sit in a background task while the
/// other keeps sending.
#[derive(Debug)]
pub struct DriftSocket {
    socket: Arc<UdpSocket>,
    recv_buffer: Vec<u8>,
}

impl Clone for DriftSocket {
    fn clone(&self) -> Self {
        Self {
            socket: Arc::clone(&self.socket),
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        }
    }
}

impl DriftSocket {
    /// Bind a new socket to the given local address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    /// Wrap an already-bound socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        }
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Fix the remote peer; subsequent [`send`](Self::send) calls go there
    /// and datagrams from other sources are filtered by the OS.
    pub async fn connect(&self, peer: SocketAddr) -> io::Result<()> {
        self.socket.connect(peer).await
    }

    /// Send raw bytes to the connected peer.
    pub async fn send(&self, data: &[u8]) -> io::Result<()> {
        self.socket.send(data).await?;
        Ok(())
    }

    /// Send raw bytes to an explicit destination.
    pub async fn send_to(&self, data: &[u8], peer: SocketAddr) -> io::Result<()> {
        self.socket.send_to(data, peer).await?;
        Ok(())
    }

    /// Encode and send a packet to the connected peer.
    pub async fn send_packet(&self, packet: &Packet) -> io::Result<()> {
        self.send(&packet.encode()).await
    }

    /// Encode and send a packet to an explicit destination.
    pub async fn send_packet_to(&self, packet: &Packet, peer: SocketAddr) -> io::Result<()> {
        self.send_to(&packet.encode(), peer).await
    }

    /// Receive one datagram from the connected peer and decode it.
    ///
    /// The outer `Result` is socket i/o; the inner one is the codec, so a
    /// malformed datagram can be logged and skipped without tearing the
    /// session down.
    pub async fn recv_packet(&mut self) -> io::Result<Result<Packet, CodecError>> {
        let len = self.socket.recv(&mut self.recv_buffer).await?;
        Ok(Packet::decode(&self.recv_buffer[..len]))
    }

    /// Receive one datagram from any source, returning its origin address.
    pub async fn recv_packet_from(
        &mut self,
    ) -> io::Result<(Result<Packet, CodecError>, SocketAddr)> {
        let (len, addr) = self.socket.recv_from(&mut self.recv_buffer).await?;
        Ok((Packet::decode(&self.recv_buffer[..len]), addr))
    }
}
