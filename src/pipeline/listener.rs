//! UDP listener task

use chrono::Utc;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::HandoffQueue;
use crate::packet::MAX_DATAGRAM_SIZE;
use crate::types::RawDatagram;
use crate::{CaptureError, Result};

/// Bind a UDP socket with address reuse so several local listeners can coexist
///
/// Must be called inside a tokio runtime.
pub fn bind(addr: SocketAddr) -> Result<UdpSocket> {
    let bind_err = |source| CaptureError::Bind { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;

    UdpSocket::from_std(socket.into()).map_err(bind_err)
}

/// Reads datagrams until cancelled, timestamping each and queueing it
pub struct Listener {
    socket: UdpSocket,
    queue: Arc<HandoffQueue>,
}

impl Listener {
    pub fn new(socket: UdpSocket, queue: Arc<HandoffQueue>) -> Self {
        Self { socket, queue }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(|e| CaptureError::io("reading listener address", e))
    }

    /// Run until `cancel` fires; returns the number of datagrams queued
    ///
    /// Read errors are logged and the loop keeps going. Datagrams still waiting
    /// in the socket buffer at cancellation are not read.
    pub async fn run(self, cancel: CancellationToken) -> u64 {
        let addr = self.socket.local_addr().ok();
        info!(addr = ?addr, "Listener started");

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let mut received = 0u64;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Listener cancelled");
                    break;
                }
                result = self.socket.recv_from(&mut buf) => result,
            };

            match result {
                Ok((len, from)) => {
                    let datagram = RawDatagram::new(Utc::now(), &buf[..len]);
                    trace!(len, %from, "Datagram received");
                    self.queue.push(datagram);
                    received += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Datagram read failed");
                }
            }
        }

        info!(received, "Listener stopped");
        received
    }
}
