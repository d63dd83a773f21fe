//! Two-stage capture pipeline
//!
//! ```text
//! UDP socket -> Listener -> HandoffQueue -> FlushLoop -> Dispatcher -> SessionTracker -> Sink
//! ```
//!
//! The [`Listener`] and [`FlushLoop`] run as separate tokio tasks. The
//! [`HandoffQueue`] is the only state they share. Each task has its own
//! cancellation token, so shutdown can stop the listener first and still let
//! the flush loop drain whatever the listener queued.

mod dispatch;
mod flush;
mod listener;
mod queue;
#[cfg(test)]
mod tests;

pub use dispatch::{Batches, Dispatcher, DropCounts};
pub use flush::{FlushLoop, FlushOutcome, FlushStats};
pub use listener::{Listener, bind};
pub use queue::HandoffQueue;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::CaptureConfig;
use crate::sink::Sink;
use crate::{CaptureError, Result};

/// A running capture: listener and flush loop tasks plus their shutdown tokens
pub struct Capture {
    local_addr: SocketAddr,
    queue: Arc<HandoffQueue>,
    listener: JoinHandle<u64>,
    listener_cancel: CancellationToken,
    flush: JoinHandle<FlushStats>,
    flush_cancel: CancellationToken,
}

impl Capture {
    /// Bind the socket and spawn both workers
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(config: &CaptureConfig, sink: Arc<dyn Sink>) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(HandoffQueue::new());
        let socket = bind(config.listen_addr())?;
        let listener = Listener::new(socket, Arc::clone(&queue));
        let local_addr = listener.local_addr()?;

        let flush = FlushLoop::new(Arc::clone(&queue), sink, config.interval());

        let listener_cancel = CancellationToken::new();
        let flush_cancel = CancellationToken::new();

        let flush = tokio::spawn(flush.run(flush_cancel.clone()));
        let listener = tokio::spawn(listener.run(listener_cancel.clone()));

        info!(%local_addr, interval_secs = config.interval_secs, "Capture started");
        Ok(Self { local_addr, queue, listener, listener_cancel, flush, flush_cancel })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Datagrams received but not yet flushed
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Stop the listener, then let the flush loop run its final flush
    ///
    /// Returns the flush totals once both tasks have exited. The flush loop is
    /// stopped and awaited even when the listener task failed; the listener
    /// error is reported first.
    pub async fn shutdown(self) -> Result<FlushStats> {
        info!("Shutting down capture");

        self.listener_cancel.cancel();
        let listener = self.listener.await;
        if let Err(e) = &listener {
            error!(error = %e, "Listener task failed, flushing what was queued");
        }

        self.flush_cancel.cancel();
        let flush = self.flush.await;

        let received = listener.map_err(|source| CaptureError::Join { worker: "listener", source })?;
        let stats = flush.map_err(|source| CaptureError::Join { worker: "flush", source })?;

        info!(received, packets = stats.packets, records = stats.records, "Capture stopped");
        Ok(stats)
    }

    /// Abort the listener task, for tests of the shutdown path
    #[cfg(test)]
    fn abort_listener(&self) {
        self.listener.abort();
    }
}
