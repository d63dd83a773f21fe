//! Aligned flush loop

use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::dispatch::{DropCounts, Dispatcher};
use super::HandoffQueue;
use crate::session::SessionTracker;
use crate::sink::Sink;
use crate::stream::AlignedTicks;

/// Totals accumulated over the life of a flush loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Iterations that drained at least one datagram
    pub flushes: u64,
    /// Iterations that found the queue empty
    pub idle_ticks: u64,
    /// Datagrams decoded successfully
    pub packets: u64,
    /// Records produced, whether or not the sink accepted them
    pub records: u64,
    pub rejected: DropCounts,
    /// Iterations cut short by a sink error
    pub failed_writes: u64,
}

/// What one flush iteration did
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    /// Queue was empty; time since the last datagram of the last non-empty drain
    Idle { inactive_for: Duration },
    /// Every non-empty batch was written
    Flushed { packets: u64, records: usize, batches: usize },
    /// The sink failed; later batches of this iteration were not attempted
    SinkFailed { packets: u64, records: usize },
}

/// Drains the handoff queue on every aligned tick and feeds the sink
pub struct FlushLoop {
    queue: Arc<HandoffQueue>,
    sink: Arc<dyn Sink>,
    interval: Duration,
    dispatcher: Dispatcher,
    stats: FlushStats,
    started_at: DateTime<Utc>,
    last_arrival: Option<DateTime<Utc>>,
}

impl FlushLoop {
    pub fn new(queue: Arc<HandoffQueue>, sink: Arc<dyn Sink>, interval: Duration) -> Self {
        Self {
            queue,
            sink,
            interval,
            dispatcher: Dispatcher::new(),
            stats: FlushStats::default(),
            started_at: Utc::now(),
            last_arrival: None,
        }
    }

    pub fn stats(&self) -> &FlushStats {
        &self.stats
    }

    pub fn tracker(&self) -> &SessionTracker {
        self.dispatcher.tracker()
    }

    /// Run until `cancel` fires, then flush once more and return the totals
    ///
    /// A flush already in progress always completes; cancellation is only
    /// observed while waiting for the next tick.
    pub async fn run(mut self, cancel: CancellationToken) -> FlushStats {
        info!(interval_ms = self.interval.as_millis() as u64, sink = self.sink.name(), "Flush loop started");
        let mut ticks = std::pin::pin!(AlignedTicks::new(self.interval));

        loop {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = ticks.next() => false,
            };

            self.flush_once().await;

            if cancelled {
                debug!("Flush loop cancelled after final flush");
                break;
            }
        }

        info!(
            flushes = self.stats.flushes,
            idle_ticks = self.stats.idle_ticks,
            packets = self.stats.packets,
            records = self.stats.records,
            rejected = self.stats.rejected.total(),
            failed_writes = self.stats.failed_writes,
            "Flush loop stopped"
        );
        self.stats
    }

    /// One wake: drain, decode, dispatch, submit
    pub async fn flush_once(&mut self) -> FlushOutcome {
        let datagrams = self.queue.drain_and_swap();

        let Some(last) = datagrams.last() else {
            self.stats.idle_ticks += 1;
            let since = self.last_arrival.unwrap_or(self.started_at);
            let inactive_for = (Utc::now() - since).to_std().unwrap_or_default();
            debug!(inactive_ms = inactive_for.as_millis() as u64, "No datagrams since last flush");
            return FlushOutcome::Idle { inactive_for };
        };
        self.last_arrival = Some(last.received_at);

        let start = Instant::now();
        let batches = self.dispatcher.process(&datagrams);
        let records = batches.record_count();

        self.stats.flushes += 1;
        self.stats.packets += batches.packets;
        self.stats.records += records as u64;
        self.stats.rejected.add(&batches.dropped);

        let outcome = match batches.submit(self.sink.as_ref()).await {
            Ok(written) => FlushOutcome::Flushed { packets: batches.packets, records, batches: written },
            Err(e) => {
                self.stats.failed_writes += 1;
                error!(sink = self.sink.name(), error = %e, "Sink write failed, abandoning this flush");
                FlushOutcome::SinkFailed { packets: batches.packets, records }
            }
        };

        info!(
            datagrams = datagrams.len(),
            packets = batches.packets,
            records,
            rejected = batches.dropped.total(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Flushed"
        );
        outcome
    }
}
