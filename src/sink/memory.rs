//! In-memory sink

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::Sink;
use crate::types::{Measurement, MeasurementRecord};
use crate::{CaptureError, Result};

/// Keeps every accepted batch in arrival order
///
/// Used by tests and by `--dry-run`. Failures can be injected to exercise the
/// flush loop's error path.
#[derive(Debug)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<MeasurementRecord>>>,
    retain: bool,
    fail_next: AtomicUsize,
    attempts: AtomicUsize,
    accepted_records: AtomicUsize,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self {
            batches: Mutex::default(),
            retain: true,
            fail_next: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            accepted_records: AtomicUsize::new(0),
        }
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count accepted records but drop them, for long dry runs
    pub fn discarding() -> Self {
        Self { retain: false, ..Self::default() }
    }

    /// Records accepted so far, retained or not
    pub fn accepted_records(&self) -> usize {
        self.accepted_records.load(Ordering::SeqCst)
    }

    /// Fail the next `count` writes with a retryable error
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Snapshot of accepted batches
    pub fn batches(&self) -> Vec<Vec<MeasurementRecord>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// All accepted records, flattened
    pub fn records(&self) -> Vec<MeasurementRecord> {
        self.batches().into_iter().flatten().collect()
    }

    /// Accepted records of one measurement
    pub fn records_of(&self, measurement: Measurement) -> Vec<MeasurementRecord> {
        self.records().into_iter().filter(|r| r.measurement == measurement).collect()
    }

    /// Write calls seen, including failed ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Sink for MemorySink {
    async fn write_batch(&self, records: &[MeasurementRecord]) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(CaptureError::sink_failed(self.name(), "injected failure"));
        }

        self.accepted_records.fetch_add(records.len(), Ordering::SeqCst);
        if self.retain {
            self.batches.lock().unwrap_or_else(PoisonError::into_inner).push(records.to_vec());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
