//! Record sinks
//!
//! A [`Sink`] persists ordered batches of [`MeasurementRecord`]s. The flush loop
//! calls [`Sink::write_batch`] once per non-empty packet-type batch and treats an
//! error as fatal to the current flush iteration only.
//!
//! Implementations:
//! - [`InfluxSink`]: InfluxDB 1.x HTTP write endpoint, line protocol
//! - [`MemorySink`]: keeps batches in memory, for tests and dry runs
//! - [`RetryingSink`]: wraps another sink with bounded exponential backoff

mod influx;
pub mod line_protocol;
mod memory;
mod retry;

pub use influx::InfluxSink;
pub use memory::MemorySink;
pub use retry::RetryingSink;

use crate::Result;
use crate::types::MeasurementRecord;

/// Destination for measurement records
#[async_trait::async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Persist `records` in order
    ///
    /// Returning `Ok` means the whole batch was accepted; there is no partial success.
    async fn write_batch(&self, records: &[MeasurementRecord]) -> Result<()>;

    /// Short name for logs and errors
    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl<S: Sink + ?Sized> Sink for std::sync::Arc<S> {
    async fn write_batch(&self, records: &[MeasurementRecord]) -> Result<()> {
        (**self).write_batch(records).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait::async_trait]
impl<S: Sink + ?Sized> Sink for Box<S> {
    async fn write_batch(&self, records: &[MeasurementRecord]) -> Result<()> {
        (**self).write_batch(records).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
