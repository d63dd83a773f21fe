//! Capture F1 2019 UDP telemetry into a time-series store.
//!
//! Pitlane listens for the game's UDP telemetry, batches datagrams on
//! wall-clock aligned ticks, turns each packet into tagged measurement records
//! and writes them to InfluxDB.
//!
//! # Architecture
//!
//! - **Listener**: reads datagrams as fast as they arrive and queues them with
//!   their arrival time. Never waits on the database.
//! - **Flush loop**: on every tick swaps the queue out, decodes each datagram,
//!   runs it through the [`SessionTracker`] and writes one batch per packet type.
//! - **Session tracker**: knows the driver roster and the current session, and
//!   holds back records until both are known.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pitlane::{CaptureConfig, Pitlane};
//!
//! #[tokio::main]
//! async fn main() -> pitlane::Result<()> {
//!     let capture = Pitlane::start(&CaptureConfig::default())?;
//!     tokio::signal::ctrl_c().await.ok();
//!     let stats = capture.shutdown().await?;
//!     println!("captured {} packets", stats.packets);
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding and record construction
pub mod packet;
pub mod session;

// Capture pipeline
pub mod pipeline;
pub mod sink;
pub mod stream;

// Core exports
pub use config::{CaptureConfig, RetryPolicy, SinkConfig};
pub use error::*;
pub use types::*;

// Main API exports
pub use packet::{Packet, PacketHeader, PacketId};
pub use pipeline::{Capture, FlushStats};
pub use session::{DriverRoster, SessionIdentity, SessionTracker};
pub use sink::{InfluxSink, MemorySink, RetryingSink, Sink};

use std::sync::Arc;

/// Entry point for starting a capture.
///
/// # Examples
///
/// ## InfluxDB
/// ```rust,no_run
/// use pitlane::{CaptureConfig, Pitlane};
///
/// # #[tokio::main]
/// # async fn main() -> pitlane::Result<()> {
/// let capture = Pitlane::start(&CaptureConfig::default())?;
/// // ...
/// capture.shutdown().await?;
/// # Ok(())
/// # }
/// ```
///
/// ## Custom sink
/// ```rust,no_run
/// use pitlane::{CaptureConfig, MemorySink, Pitlane};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> pitlane::Result<()> {
/// let sink = Arc::new(MemorySink::new());
/// let capture = Pitlane::start_with_sink(&CaptureConfig::default(), sink.clone())?;
/// capture.shutdown().await?;
/// println!("{} batches", sink.batches().len());
/// # Ok(())
/// # }
/// ```
pub struct Pitlane;

impl Pitlane {
    /// Start capturing into the InfluxDB described by `config.sink`.
    ///
    /// Writes are retried according to `config.sink.retry`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The sink URL cannot be parsed
    /// - The UDP port cannot be bound
    pub fn start(config: &CaptureConfig) -> Result<Capture> {
        let influx = InfluxSink::new(&config.sink)?;
        let sink = RetryingSink::new(influx, config.sink.retry);
        Self::start_with_sink(config, Arc::new(sink))
    }

    /// Start capturing into any [`Sink`].
    pub fn start_with_sink(config: &CaptureConfig, sink: Arc<dyn Sink>) -> Result<Capture> {
        Capture::start(config, sink)
    }
}
