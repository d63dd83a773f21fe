//! Error types for telemetry capture.
//!
//! Two layers of errors exist in the capture pipeline:
//!
//! - [`PacketError`] describes why a single datagram was rejected by the decoder.
//!   These are never fatal: the dispatcher logs them, counts them and moves on.
//! - [`CaptureError`] covers everything else: socket setup, configuration, sink
//!   writes and worker lifecycle failures.
//!
//! ## Recovery and Retry
//!
//! Errors report whether they are worth retrying:
//!
//! ```rust
//! use pitlane::CaptureError;
//!
//! let error = CaptureError::sink_failed("influxdb", "connection refused");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T, E = CaptureError> = std::result::Result<T, E>;

/// Reason a datagram was rejected before any record was produced from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PacketError {
    #[error("packet of {len} bytes is shorter than the {min} byte header")]
    TooShort { len: usize, min: usize },

    #[error("unrecognized packet (format, version, id) = ({format}, {version}, {id})")]
    Unrecognized { format: u16, version: u8, id: u8 },

    #[error(
        "unexpected size for (format, version, id) = ({format}, {version}, {id}): {len} bytes, expected {expected}"
    )]
    SizeMismatch { format: u16, version: u8, id: u8, len: usize, expected: usize },

    #[error("payload truncated reading {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },
}

/// Main error type for capture operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("I/O error during {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind UDP listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Sink '{sink}' rejected batch: {reason}")]
    Sink {
        sink: String,
        reason: String,
        retryable: bool,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error("Worker '{worker}' terminated abnormally")]
    Join {
        worker: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl CaptureError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CaptureError::Io { .. } => true,
            CaptureError::Bind { .. } => false,
            CaptureError::Config { .. } => false,
            CaptureError::ConfigFile { .. } => false,
            CaptureError::Sink { retryable, .. } => *retryable,
            CaptureError::Packet(_) => false,
            CaptureError::Join { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            CaptureError::Io { .. } => vec![
                "Check network interface state",
                "Verify the process still owns the socket",
            ],
            CaptureError::Bind { .. } => vec![
                "Choose another port with --port",
                "Check that no exclusive listener holds the port",
                "Verify permissions for ports below 1024",
            ],
            CaptureError::Config { .. } => vec![
                "Check command line flag values",
                "Use a positive flush interval",
            ],
            CaptureError::ConfigFile { .. } => vec![
                "Check the file exists and is readable",
                "Validate the YAML syntax",
                "Compare keys against the documented configuration",
            ],
            CaptureError::Sink { .. } => vec![
                "Ensure InfluxDB is running and reachable",
                "Verify database name and credentials",
                "Run with --dry-run to capture without a database",
            ],
            CaptureError::Packet(_) => vec![
                "Set the game UDP format to 2019",
                "Check the game version matches the supported packet layouts",
            ],
            CaptureError::Join { .. } => vec![
                "Inspect the log for a panic message",
                "Restart the capture",
            ],
        }
    }

    /// Helper constructor for I/O errors with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CaptureError::Io { context: context.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        CaptureError::Config { reason: reason.into() }
    }

    /// Helper constructor for retryable sink failures.
    pub fn sink_failed(sink: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::Sink { sink: sink.into(), reason: reason.into(), retryable: true, source: None }
    }

    /// Helper constructor for sink failures with source.
    pub fn sink_failed_with_source(
        sink: impl Into<String>,
        reason: impl Into<String>,
        retryable: bool,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CaptureError::Sink { sink: sink.into(), reason: reason.into(), retryable, source: Some(source) }
    }

    /// Helper constructor for sink failures that will not succeed on retry.
    pub fn sink_rejected(sink: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::Sink { sink: sink.into(), reason: reason.into(), retryable: false, source: None }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io { context: "<unknown>".to_string(), source: err }
    }
}
