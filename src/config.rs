//! Capture configuration
//!
//! Defaults match a local single-machine setup: listen on every interface on
//! port 20777, flush once per second, write to InfluxDB on localhost.
//!
//! An optional YAML file can override any subset of values:
//!
//! ```yaml
//! port: 20777
//! interval_secs: 0.5
//! sink:
//!   url: http://influx.local:8086
//!   database: F1_2019
//!   retry:
//!     max_attempts: 5
//! ```
//!
//! Command line flags are applied on top of the file.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{CaptureError, Result};

pub const DEFAULT_PORT: u16 = 20777;
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;

/// Top-level capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// UDP port the game sends to
    pub port: u16,
    /// Address to bind; unspecified accepts from any interface
    pub bind_address: IpAddr,
    /// Flush cadence in seconds, aligned to wall-clock multiples
    pub interval_secs: f64,
    pub sink: SinkConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            interval_secs: DEFAULT_INTERVAL_SECS,
            sink: SinkConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Load from a YAML file; missing keys keep their defaults
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CaptureError::ConfigFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let config = Self::from_yaml_str(&text).map_err(|e| match e {
            CaptureError::Config { reason } => CaptureError::ConfigFile {
                path: path.to_path_buf(),
                source: reason.into(),
            },
            other => other,
        })?;
        debug!(path = %path.display(), "Loaded capture configuration");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml_ng::from_str(text)
            .map_err(|e| CaptureError::config(format!("YAML parsing failed: {}", e)))
    }

    /// Check values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.interval_secs.is_finite() || self.interval_secs <= 0.0 {
            return Err(CaptureError::config(format!(
                "flush interval must be a positive number of seconds, got {}",
                self.interval_secs
            )));
        }
        if Duration::try_from_secs_f64(self.interval_secs).is_err() {
            return Err(CaptureError::config(format!(
                "flush interval of {} seconds is too large",
                self.interval_secs
            )));
        }
        if self.sink.retry.max_attempts == 0 {
            return Err(CaptureError::config("sink retry max_attempts must be at least 1"));
        }
        if self.sink.url.trim().is_empty() {
            return Err(CaptureError::config("sink url must not be empty"));
        }
        Ok(())
    }

    /// Flush interval; call [`validate`](Self::validate) first, out of range values panic
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Time-series store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Base URL of the InfluxDB HTTP API
    pub url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8086".to_string(),
            database: "F1_2019".to_string(),
            username: Some("admin".to_string()),
            password: Some("admin".to_string()),
            retry: RetryPolicy::default(),
        }
    }
}

/// Bounded exponential backoff for sink writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each time
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_backoff_ms: 50 }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(1 << (retry.saturating_sub(1)).min(10)))
    }
}
