//! Bounded retry around another sink

use tracing::warn;

use super::Sink;
use crate::Result;
use crate::config::RetryPolicy;
use crate::types::MeasurementRecord;

/// Retries retryable failures with exponential backoff
///
/// Non-retryable errors and the final failed attempt are returned unchanged.
pub struct RetryingSink<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: Sink> RetryingSink<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<S: Sink> Sink for RetryingSink<S> {
    async fn write_batch(&self, records: &[MeasurementRecord]) -> Result<()> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.write_batch(records).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = self.policy.backoff(attempt);
                    warn!(
                        sink = self.inner.name(),
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Sink write failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
