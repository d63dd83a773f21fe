//! InfluxDB 1.x HTTP sink

use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, trace};

use super::{Sink, line_protocol};
use crate::config::SinkConfig;
use crate::types::MeasurementRecord;
use crate::{CaptureError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Writes batches to `/write` with second precision
pub struct InfluxSink {
    client: Client,
    write_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxSink {
    pub fn new(config: &SinkConfig) -> Result<Self> {
        let write_url = write_url(&config.url, &config.database)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CaptureError::config(format!("cannot build HTTP client: {}", e)))?;

        debug!(url = %write_url, "InfluxDB sink configured");
        Ok(Self {
            client,
            write_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

fn write_url(base: &str, database: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| CaptureError::config(format!("invalid sink url '{}': {}", base, e)))?;
    if url.cannot_be_a_base() {
        return Err(CaptureError::config(format!("sink url '{}' cannot be used as a base", base)));
    }
    {
        let path = format!("{}/write", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    url.query_pairs_mut().clear().append_pair("db", database).append_pair("precision", "s");
    Ok(url)
}

#[async_trait::async_trait]
impl Sink for InfluxSink {
    async fn write_batch(&self, records: &[MeasurementRecord]) -> Result<()> {
        let body = line_protocol::encode_batch(records);
        if body.is_empty() {
            return Ok(());
        }
        trace!(bytes = body.len(), records = records.len(), "Posting line protocol batch");

        let mut request = self.client.post(self.write_url.clone()).body(body);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request.send().await.map_err(|e| {
            CaptureError::sink_failed_with_source(self.name(), "request failed", true, Box::new(e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        let reason = format!("HTTP {}: {}", status, detail.trim());
        if is_retryable_status(status) {
            Err(CaptureError::sink_failed(self.name(), reason))
        } else {
            Err(CaptureError::sink_rejected(self.name(), reason))
        }
    }

    fn name(&self) -> &str {
        "influxdb"
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT
}
