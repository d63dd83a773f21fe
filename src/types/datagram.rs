//! Timestamped datagrams for the listener to flush loop handoff

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One received UDP datagram with its arrival time
///
/// Created by the listener and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RawDatagram {
    /// Wall-clock arrival time
    pub received_at: DateTime<Utc>,

    /// Datagram payload exactly as read from the socket
    pub data: Arc<[u8]>,
}

impl RawDatagram {
    pub fn new(received_at: DateTime<Utc>, data: &[u8]) -> Self {
        Self { received_at, data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
