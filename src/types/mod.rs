//! Core types flowing through the capture pipeline.
//!
//! - [`RawDatagram`] is what the listener hands to the flush loop: arrival time plus bytes.
//! - [`MeasurementRecord`] is what the session tracker produces and the sink persists.
//!
//! Records are built from explicit per-packet-type schemas, so a [`FieldSet`] can only
//! ever hold scalar values. Array-valued packet fields are expanded into one field per
//! element before they reach a record.

mod datagram;
mod record;

pub use datagram::RawDatagram;
pub use record::{FieldSet, FieldValue, Measurement, MeasurementRecord, TagSet, TagValue};
