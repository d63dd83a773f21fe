//! InfluxDB line protocol encoding
//!
//! ```text
//! measurement,tag1=v1,tag2=v2 field1=1.5,field2=3i,field3="text" 1565000000
//! ```
//!
//! Timestamps are written in seconds; the writer must request `precision=s`.

use crate::types::{FieldValue, MeasurementRecord};
use std::fmt::Write;

/// Escape a measurement name (commas and spaces)
fn escape_measurement(out: &mut String, s: &str) {
    for ch in s.chars() {
        if matches!(ch, ',' | ' ') {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Escape a tag key, tag value or field key (commas, spaces, equals signs)
fn escape_key(out: &mut String, s: &str) {
    for ch in s.chars() {
        if matches!(ch, ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn write_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Float(v) if v.is_finite() => {
            let _ = write!(out, "{}", v);
        }
        // Influx rejects NaN/inf; store zero rather than failing the whole batch
        FieldValue::Float(_) => out.push('0'),
        FieldValue::Int(v) => {
            let _ = write!(out, "{}i", v);
        }
        FieldValue::Text(s) => {
            out.push('"');
            for ch in s.chars() {
                if matches!(ch, '"' | '\\') {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push('"');
        }
    }
}

/// Append one record as a line (without trailing newline)
///
/// Empty tag values are skipped since line protocol cannot express them.
/// Records without fields produce nothing.
pub fn encode_record(out: &mut String, record: &MeasurementRecord) {
    if record.fields.is_empty() {
        return;
    }

    escape_measurement(out, record.measurement.as_str());

    for (key, value) in record.tags.iter() {
        let value = value.to_string();
        if value.is_empty() {
            continue;
        }
        out.push(',');
        escape_key(out, key);
        out.push('=');
        escape_key(out, &value);
    }

    for (i, (key, value)) in record.fields.iter().enumerate() {
        out.push(if i == 0 { ' ' } else { ',' });
        escape_key(out, key);
        out.push('=');
        write_field_value(out, value);
    }

    let _ = write!(out, " {}", record.timestamp.timestamp());
}

/// Encode a batch, one line per record, newline separated
pub fn encode_batch(records: &[MeasurementRecord]) -> String {
    let mut out = String::with_capacity(records.len() * 256);
    for record in records {
        let start = out.len();
        encode_record(&mut out, record);
        if out.len() > start {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSet, Measurement, TagSet};
    use chrono::{TimeZone, Utc};

    fn record(tags: TagSet, fields: FieldSet) -> MeasurementRecord {
        let ts = Utc.timestamp_opt(1_565_000_000, 0).unwrap();
        MeasurementRecord::new(Measurement::CarTelemetryData, tags, ts, fields)
    }

    #[test]
    fn encodes_tags_fields_and_timestamp() {
        let mut tags = TagSet::new();
        tags.insert("sessionId", "20190804_1410_Spa_0").insert("packetId", 6u8).insert("driver", "Max V");
        let mut fields = FieldSet::new();
        fields.insert("speed", 312u16).insert("throttle", 0.5f32).insert("name", "say \"hi\"");

        let mut out = String::new();
        encode_record(&mut out, &record(tags, fields));
        assert_eq!(
            out,
            "CarTelemetryData,sessionId=20190804_1410_Spa_0,packetId=6,driver=Max\\ V \
             speed=312i,throttle=0.5,name=\"say \\\"hi\\\"\" 1565000000"
        );
    }

    #[test]
    fn escapes_keys_and_skips_empty_tags() {
        let mut tags = TagSet::new();
        tags.insert("driver", "").insert("MarshalZoneId", "a=b,c");
        let mut fields = FieldSet::new();
        fields.insert("x", f32::NAN);

        let mut out = String::new();
        encode_record(&mut out, &record(tags, fields));
        assert_eq!(out, "CarTelemetryData,MarshalZoneId=a\\=b\\,c x=0 1565000000");
    }

    #[test]
    fn batch_skips_fieldless_records() {
        let mut fields = FieldSet::new();
        fields.insert("gear", 3i8);
        let records = vec![record(TagSet::new(), FieldSet::new()), record(TagSet::new(), fields)];
        assert_eq!(encode_batch(&records), "CarTelemetryData gear=3i 1565000000\n");
    }
}
