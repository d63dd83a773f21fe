//! Measurement records handed to the sink

use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;

/// Record kinds, named as they appear in the time-series store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    /// Per-driver world-space physics
    MotionData,
    /// Player car extended motion (suspension, wheels, local frame)
    MyMotionData,
    CarSetupData,
    CarTelemetryData,
    CarStatusData,
    LapData,
    MarshalZones,
    SessionData,
    EventData,
    ParticipantData,
}

impl Measurement {
    pub fn as_str(self) -> &'static str {
        match self {
            Measurement::MotionData => "MotionData",
            Measurement::MyMotionData => "MyMotionData",
            Measurement::CarSetupData => "CarSetupData",
            Measurement::CarTelemetryData => "CarTelemetryData",
            Measurement::CarStatusData => "CarStatusData",
            Measurement::LapData => "LapData",
            Measurement::MarshalZones => "MarshalZones",
            Measurement::SessionData => "SessionData",
            Measurement::EventData => "EventData",
            Measurement::ParticipantData => "ParticipantData",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag value; numbers are kept typed until the sink renders them
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Float(f64),
    Int(i64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(s) => f.write_str(s),
            TagValue::Float(v) => write!(f, "{}", v),
            TagValue::Int(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Text(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::Text(v)
    }
}

impl From<f32> for TagValue {
    fn from(v: f32) -> Self {
        TagValue::Float(f64::from(v))
    }
}

impl From<u8> for TagValue {
    fn from(v: u8) -> Self {
        TagValue::Int(i64::from(v))
    }
}

/// Scalar field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! int_field {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Int(i64::from(v))
            }
        })*
    };
}

int_field!(u8, i8, u16, i16, u32);

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(f64::from(v))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// Suffixes for per-wheel arrays, indices 0..3
pub const WHEEL_SUFFIXES: [&str; 4] = ["RL", "RR", "FL", "FR"];

/// Ordered set of named scalar fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(String, FieldValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Set a field, replacing an earlier value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Expand a per-wheel array into `<name>_RL`, `<name>_RR`, `<name>_FL`, `<name>_FR`
    pub fn insert_wheels<T>(&mut self, name: &str, values: [T; 4]) -> &mut Self
    where
        T: Into<FieldValue>,
    {
        for (suffix, value) in WHEEL_SUFFIXES.iter().zip(values) {
            self.insert(format!("{}_{}", name, suffix), value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Ordered set of tags identifying a record's series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    entries: Vec<(&'static str, TagValue)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<TagValue>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TagValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }
}

/// One timestamped, tagged measurement; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub measurement: Measurement,
    pub tags: TagSet,
    /// UTC, whole seconds
    pub timestamp: DateTime<Utc>,
    pub fields: FieldSet,
}

impl MeasurementRecord {
    /// Build a record; the timestamp is truncated to second precision
    pub fn new(measurement: Measurement, tags: TagSet, timestamp: DateTime<Utc>, fields: FieldSet) -> Self {
        Self { measurement, tags, timestamp: timestamp.trunc_subsecs(0), fields }
    }

    /// Driver tag, when the record is per driver
    pub fn driver(&self) -> Option<&str> {
        match self.tags.get("driver") {
            Some(TagValue::Text(name)) => Some(name),
            _ => None,
        }
    }
}
