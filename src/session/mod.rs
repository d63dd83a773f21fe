//! Session and driver state tracking
//!
//! The [`SessionTracker`] turns decoded packets into measurement records. It owns
//! three pieces of state, all mutated only by the flush loop:
//!
//! - the [`DriverRoster`], replaced wholesale by every PARTICIPANTS packet
//! - the [`SessionIdentity`], recomputed when the raw session uid changes
//! - the readiness latch, set once both of the above are known
//!
//! Until the tracker is ready every packet yields no records. SESSION and
//! PARTICIPANTS packets still update their state while not ready so the latch
//! can close. Once ready, it stays ready for the life of the tracker, even
//! across session boundaries.

pub mod fields;

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, info};

use crate::packet::{
    Packet, PacketCarSetupData, PacketCarStatusData, PacketCarTelemetryData, PacketEventData,
    PacketHeader, PacketLapData, PacketMotionData, PacketParticipantsData, PacketSessionData,
    track_name,
};
use crate::types::{FieldSet, Measurement, MeasurementRecord, TagSet};

/// Human-readable key for one session: `<%Y%m%d_%H%M>_<track>_<formula>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    pub fn derive(captured_at: DateTime<Utc>, track_id: i8, formula: u8) -> Self {
        Self(format!("{}_{}_{}", captured_at.format("%Y%m%d_%H%M"), track_name(track_id), formula))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Driver names indexed by car slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverRoster {
    names: Vec<String>,
}

impl DriverRoster {
    /// Build from the active slots of a PARTICIPANTS packet
    pub fn from_participants(packet: &PacketParticipantsData) -> Self {
        Self { names: packet.active().iter().map(|p| p.name()).collect() }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    /// `(slot, name)` pairs in car-slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }
}

/// Converts packets into records while tracking roster and session identity
#[derive(Debug, Default)]
pub struct SessionTracker {
    roster: DriverRoster,
    identity: Option<SessionIdentity>,
    raw_session_uid: Option<u64>,
    ready: bool,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch readiness once a roster and a session identity both exist
    pub fn is_ready(&mut self) -> bool {
        if !self.ready {
            self.ready = !self.roster.is_empty() && self.identity.is_some();
            if self.ready {
                info!(
                    session = %self.identity.as_ref().map(SessionIdentity::as_str).unwrap_or_default(),
                    drivers = self.roster.len(),
                    "Session tracker ready, emitting records"
                );
            }
        }
        self.ready
    }

    pub fn roster(&self) -> &DriverRoster {
        &self.roster
    }

    pub fn session_identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    /// Convert one packet into zero or more records
    pub fn process(&mut self, packet: &Packet, received_at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        match packet {
            Packet::Motion(p) => self.process_motion(p, received_at),
            Packet::Session(p) => self.process_session(p, received_at),
            Packet::LapData(p) => self.process_lap_data(p, received_at),
            Packet::Event(p) => self.process_event(p, received_at),
            Packet::Participants(p) => self.process_participants(p, received_at),
            Packet::CarSetups(p) => self.process_car_setups(p, received_at),
            Packet::CarTelemetry(p) => self.process_car_telemetry(p, received_at),
            Packet::CarStatus(p) => self.process_car_status(p, received_at),
        }
    }

    pub fn process_motion(&mut self, p: &PacketMotionData, at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        if !self.is_ready() {
            return Vec::new();
        }
        let mut records =
            self.per_driver(&p.header, at, Measurement::MotionData, &p.car_motion_data, fields::car_motion);
        records.push(MeasurementRecord::new(
            Measurement::MyMotionData,
            self.base_tags(&p.header),
            at,
            fields::player_motion(p),
        ));
        records
    }

    pub fn process_car_setups(&mut self, p: &PacketCarSetupData, at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        if !self.is_ready() {
            return Vec::new();
        }
        self.per_driver(&p.header, at, Measurement::CarSetupData, &p.car_setups, fields::car_setup)
    }

    pub fn process_car_telemetry(
        &mut self,
        p: &PacketCarTelemetryData,
        at: DateTime<Utc>,
    ) -> Vec<MeasurementRecord> {
        if !self.is_ready() {
            return Vec::new();
        }
        self.per_driver(&p.header, at, Measurement::CarTelemetryData, &p.car_telemetry_data, fields::car_telemetry)
    }

    pub fn process_car_status(&mut self, p: &PacketCarStatusData, at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        if !self.is_ready() {
            return Vec::new();
        }
        self.per_driver(&p.header, at, Measurement::CarStatusData, &p.car_status_data, fields::car_status)
    }

    pub fn process_lap_data(&mut self, p: &PacketLapData, at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        if !self.is_ready() {
            return Vec::new();
        }
        self.per_driver(&p.header, at, Measurement::LapData, &p.lap_data, fields::lap)
    }

    pub fn process_session(&mut self, p: &PacketSessionData, at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        self.observe_session(p, at);
        if !self.is_ready() {
            return Vec::new();
        }

        let zones = p.active_marshal_zones();
        let mut records = Vec::with_capacity(zones.len() + 1);
        for (i, zone) in zones.iter().enumerate() {
            let mut tags = self.base_tags(&p.header);
            tags.insert("MarshalZoneId", format!("MarshalZone{}", i));
            records.push(MeasurementRecord::new(Measurement::MarshalZones, tags, at, fields::marshal_zone(zone)));
        }
        records.push(MeasurementRecord::new(
            Measurement::SessionData,
            self.base_tags(&p.header),
            at,
            fields::session(p),
        ));
        records
    }

    pub fn process_event(&mut self, p: &PacketEventData, at: DateTime<Utc>) -> Vec<MeasurementRecord> {
        if !self.is_ready() {
            return Vec::new();
        }
        vec![MeasurementRecord::new(Measurement::EventData, self.base_tags(&p.header), at, fields::event(p))]
    }

    pub fn process_participants(
        &mut self,
        p: &PacketParticipantsData,
        at: DateTime<Utc>,
    ) -> Vec<MeasurementRecord> {
        // Readiness is judged against the roster as it was before this packet
        let ready = self.is_ready();
        self.roster = DriverRoster::from_participants(p);
        debug!(drivers = self.roster.len(), "Driver roster rebuilt");

        if !ready {
            return Vec::new();
        }

        let mut records = Vec::with_capacity(self.roster.len());
        for ((_, name), participant) in self.roster.iter().zip(p.active()) {
            let mut tags = self.base_tags(&p.header);
            tags.insert("driver", name);
            records.push(MeasurementRecord::new(
                Measurement::ParticipantData,
                tags,
                at,
                fields::participant(participant, name),
            ));
        }
        records
    }

    fn observe_session(&mut self, p: &PacketSessionData, at: DateTime<Utc>) {
        let uid = p.header.session_uid;
        if self.raw_session_uid == Some(uid) {
            return;
        }

        let identity = SessionIdentity::derive(at, p.track_id, p.formula);
        info!(
            session_uid = uid,
            previous_uid = ?self.raw_session_uid,
            session = %identity,
            "New session detected"
        );
        self.raw_session_uid = Some(uid);
        self.identity = Some(identity);
    }

    fn base_tags(&self, header: &PacketHeader) -> TagSet {
        let mut tags = TagSet::new();
        if let Some(identity) = &self.identity {
            tags.insert("sessionId", identity.as_str());
        }
        tags.insert("sessionTime", header.session_time).insert("packetId", header.packet_id);
        tags
    }

    /// One record per roster entry, paired with the car slot of the same index
    fn per_driver<T>(
        &self,
        header: &PacketHeader,
        at: DateTime<Utc>,
        measurement: Measurement,
        cars: &[T],
        schema: fn(&T) -> FieldSet,
    ) -> Vec<MeasurementRecord> {
        self.roster
            .iter()
            .zip(cars)
            .map(|((_, name), car)| {
                let mut tags = self.base_tags(header);
                tags.insert("driver", name);
                MeasurementRecord::new(measurement, tags, at, schema(car))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{self, PacketId};
    use crate::test_utils::{self, SESSION_UID};
    use crate::types::{FieldValue, TagValue};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 8, 4, 14, 10, 30).unwrap()
    }

    fn decode(data: &[u8]) -> Packet {
        packet::decode(data).expect("test packet should decode")
    }

    fn ready_tracker(drivers: &[&str]) -> SessionTracker {
        let mut tracker = SessionTracker::new();
        tracker.process(&decode(&test_utils::participants_packet(SESSION_UID, drivers)), at());
        tracker.process(&decode(&test_utils::session_packet(SESSION_UID, 10, 0, 3)), at());
        assert!(tracker.is_ready());
        tracker
    }

    #[test]
    fn nothing_emitted_before_ready() {
        let mut tracker = SessionTracker::new();
        for id in PacketId::ALL {
            let records = tracker.process(&decode(&test_utils::blank_packet(id, SESSION_UID)), at());
            assert!(records.is_empty(), "{} emitted records before ready", id);
        }
        // blank participants has zero active cars, so the roster stays empty
        assert!(!tracker.is_ready());
        assert!(tracker.session_identity().is_some());
    }

    #[test]
    fn participants_alone_do_not_make_ready() {
        let mut tracker = SessionTracker::new();
        let records = tracker.process(&decode(&test_utils::participants_packet(SESSION_UID, &["A", "B"])), at());
        assert!(records.is_empty());
        assert_eq!(tracker.roster().len(), 2);
        assert!(!tracker.is_ready());

        let motion = decode(&test_utils::blank_packet(PacketId::Motion, SESSION_UID));
        assert!(tracker.process(&motion, at()).is_empty());
    }

    #[test]
    fn session_identity_format() {
        let tracker = ready_tracker(&["A"]);
        assert_eq!(tracker.session_identity().unwrap().as_str(), "20190804_1410_Spa_0");
    }

    #[test]
    fn identity_recomputed_only_on_uid_change() {
        let mut tracker = ready_tracker(&["A"]);
        let first = tracker.session_identity().cloned().unwrap();

        let later = at() + chrono::Duration::minutes(5);
        tracker.process(&decode(&test_utils::session_packet(SESSION_UID, 10, 0, 0)), later);
        assert_eq!(tracker.session_identity(), Some(&first));

        tracker.process(&decode(&test_utils::session_packet(SESSION_UID + 1, 5, 1, 0)), later);
        let second = tracker.session_identity().cloned().unwrap();
        assert_eq!(second.as_str(), "20190804_1415_Monaco_1");
        assert_ne!(second, first);
        assert!(tracker.is_ready(), "readiness never resets");
    }

    #[test]
    fn participants_yield_one_record_per_active_driver_once_ready() {
        let mut tracker = ready_tracker(&["A", "B"]);
        let data = test_utils::participants_packet(SESSION_UID, &["VERSTAPPEN", "LECLERC", "NORRIS"]);
        let records = tracker.process(&decode(&data), at());

        assert_eq!(records.len(), 3);
        assert_eq!(tracker.roster().len(), 3);
        let drivers: Vec<_> = records.iter().map(|r| r.driver().unwrap()).collect();
        assert_eq!(drivers, vec!["VERSTAPPEN", "LECLERC", "NORRIS"]);
        assert_eq!(records[1].fields.get("name").and_then(FieldValue::as_str), Some("LECLERC"));
        assert!(records.iter().all(|r| r.measurement == Measurement::ParticipantData));
    }

    #[test]
    fn motion_yields_per_driver_plus_aggregate() {
        let mut tracker = ready_tracker(&["A", "B"]);
        let records = tracker.process(&decode(&test_utils::blank_packet(PacketId::Motion, SESSION_UID)), at());

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].measurement, Measurement::MotionData);
        assert_eq!(records[0].driver(), Some("A"));
        assert_eq!(records[1].driver(), Some("B"));
        assert_eq!(records[2].measurement, Measurement::MyMotionData);
        assert_eq!(records[2].driver(), None);
        for q in ["suspensionPosition", "suspensionVelocity", "suspensionAcceleration", "wheelSpeed", "wheelSlip"] {
            assert!(!records[2].fields.contains(q));
            assert!(records[2].fields.contains(&format!("{}_RL", q)));
            assert!(records[2].fields.contains(&format!("{}_FR", q)));
        }
    }

    #[test]
    fn telemetry_tyre_pressure_expanded() {
        let mut tracker = ready_tracker(&["A"]);
        let data = test_utils::car_telemetry_packet(SESSION_UID, &[[1.0, 2.0, 3.0, 4.0]]);
        let records = tracker.process(&decode(&data), at());

        assert_eq!(records.len(), 1);
        let f = &records[0].fields;
        assert_eq!(f.get("tyresPressure_RL"), Some(&FieldValue::Float(1.0)));
        assert_eq!(f.get("tyresPressure_RR"), Some(&FieldValue::Float(2.0)));
        assert_eq!(f.get("tyresPressure_FL"), Some(&FieldValue::Float(3.0)));
        assert_eq!(f.get("tyresPressure_FR"), Some(&FieldValue::Float(4.0)));
        assert!(!f.contains("tyresPressure"));
    }

    #[test]
    fn session_emits_marshal_zones_then_aggregate() {
        let mut tracker = ready_tracker(&["A"]);
        let records = tracker.process(&decode(&test_utils::session_packet(SESSION_UID, 10, 0, 4)), at());

        assert_eq!(records.len(), 5);
        for (i, record) in records[..4].iter().enumerate() {
            assert_eq!(record.measurement, Measurement::MarshalZones);
            assert_eq!(record.tags.get("MarshalZoneId"), Some(&TagValue::Text(format!("MarshalZone{}", i))));
        }
        let session = &records[4];
        assert_eq!(session.measurement, Measurement::SessionData);
        assert!(session.tags.get("MarshalZoneId").is_none());
        assert!(!session.fields.contains("marshalZones"));
        assert!(!session.fields.contains("header"));
        assert_eq!(session.fields.get("trackId"), Some(&FieldValue::Int(10)));
    }

    #[test]
    fn records_carry_common_tags() {
        let mut tracker = ready_tracker(&["A"]);
        let data = test_utils::blank_packet(PacketId::LapData, SESSION_UID);
        let records = tracker.process(&decode(&data), at());

        let tags = &records[0].tags;
        assert_eq!(tags.get("sessionId"), Some(&TagValue::Text("20190804_1410_Spa_0".into())));
        assert_eq!(tags.get("packetId"), Some(&TagValue::Int(2)));
        assert!(matches!(tags.get("sessionTime"), Some(TagValue::Float(_))));
        assert_eq!(records[0].timestamp, at());
    }

    #[test]
    fn event_record_decodes_code() {
        let mut tracker = ready_tracker(&["A"]);
        let records = tracker.process(&decode(&test_utils::event_packet(SESSION_UID, *b"SSTA", 0, 0.0)), at());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.get("eventStringCode").and_then(FieldValue::as_str), Some("SSTA"));
        assert_eq!(records[0].driver(), None);
    }

    #[test]
    fn per_driver_counts_follow_roster() {
        let mut tracker = ready_tracker(&["A", "B", "C"]);
        for id in [PacketId::LapData, PacketId::CarSetups, PacketId::CarTelemetry, PacketId::CarStatus] {
            let records = tracker.process(&decode(&test_utils::blank_packet(id, SESSION_UID)), at());
            assert_eq!(records.len(), 3, "{}", id);
        }
    }
}
