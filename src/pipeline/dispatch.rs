//! Packet classification and dispatch for one flush window

use tracing::{debug, error};

use crate::packet::{self, PacketId};
use crate::session::SessionTracker;
use crate::sink::Sink;
use crate::types::{MeasurementRecord, RawDatagram};
use crate::{PacketError, Result};

/// Rejected datagrams by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub too_short: u64,
    pub unrecognized: u64,
    pub size_mismatch: u64,
    pub truncated: u64,
}

impl DropCounts {
    pub fn total(&self) -> u64 {
        self.too_short + self.unrecognized + self.size_mismatch + self.truncated
    }

    fn count(&mut self, error: &PacketError) {
        match error {
            PacketError::TooShort { .. } => self.too_short += 1,
            PacketError::Unrecognized { .. } => self.unrecognized += 1,
            PacketError::SizeMismatch { .. } => self.size_mismatch += 1,
            PacketError::Truncated { .. } => self.truncated += 1,
        }
    }

    pub(crate) fn add(&mut self, other: &DropCounts) {
        self.too_short += other.too_short;
        self.unrecognized += other.unrecognized;
        self.size_mismatch += other.size_mismatch;
        self.truncated += other.truncated;
    }
}

/// Records of one flush window, grouped by source packet type
///
/// Within a group records keep the arrival order of their packets. Groups are
/// ordered by the arrival of the first packet that produced records for them.
#[derive(Debug, Default)]
pub struct Batches {
    by_type: [Vec<MeasurementRecord>; PacketId::ALL.len()],
    order: Vec<PacketId>,
    /// Datagrams that decoded successfully
    pub packets: u64,
    pub dropped: DropCounts,
}

impl Batches {
    /// Records produced from packets of type `id`
    pub fn get(&self, id: PacketId) -> &[MeasurementRecord] {
        &self.by_type[id.index()]
    }

    pub fn record_count(&self) -> usize {
        self.by_type.iter().map(Vec::len).sum()
    }

    /// Non-empty groups in first-arrival order
    pub fn non_empty(&self) -> impl Iterator<Item = (PacketId, &[MeasurementRecord])> {
        self.order.iter().map(|&id| (id, self.get(id)))
    }

    fn push(&mut self, id: PacketId, records: Vec<MeasurementRecord>) {
        if records.is_empty() {
            return;
        }
        let group = &mut self.by_type[id.index()];
        if group.is_empty() {
            self.order.push(id);
        }
        group.extend(records);
    }

    /// Write each non-empty group as one batch; the first failure stops the rest
    ///
    /// Returns the number of batches written.
    pub async fn submit<S: Sink + ?Sized>(&self, sink: &S) -> Result<usize> {
        let mut written = 0;
        for (id, records) in self.non_empty() {
            sink.write_batch(records).await?;
            debug!(packet = %id, records = records.len(), sink = sink.name(), "Batch written");
            written += 1;
        }
        Ok(written)
    }
}

/// Owns the session tracker and routes decoded packets through it
#[derive(Debug, Default)]
pub struct Dispatcher {
    tracker: SessionTracker,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Decode every datagram in order and collect the resulting records
    ///
    /// Rejected datagrams are logged and counted; they never stop the window.
    pub fn process(&mut self, datagrams: &[RawDatagram]) -> Batches {
        let mut batches = Batches::default();

        for datagram in datagrams {
            match packet::decode(&datagram.data) {
                Ok(packet) => {
                    batches.packets += 1;
                    let records = self.tracker.process(&packet, datagram.received_at);
                    batches.push(packet.id(), records);
                }
                Err(e) => {
                    error!(len = datagram.len(), error = %e, "Dropping datagram");
                    batches.dropped.count(&e);
                }
            }
        }

        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::test_utils::{self, SESSION_UID};
    use crate::types::Measurement;
    use chrono::Utc;

    fn datagrams(packets: &[Vec<u8>]) -> Vec<RawDatagram> {
        let now = Utc::now();
        packets.iter().map(|p| test_utils::datagram(p, now)).collect()
    }

    #[test]
    fn groups_records_by_packet_type() {
        let mut dispatcher = Dispatcher::new();
        let batches = dispatcher.process(&datagrams(&[
            test_utils::session_packet(SESSION_UID, 10, 0, 2),
            test_utils::participants_packet(SESSION_UID, &["A", "B"]),
            test_utils::blank_packet(PacketId::LapData, SESSION_UID),
            test_utils::blank_packet(PacketId::CarSetups, SESSION_UID),
            test_utils::blank_packet(PacketId::CarStatus, SESSION_UID),
        ]));

        assert_eq!(batches.packets, 5);
        assert!(batches.get(PacketId::Session).is_empty());
        assert!(batches.get(PacketId::Participants).is_empty());
        assert_eq!(batches.get(PacketId::LapData).len(), 2);
        assert!(batches.get(PacketId::CarSetups).iter().all(|r| r.measurement == Measurement::CarSetupData));
        assert!(batches.get(PacketId::CarStatus).iter().all(|r| r.measurement == Measurement::CarStatusData));
        assert_eq!(batches.record_count(), 6);
    }

    #[test]
    fn rejections_are_counted_and_skipped() {
        let mut short = test_utils::blank_packet(PacketId::Motion, SESSION_UID);
        short.truncate(packet::HEADER_SIZE - 1);
        let mut unknown = test_utils::blank_packet(PacketId::Motion, SESSION_UID);
        unknown[5] = 42;
        let mut oversized = test_utils::blank_packet(PacketId::Event, SESSION_UID);
        oversized.push(0);

        let mut dispatcher = Dispatcher::new();
        let batches = dispatcher.process(&datagrams(&[
            short,
            unknown,
            oversized,
            test_utils::participants_packet(SESSION_UID, &["A"]),
        ]));

        assert_eq!(
            batches.dropped,
            DropCounts { too_short: 1, unrecognized: 1, size_mismatch: 1, truncated: 0 }
        );
        assert_eq!(batches.dropped.total(), 3);
        assert_eq!(batches.packets, 1);
        assert_eq!(dispatcher.tracker().roster().len(), 1);
    }

    #[tokio::test]
    async fn submits_one_write_per_non_empty_type() {
        let mut dispatcher = Dispatcher::new();
        let batches = dispatcher.process(&datagrams(&[
            test_utils::participants_packet(SESSION_UID, &["A", "B"]),
            test_utils::session_packet(SESSION_UID, 10, 0, 0),
            test_utils::blank_packet(PacketId::CarStatus, SESSION_UID),
            test_utils::blank_packet(PacketId::CarSetups, SESSION_UID),
            test_utils::blank_packet(PacketId::CarStatus, SESSION_UID),
        ]));

        let sink = MemorySink::new();
        assert_eq!(batches.submit(&sink).await.unwrap(), 3);

        let written = sink.batches();
        assert_eq!(written.len(), 3);
        // first-arrival order: SESSION, CAR_STATUS, CAR_SETUPS
        assert_eq!(written[0][0].measurement, Measurement::SessionData);
        // both CAR_STATUS packets land in the same batch
        assert_eq!(written[1].len(), 4);
        assert_eq!(written[1][0].measurement, Measurement::CarStatusData);
        assert_eq!(written[2].len(), 2);
        assert_eq!(written[2][0].measurement, Measurement::CarSetupData);
    }

    #[tokio::test]
    async fn batches_follow_arrival_order_not_packet_id() {
        let mut dispatcher = Dispatcher::new();
        let batches = dispatcher.process(&datagrams(&[
            test_utils::participants_packet(SESSION_UID, &["A", "B"]),
            test_utils::session_packet(SESSION_UID, 10, 0, 1),
            test_utils::session_packet(SESSION_UID, 10, 0, 1),
            test_utils::blank_packet(PacketId::Motion, SESSION_UID),
        ]));

        let order: Vec<PacketId> = batches.non_empty().map(|(id, _)| id).collect();
        assert_eq!(order, vec![PacketId::Session, PacketId::Motion]);

        let sink = MemorySink::new();
        batches.submit(&sink).await.unwrap();
        let measurements: Vec<Measurement> = sink.records().iter().map(|r| r.measurement).collect();
        assert_eq!(
            measurements,
            vec![
                Measurement::MarshalZones,
                Measurement::SessionData,
                Measurement::MarshalZones,
                Measurement::SessionData,
                Measurement::MotionData,
                Measurement::MotionData,
                Measurement::MyMotionData,
            ]
        );
    }

    #[tokio::test]
    async fn sink_failure_stops_remaining_batches() {
        let mut dispatcher = Dispatcher::new();
        let batches = dispatcher.process(&datagrams(&[
            test_utils::participants_packet(SESSION_UID, &["A"]),
            test_utils::session_packet(SESSION_UID, 10, 0, 0),
            test_utils::blank_packet(PacketId::LapData, SESSION_UID),
        ]));

        let sink = MemorySink::new();
        sink.fail_next(1);
        assert!(batches.submit(&sink).await.is_err());
        assert_eq!(sink.attempts(), 1);
        assert!(sink.batches().is_empty());
    }
}
