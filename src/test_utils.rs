//! Synthetic datagram builders shared by unit tests and benchmarks
//!
//! Every builder returns a datagram of the exact size the decoder expects for
//! its packet type, zero filled except for the fields the builder sets.

use crate::packet::{self, HEADER_SIZE, NAME_LEN, PACKET_FORMAT_2019, PacketHeader, PacketId};
use crate::types::RawDatagram;
use chrono::{DateTime, Utc};

/// Session uid used by fixtures unless a test needs a session change
pub const SESSION_UID: u64 = 0x0F1_2019_CAFE;

const PARTICIPANT_SIZE: usize = 54;
const CAR_TELEMETRY_SIZE: usize = 66;
const TYRES_PRESSURE_OFFSET: usize = 46;
const NUM_MARSHAL_ZONES_OFFSET: usize = HEADER_SIZE + 18;

/// Header as the builders write it
pub fn header(id: PacketId, session_uid: u64) -> PacketHeader {
    PacketHeader {
        packet_format: PACKET_FORMAT_2019,
        game_major_version: 1,
        game_minor_version: 0,
        packet_version: 1,
        packet_id: id as u8,
        session_uid,
        session_time: 12.5,
        frame_identifier: 100,
        player_car_index: 0,
    }
}

fn write_header(buf: &mut [u8], h: &PacketHeader) {
    buf[0..2].copy_from_slice(&h.packet_format.to_le_bytes());
    buf[2] = h.game_major_version;
    buf[3] = h.game_minor_version;
    buf[4] = h.packet_version;
    buf[5] = h.packet_id;
    buf[6..14].copy_from_slice(&h.session_uid.to_le_bytes());
    buf[14..18].copy_from_slice(&h.session_time.to_le_bytes());
    buf[18..22].copy_from_slice(&h.frame_identifier.to_le_bytes());
    buf[22] = h.player_car_index;
}

/// Zero payload of the right size for `id`
pub fn blank_packet(id: PacketId, session_uid: u64) -> Vec<u8> {
    let (_, size) = packet::resolve(PACKET_FORMAT_2019, 1, id as u8).expect("every PacketId has a layout");
    let mut buf = vec![0u8; size];
    write_header(&mut buf, &header(id, session_uid));
    buf
}

/// PARTICIPANTS packet with `names.len()` active cars
pub fn participants_packet(session_uid: u64, names: &[&str]) -> Vec<u8> {
    let mut buf = blank_packet(PacketId::Participants, session_uid);
    buf[HEADER_SIZE] = names.len() as u8;
    for (i, name) in names.iter().enumerate() {
        let slot = HEADER_SIZE + 1 + i * PARTICIPANT_SIZE;
        buf[slot + 1] = i as u8; // driverId
        buf[slot + 3] = (i + 1) as u8; // raceNumber
        let bytes = name.as_bytes();
        let len = bytes.len().min(NAME_LEN - 1);
        buf[slot + 5..slot + 5 + len].copy_from_slice(&bytes[..len]);
    }
    buf
}

/// SESSION packet for a track/formula with `zones` marshal zones in use
pub fn session_packet(session_uid: u64, track_id: i8, formula: u8, zones: u8) -> Vec<u8> {
    let mut buf = blank_packet(PacketId::Session, session_uid);
    buf[HEADER_SIZE + 7] = track_id as u8;
    buf[HEADER_SIZE + 8] = formula;
    buf[NUM_MARSHAL_ZONES_OFFSET] = zones;
    for i in 0..usize::from(zones) {
        let offset = NUM_MARSHAL_ZONES_OFFSET + 1 + i * 5;
        let start = i as f32 / f32::from(zones.max(1));
        buf[offset..offset + 4].copy_from_slice(&start.to_le_bytes());
        buf[offset + 4] = 1;
    }
    buf
}

/// CAR_TELEMETRY packet with tyre pressures for the first cars
pub fn car_telemetry_packet(session_uid: u64, pressures: &[[f32; 4]]) -> Vec<u8> {
    let mut buf = blank_packet(PacketId::CarTelemetry, session_uid);
    for (i, wheels) in pressures.iter().enumerate() {
        let mut offset = HEADER_SIZE + i * CAR_TELEMETRY_SIZE + TYRES_PRESSURE_OFFSET;
        for value in wheels {
            buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            offset += 4;
        }
    }
    buf
}

/// EVENT packet with a four character code and details
pub fn event_packet(session_uid: u64, code: [u8; 4], vehicle_idx: u8, lap_time: f32) -> Vec<u8> {
    let mut buf = blank_packet(PacketId::Event, session_uid);
    buf[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&code);
    buf[HEADER_SIZE + 4] = vehicle_idx;
    buf[HEADER_SIZE + 5..HEADER_SIZE + 9].copy_from_slice(&lap_time.to_le_bytes());
    buf
}

/// Wrap bytes as a datagram received at `at`
pub fn datagram(data: &[u8], at: DateTime<Utc>) -> RawDatagram {
    RawDatagram::new(at, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_produce_decodable_packets() {
        let packets = [
            participants_packet(SESSION_UID, &["A", "B"]),
            session_packet(SESSION_UID, 3, 0, 21),
            car_telemetry_packet(SESSION_UID, &[[1.0; 4]; 20]),
            event_packet(SESSION_UID, *b"CHQF", 0, 0.0),
        ];
        for data in packets {
            packet::decode(&data).expect("fixture should decode");
        }
    }

    #[test]
    fn names_are_truncated_to_fit() {
        let long = "X".repeat(100);
        let data = participants_packet(SESSION_UID, &[&long]);
        let packet::Packet::Participants(p) = packet::decode(&data).unwrap() else { panic!() };
        assert_eq!(p.participants[0].name().len(), NAME_LEN - 1);
    }
}
