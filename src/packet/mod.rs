//! F1 2019 UDP packet decoding.
//!
//! The decoder is a pure function from datagram bytes to a typed [`Packet`]:
//!
//! 1. Reject datagrams shorter than the [`HEADER_SIZE`].
//! 2. Parse the [`PacketHeader`] and look up `(format, version, id)` in the
//!    compatibility table.
//! 3. Reject datagrams whose length differs from the resolved layout's size.
//! 4. Decode the payload.
//!
//! No record is ever produced from a datagram that fails any of these steps.
//!
//! ```rust
//! use pitlane::packet::{self, HEADER_SIZE};
//! use pitlane::PacketError;
//!
//! let err = packet::decode(&[0u8; HEADER_SIZE - 1]).unwrap_err();
//! assert!(matches!(err, PacketError::TooShort { .. }));
//! ```

mod header;
mod layouts;
mod reader;
mod tracks;

pub use header::{HEADER_SIZE, PacketHeader};
pub use layouts::*;
pub use reader::ByteReader;
pub use tracks::track_name;

use crate::PacketError;
use std::fmt;

/// Packet format year supported by this decoder
pub const PACKET_FORMAT_2019: u16 = 2019;

/// Largest datagram any supported layout produces, with headroom
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Packet type tag carried in the header's `packetId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PacketId {
    Motion = 0,
    Session = 1,
    LapData = 2,
    Event = 3,
    Participants = 4,
    CarSetups = 5,
    CarTelemetry = 6,
    CarStatus = 7,
}

impl PacketId {
    /// All packet types in id order
    pub const ALL: [PacketId; 8] = [
        PacketId::Motion,
        PacketId::Session,
        PacketId::LapData,
        PacketId::Event,
        PacketId::Participants,
        PacketId::CarSetups,
        PacketId::CarTelemetry,
        PacketId::CarStatus,
    ];

    /// Position of this id in [`PacketId::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PacketId::Motion => "MOTION",
            PacketId::Session => "SESSION",
            PacketId::LapData => "LAP_DATA",
            PacketId::Event => "EVENT",
            PacketId::Participants => "PARTICIPANTS",
            PacketId::CarSetups => "CAR_SETUPS",
            PacketId::CarTelemetry => "CAR_TELEMETRY",
            PacketId::CarStatus => "CAR_STATUS",
        }
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the compatibility table
#[derive(Debug, Clone, Copy)]
struct Layout {
    format: u16,
    version: u8,
    id: PacketId,
    size: usize,
}

const COMPATIBILITY: [Layout; 8] = [
    Layout { format: PACKET_FORMAT_2019, version: 1, id: PacketId::Motion, size: PacketMotionData::SIZE },
    Layout { format: PACKET_FORMAT_2019, version: 1, id: PacketId::Session, size: PacketSessionData::SIZE },
    Layout { format: PACKET_FORMAT_2019, version: 1, id: PacketId::LapData, size: PacketLapData::SIZE },
    Layout { format: PACKET_FORMAT_2019, version: 1, id: PacketId::Event, size: PacketEventData::SIZE },
    Layout {
        format: PACKET_FORMAT_2019,
        version: 1,
        id: PacketId::Participants,
        size: PacketParticipantsData::SIZE,
    },
    Layout { format: PACKET_FORMAT_2019, version: 1, id: PacketId::CarSetups, size: PacketCarSetupData::SIZE },
    Layout {
        format: PACKET_FORMAT_2019,
        version: 1,
        id: PacketId::CarTelemetry,
        size: PacketCarTelemetryData::SIZE,
    },
    Layout { format: PACKET_FORMAT_2019, version: 1, id: PacketId::CarStatus, size: PacketCarStatusData::SIZE },
];

/// Resolve a `(format, version, id)` triple to its packet type and exact size
pub fn resolve(format: u16, version: u8, id: u8) -> Option<(PacketId, usize)> {
    COMPATIBILITY
        .iter()
        .find(|l| l.format == format && l.version == version && l.id as u8 == id)
        .map(|l| (l.id, l.size))
}

/// A fully decoded datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Motion(PacketMotionData),
    Session(PacketSessionData),
    LapData(PacketLapData),
    Event(PacketEventData),
    Participants(PacketParticipantsData),
    CarSetups(PacketCarSetupData),
    CarTelemetry(PacketCarTelemetryData),
    CarStatus(PacketCarStatusData),
}

impl Packet {
    pub fn header(&self) -> &PacketHeader {
        match self {
            Packet::Motion(p) => &p.header,
            Packet::Session(p) => &p.header,
            Packet::LapData(p) => &p.header,
            Packet::Event(p) => &p.header,
            Packet::Participants(p) => &p.header,
            Packet::CarSetups(p) => &p.header,
            Packet::CarTelemetry(p) => &p.header,
            Packet::CarStatus(p) => &p.header,
        }
    }

    pub fn id(&self) -> PacketId {
        match self {
            Packet::Motion(_) => PacketId::Motion,
            Packet::Session(_) => PacketId::Session,
            Packet::LapData(_) => PacketId::LapData,
            Packet::Event(_) => PacketId::Event,
            Packet::Participants(_) => PacketId::Participants,
            Packet::CarSetups(_) => PacketId::CarSetups,
            Packet::CarTelemetry(_) => PacketId::CarTelemetry,
            Packet::CarStatus(_) => PacketId::CarStatus,
        }
    }
}

/// Validate and decode one datagram
pub fn decode(data: &[u8]) -> Result<Packet, PacketError> {
    let header = PacketHeader::parse(data)?;
    let (format, version, id) = header.type_triple();

    let (packet_id, expected) =
        resolve(format, version, id).ok_or(PacketError::Unrecognized { format, version, id })?;

    if data.len() != expected {
        return Err(PacketError::SizeMismatch { format, version, id, len: data.len(), expected });
    }

    let mut r = ByteReader::at(data, HEADER_SIZE);
    let packet = match packet_id {
        PacketId::Motion => Packet::Motion(PacketMotionData::parse(header, &mut r)?),
        PacketId::Session => Packet::Session(PacketSessionData::parse(header, &mut r)?),
        PacketId::LapData => Packet::LapData(PacketLapData::parse(header, &mut r)?),
        PacketId::Event => Packet::Event(PacketEventData::parse(header, &mut r)?),
        PacketId::Participants => Packet::Participants(PacketParticipantsData::parse(header, &mut r)?),
        PacketId::CarSetups => Packet::CarSetups(PacketCarSetupData::parse(header, &mut r)?),
        PacketId::CarTelemetry => Packet::CarTelemetry(PacketCarTelemetryData::parse(header, &mut r)?),
        PacketId::CarStatus => Packet::CarStatus(PacketCarStatusData::parse(header, &mut r)?),
    };

    debug_assert_eq!(r.position(), expected, "layout size disagrees with table for {}", packet_id);

    Ok(packet)
}
