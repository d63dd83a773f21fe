//! F1 UDP packet header
//!
//! Every datagram starts with the same packed header. Layout (little-endian):
//!
//! ```text
//! uint16  packetFormat        // offset 0, 2019
//! uint8   gameMajorVersion    // offset 2
//! uint8   gameMinorVersion    // offset 3
//! uint8   packetVersion       // offset 4
//! uint8   packetId            // offset 5
//! uint64  sessionUID          // offset 6
//! float   sessionTime         // offset 14
//! uint32  frameIdentifier     // offset 18
//! uint8   playerCarIndex      // offset 22
//! ```

use super::reader::ByteReader;
use crate::PacketError;
use tracing::trace;

/// Size in bytes of the packed header
pub const HEADER_SIZE: usize = 23;

/// Decoded packet header common to all packet types
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketHeader {
    /// Wire format year (2019)
    pub packet_format: u16,
    pub game_major_version: u8,
    pub game_minor_version: u8,
    /// Version of this packet type's layout
    pub packet_version: u8,
    /// Packet type tag
    pub packet_id: u8,
    /// Opaque session identifier as sent by the game
    pub session_uid: u64,
    /// Seconds since session start
    pub session_time: f32,
    pub frame_identifier: u32,
    /// Car slot of the local player
    pub player_car_index: u8,
}

impl PacketHeader {
    /// Parse the header from the start of a datagram
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < HEADER_SIZE {
            return Err(PacketError::TooShort { len: data.len(), min: HEADER_SIZE });
        }

        let mut r = ByteReader::new(data);
        let header = Self {
            packet_format: r.u16()?,
            game_major_version: r.u8()?,
            game_minor_version: r.u8()?,
            packet_version: r.u8()?,
            packet_id: r.u8()?,
            session_uid: r.u64()?,
            session_time: r.f32()?,
            frame_identifier: r.u32()?,
            player_car_index: r.u8()?,
        };

        trace!(
            format = header.packet_format,
            version = header.packet_version,
            id = header.packet_id,
            frame = header.frame_identifier,
            "Parsed packet header"
        );

        Ok(header)
    }

    /// The (format, version, id) triple used for compatibility lookup
    pub fn type_triple(&self) -> (u16, u8, u8) {
        (self.packet_format, self.packet_version, self.packet_id)
    }
}
