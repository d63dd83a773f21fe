//! Typed payloads for the eight F1 2019 packet types
//!
//! Every structure is packed and little-endian. Each `parse` function reads
//! its fields in wire order from a [`ByteReader`] positioned just after the
//! header; the dispatcher has already verified the exact datagram length, so
//! truncation here only happens if the compatibility table is wrong.
//!
//! Per-wheel arrays are always ordered RL, RR, FL, FR.

use super::header::PacketHeader;
use super::reader::ByteReader;
use crate::PacketError;

/// Car slots carried by every per-car array
pub const NUM_CARS: usize = 20;

/// Marshal zone slots carried by the session packet
pub const NUM_MARSHAL_ZONES: usize = 21;

/// Bytes in a participant name, NUL padded
pub const NAME_LEN: usize = 48;

fn per_car<T>(
    r: &mut ByteReader<'_>,
    parse: impl Fn(&mut ByteReader<'_>) -> Result<T, PacketError>,
) -> Result<Vec<T>, PacketError> {
    (0..NUM_CARS).map(|_| parse(r)).collect()
}

// ---------------------------------------------------------------------------
// MOTION (id 0)
// ---------------------------------------------------------------------------

/// World-space physics for one car (60 bytes)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarMotionData {
    pub world_position_x: f32,
    pub world_position_y: f32,
    pub world_position_z: f32,
    pub world_velocity_x: f32,
    pub world_velocity_y: f32,
    pub world_velocity_z: f32,
    /// Normalised direction vectors, scaled to i16
    pub world_forward_dir_x: i16,
    pub world_forward_dir_y: i16,
    pub world_forward_dir_z: i16,
    pub world_right_dir_x: i16,
    pub world_right_dir_y: i16,
    pub world_right_dir_z: i16,
    pub g_force_lateral: f32,
    pub g_force_longitudinal: f32,
    pub g_force_vertical: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl CarMotionData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            world_position_x: r.f32()?,
            world_position_y: r.f32()?,
            world_position_z: r.f32()?,
            world_velocity_x: r.f32()?,
            world_velocity_y: r.f32()?,
            world_velocity_z: r.f32()?,
            world_forward_dir_x: r.i16()?,
            world_forward_dir_y: r.i16()?,
            world_forward_dir_z: r.i16()?,
            world_right_dir_x: r.i16()?,
            world_right_dir_y: r.i16()?,
            world_right_dir_z: r.i16()?,
            g_force_lateral: r.f32()?,
            g_force_longitudinal: r.f32()?,
            g_force_vertical: r.f32()?,
            yaw: r.f32()?,
            pitch: r.f32()?,
            roll: r.f32()?,
        })
    }
}

/// Motion packet: all cars plus extended data for the player car
#[derive(Debug, Clone, PartialEq)]
pub struct PacketMotionData {
    pub header: PacketHeader,
    pub car_motion_data: Vec<CarMotionData>,
    pub suspension_position: [f32; 4],
    pub suspension_velocity: [f32; 4],
    pub suspension_acceleration: [f32; 4],
    pub wheel_speed: [f32; 4],
    pub wheel_slip: [f32; 4],
    pub local_velocity_x: f32,
    pub local_velocity_y: f32,
    pub local_velocity_z: f32,
    pub angular_velocity_x: f32,
    pub angular_velocity_y: f32,
    pub angular_velocity_z: f32,
    pub angular_acceleration_x: f32,
    pub angular_acceleration_y: f32,
    pub angular_acceleration_z: f32,
    pub front_wheels_angle: f32,
}

impl PacketMotionData {
    pub const SIZE: usize = 1343;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            header,
            car_motion_data: per_car(r, CarMotionData::parse)?,
            suspension_position: r.f32_x4()?,
            suspension_velocity: r.f32_x4()?,
            suspension_acceleration: r.f32_x4()?,
            wheel_speed: r.f32_x4()?,
            wheel_slip: r.f32_x4()?,
            local_velocity_x: r.f32()?,
            local_velocity_y: r.f32()?,
            local_velocity_z: r.f32()?,
            angular_velocity_x: r.f32()?,
            angular_velocity_y: r.f32()?,
            angular_velocity_z: r.f32()?,
            angular_acceleration_x: r.f32()?,
            angular_acceleration_y: r.f32()?,
            angular_acceleration_z: r.f32()?,
            front_wheels_angle: r.f32()?,
        })
    }
}

// ---------------------------------------------------------------------------
// SESSION (id 1)
// ---------------------------------------------------------------------------

/// One marshal zone (5 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarshalZone {
    /// Fraction of lap length where the zone starts
    pub zone_start: f32,
    /// -1 invalid, 0 none, 1 green, 2 blue, 3 yellow, 4 red
    pub zone_flag: i8,
}

impl MarshalZone {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self { zone_start: r.f32()?, zone_flag: r.i8()? })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketSessionData {
    pub header: PacketHeader,
    pub weather: u8,
    pub track_temperature: i8,
    pub air_temperature: i8,
    pub total_laps: u8,
    pub track_length: u16,
    pub session_type: u8,
    pub track_id: i8,
    /// Race format code: 0 modern F1, 1 classic, 2 F2, 3 generic
    pub formula: u8,
    pub session_time_left: u16,
    pub session_duration: u16,
    pub pit_speed_limit: u8,
    pub game_paused: u8,
    pub is_spectating: u8,
    pub spectator_car_index: u8,
    pub sli_pro_native_support: u8,
    pub num_marshal_zones: u8,
    pub marshal_zones: Vec<MarshalZone>,
    pub safety_car_status: u8,
    pub network_game: u8,
}

impl PacketSessionData {
    pub const SIZE: usize = 149;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            header,
            weather: r.u8()?,
            track_temperature: r.i8()?,
            air_temperature: r.i8()?,
            total_laps: r.u8()?,
            track_length: r.u16()?,
            session_type: r.u8()?,
            track_id: r.i8()?,
            formula: r.u8()?,
            session_time_left: r.u16()?,
            session_duration: r.u16()?,
            pit_speed_limit: r.u8()?,
            game_paused: r.u8()?,
            is_spectating: r.u8()?,
            spectator_car_index: r.u8()?,
            sli_pro_native_support: r.u8()?,
            num_marshal_zones: r.u8()?,
            marshal_zones: (0..NUM_MARSHAL_ZONES)
                .map(|_| MarshalZone::parse(r))
                .collect::<Result<_, _>>()?,
            safety_car_status: r.u8()?,
            network_game: r.u8()?,
        })
    }

    /// Marshal zones actually in use on this track
    pub fn active_marshal_zones(&self) -> &[MarshalZone] {
        let count = usize::from(self.num_marshal_zones).min(self.marshal_zones.len());
        &self.marshal_zones[..count]
    }
}

// ---------------------------------------------------------------------------
// LAP_DATA (id 2)
// ---------------------------------------------------------------------------

/// Lap timing for one car (41 bytes)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapData {
    pub last_lap_time: f32,
    pub current_lap_time: f32,
    pub best_lap_time: f32,
    pub sector1_time: f32,
    pub sector2_time: f32,
    pub lap_distance: f32,
    pub total_distance: f32,
    pub safety_car_delta: f32,
    pub car_position: u8,
    pub current_lap_num: u8,
    pub pit_status: u8,
    pub sector: u8,
    pub current_lap_invalid: u8,
    pub penalties: u8,
    pub grid_position: u8,
    pub driver_status: u8,
    pub result_status: u8,
}

impl LapData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            last_lap_time: r.f32()?,
            current_lap_time: r.f32()?,
            best_lap_time: r.f32()?,
            sector1_time: r.f32()?,
            sector2_time: r.f32()?,
            lap_distance: r.f32()?,
            total_distance: r.f32()?,
            safety_car_delta: r.f32()?,
            car_position: r.u8()?,
            current_lap_num: r.u8()?,
            pit_status: r.u8()?,
            sector: r.u8()?,
            current_lap_invalid: r.u8()?,
            penalties: r.u8()?,
            grid_position: r.u8()?,
            driver_status: r.u8()?,
            result_status: r.u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketLapData {
    pub header: PacketHeader,
    pub lap_data: Vec<LapData>,
}

impl PacketLapData {
    pub const SIZE: usize = 843;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self { header, lap_data: per_car(r, LapData::parse)? })
    }
}

// ---------------------------------------------------------------------------
// EVENT (id 3)
// ---------------------------------------------------------------------------

/// Event-specific details; the wire carries a 5 byte union
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventDetails {
    FastestLap { vehicle_idx: u8, lap_time: f32 },
    Retirement { vehicle_idx: u8 },
    TeamMateInPits { vehicle_idx: u8 },
    RaceWinner { vehicle_idx: u8 },
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketEventData {
    pub header: PacketHeader,
    /// Four ASCII characters, e.g. `SSTA`, `FTLP`
    pub event_string_code: [u8; 4],
    pub details: EventDetails,
}

impl PacketEventData {
    pub const SIZE: usize = 32;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        let event_string_code = r.bytes::<4>()?;
        let vehicle_idx = r.u8()?;
        let lap_time = r.f32()?;

        let details = match &event_string_code {
            b"FTLP" => EventDetails::FastestLap { vehicle_idx, lap_time },
            b"RTMT" => EventDetails::Retirement { vehicle_idx },
            b"TMPT" => EventDetails::TeamMateInPits { vehicle_idx },
            b"RCWN" => EventDetails::RaceWinner { vehicle_idx },
            _ => EventDetails::None,
        };

        Ok(Self { header, event_string_code, details })
    }

    /// Event code as text
    pub fn code(&self) -> String {
        String::from_utf8_lossy(&self.event_string_code).into_owned()
    }
}

// ---------------------------------------------------------------------------
// PARTICIPANTS (id 4)
// ---------------------------------------------------------------------------

/// Identity of one car's driver (54 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantData {
    pub ai_controlled: u8,
    pub driver_id: u8,
    pub team_id: u8,
    pub race_number: u8,
    pub nationality: u8,
    pub name: [u8; NAME_LEN],
    pub your_telemetry: u8,
}

impl ParticipantData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            ai_controlled: r.u8()?,
            driver_id: r.u8()?,
            team_id: r.u8()?,
            race_number: r.u8()?,
            nationality: r.u8()?,
            name: r.bytes::<NAME_LEN>()?,
            your_telemetry: r.u8()?,
        })
    }

    /// Driver name up to the first NUL byte
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketParticipantsData {
    pub header: PacketHeader,
    pub num_active_cars: u8,
    pub participants: Vec<ParticipantData>,
}

impl PacketParticipantsData {
    pub const SIZE: usize = 1104;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            header,
            num_active_cars: r.u8()?,
            participants: per_car(r, ParticipantData::parse)?,
        })
    }

    /// Participants occupying the first `num_active_cars` slots
    pub fn active(&self) -> &[ParticipantData] {
        let count = usize::from(self.num_active_cars).min(self.participants.len());
        &self.participants[..count]
    }
}

// ---------------------------------------------------------------------------
// CAR_SETUPS (id 5)
// ---------------------------------------------------------------------------

/// Setup of one car (41 bytes)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarSetupData {
    pub front_wing: u8,
    pub rear_wing: u8,
    pub on_throttle: u8,
    pub off_throttle: u8,
    pub front_camber: f32,
    pub rear_camber: f32,
    pub front_toe: f32,
    pub rear_toe: f32,
    pub front_suspension: u8,
    pub rear_suspension: u8,
    pub front_anti_roll_bar: u8,
    pub rear_anti_roll_bar: u8,
    pub front_suspension_height: u8,
    pub rear_suspension_height: u8,
    pub brake_pressure: u8,
    pub brake_bias: u8,
    pub front_tyre_pressure: f32,
    pub rear_tyre_pressure: f32,
    pub ballast: u8,
    pub fuel_load: f32,
}

impl CarSetupData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            front_wing: r.u8()?,
            rear_wing: r.u8()?,
            on_throttle: r.u8()?,
            off_throttle: r.u8()?,
            front_camber: r.f32()?,
            rear_camber: r.f32()?,
            front_toe: r.f32()?,
            rear_toe: r.f32()?,
            front_suspension: r.u8()?,
            rear_suspension: r.u8()?,
            front_anti_roll_bar: r.u8()?,
            rear_anti_roll_bar: r.u8()?,
            front_suspension_height: r.u8()?,
            rear_suspension_height: r.u8()?,
            brake_pressure: r.u8()?,
            brake_bias: r.u8()?,
            front_tyre_pressure: r.f32()?,
            rear_tyre_pressure: r.f32()?,
            ballast: r.u8()?,
            fuel_load: r.f32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketCarSetupData {
    pub header: PacketHeader,
    pub car_setups: Vec<CarSetupData>,
}

impl PacketCarSetupData {
    pub const SIZE: usize = 843;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self { header, car_setups: per_car(r, CarSetupData::parse)? })
    }
}

// ---------------------------------------------------------------------------
// CAR_TELEMETRY (id 6)
// ---------------------------------------------------------------------------

/// Driver inputs and sensor readings for one car (66 bytes)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarTelemetryData {
    /// km/h
    pub speed: u16,
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
    pub clutch: u8,
    pub gear: i8,
    pub engine_rpm: u16,
    pub drs: u8,
    pub rev_lights_percent: u8,
    pub brakes_temperature: [u16; 4],
    pub tyres_surface_temperature: [u16; 4],
    pub tyres_inner_temperature: [u16; 4],
    pub engine_temperature: u16,
    /// PSI
    pub tyres_pressure: [f32; 4],
    pub surface_type: [u8; 4],
}

impl CarTelemetryData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            speed: r.u16()?,
            throttle: r.f32()?,
            steer: r.f32()?,
            brake: r.f32()?,
            clutch: r.u8()?,
            gear: r.i8()?,
            engine_rpm: r.u16()?,
            drs: r.u8()?,
            rev_lights_percent: r.u8()?,
            brakes_temperature: r.u16_x4()?,
            tyres_surface_temperature: r.u16_x4()?,
            tyres_inner_temperature: r.u16_x4()?,
            engine_temperature: r.u16()?,
            tyres_pressure: r.f32_x4()?,
            surface_type: r.u8_x4()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketCarTelemetryData {
    pub header: PacketHeader,
    pub car_telemetry_data: Vec<CarTelemetryData>,
    /// Bit flags for controller buttons currently pressed
    pub button_status: u32,
}

impl PacketCarTelemetryData {
    pub const SIZE: usize = 1347;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            header,
            car_telemetry_data: per_car(r, CarTelemetryData::parse)?,
            button_status: r.u32()?,
        })
    }
}

// ---------------------------------------------------------------------------
// CAR_STATUS (id 7)
// ---------------------------------------------------------------------------

/// Car systems state for one car (56 bytes)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarStatusData {
    pub traction_control: u8,
    pub anti_lock_brakes: u8,
    pub fuel_mix: u8,
    pub front_brake_bias: u8,
    pub pit_limiter_status: u8,
    pub fuel_in_tank: f32,
    pub fuel_capacity: f32,
    pub fuel_remaining_laps: f32,
    pub max_rpm: u16,
    pub idle_rpm: u16,
    pub max_gears: u8,
    pub drs_allowed: u8,
    /// Percent
    pub tyres_wear: [u8; 4],
    pub actual_tyre_compound: u8,
    pub tyre_visual_compound: u8,
    /// Percent
    pub tyres_damage: [u8; 4],
    pub front_left_wing_damage: u8,
    pub front_right_wing_damage: u8,
    pub rear_wing_damage: u8,
    pub engine_damage: u8,
    pub gear_box_damage: u8,
    pub vehicle_fia_flags: i8,
    pub ers_store_energy: f32,
    pub ers_deploy_mode: u8,
    pub ers_harvested_this_lap_mguk: f32,
    pub ers_harvested_this_lap_mguh: f32,
    pub ers_deployed_this_lap: f32,
}

impl CarStatusData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self {
            traction_control: r.u8()?,
            anti_lock_brakes: r.u8()?,
            fuel_mix: r.u8()?,
            front_brake_bias: r.u8()?,
            pit_limiter_status: r.u8()?,
            fuel_in_tank: r.f32()?,
            fuel_capacity: r.f32()?,
            fuel_remaining_laps: r.f32()?,
            max_rpm: r.u16()?,
            idle_rpm: r.u16()?,
            max_gears: r.u8()?,
            drs_allowed: r.u8()?,
            tyres_wear: r.u8_x4()?,
            actual_tyre_compound: r.u8()?,
            tyre_visual_compound: r.u8()?,
            tyres_damage: r.u8_x4()?,
            front_left_wing_damage: r.u8()?,
            front_right_wing_damage: r.u8()?,
            rear_wing_damage: r.u8()?,
            engine_damage: r.u8()?,
            gear_box_damage: r.u8()?,
            vehicle_fia_flags: r.i8()?,
            ers_store_energy: r.f32()?,
            ers_deploy_mode: r.u8()?,
            ers_harvested_this_lap_mguk: r.f32()?,
            ers_harvested_this_lap_mguh: r.f32()?,
            ers_deployed_this_lap: r.f32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketCarStatusData {
    pub header: PacketHeader,
    pub car_status_data: Vec<CarStatusData>,
}

impl PacketCarStatusData {
    pub const SIZE: usize = 1143;

    pub fn parse(header: PacketHeader, r: &mut ByteReader<'_>) -> Result<Self, PacketError> {
        Ok(Self { header, car_status_data: per_car(r, CarStatusData::parse)? })
    }
}
