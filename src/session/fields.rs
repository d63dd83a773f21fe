//! Field schemas per packet type
//!
//! Each function declares exactly which scalar fields a record carries.
//! Per-wheel arrays are always expanded with [`FieldSet::insert_wheels`];
//! the header and nested collections never become fields.

use crate::packet::{
    CarMotionData, CarSetupData, CarStatusData, CarTelemetryData, EventDetails, LapData, MarshalZone,
    PacketEventData, PacketMotionData, PacketSessionData, ParticipantData,
};
use crate::types::FieldSet;

pub fn car_motion(m: &CarMotionData) -> FieldSet {
    let mut f = FieldSet::with_capacity(18);
    f.insert("worldPositionX", m.world_position_x)
        .insert("worldPositionY", m.world_position_y)
        .insert("worldPositionZ", m.world_position_z)
        .insert("worldVelocityX", m.world_velocity_x)
        .insert("worldVelocityY", m.world_velocity_y)
        .insert("worldVelocityZ", m.world_velocity_z)
        .insert("worldForwardDirX", m.world_forward_dir_x)
        .insert("worldForwardDirY", m.world_forward_dir_y)
        .insert("worldForwardDirZ", m.world_forward_dir_z)
        .insert("worldRightDirX", m.world_right_dir_x)
        .insert("worldRightDirY", m.world_right_dir_y)
        .insert("worldRightDirZ", m.world_right_dir_z)
        .insert("gForceLateral", m.g_force_lateral)
        .insert("gForceLongitudinal", m.g_force_longitudinal)
        .insert("gForceVertical", m.g_force_vertical)
        .insert("yaw", m.yaw)
        .insert("pitch", m.pitch)
        .insert("roll", m.roll);
    f
}

/// Player car motion: local frame values plus expanded wheel arrays
pub fn player_motion(p: &PacketMotionData) -> FieldSet {
    let mut f = FieldSet::with_capacity(30);
    f.insert("localVelocityX", p.local_velocity_x)
        .insert("localVelocityY", p.local_velocity_y)
        .insert("localVelocityZ", p.local_velocity_z)
        .insert("angularVelocityX", p.angular_velocity_x)
        .insert("angularVelocityY", p.angular_velocity_y)
        .insert("angularVelocityZ", p.angular_velocity_z)
        .insert("angularAccelerationX", p.angular_acceleration_x)
        .insert("angularAccelerationY", p.angular_acceleration_y)
        .insert("angularAccelerationZ", p.angular_acceleration_z)
        .insert("frontWheelsAngle", p.front_wheels_angle)
        .insert_wheels("suspensionPosition", p.suspension_position)
        .insert_wheels("suspensionVelocity", p.suspension_velocity)
        .insert_wheels("suspensionAcceleration", p.suspension_acceleration)
        .insert_wheels("wheelSpeed", p.wheel_speed)
        .insert_wheels("wheelSlip", p.wheel_slip);
    f
}

pub fn car_setup(s: &CarSetupData) -> FieldSet {
    let mut f = FieldSet::with_capacity(20);
    f.insert("frontWing", s.front_wing)
        .insert("rearWing", s.rear_wing)
        .insert("onThrottle", s.on_throttle)
        .insert("offThrottle", s.off_throttle)
        .insert("frontCamber", s.front_camber)
        .insert("rearCamber", s.rear_camber)
        .insert("frontToe", s.front_toe)
        .insert("rearToe", s.rear_toe)
        .insert("frontSuspension", s.front_suspension)
        .insert("rearSuspension", s.rear_suspension)
        .insert("frontAntiRollBar", s.front_anti_roll_bar)
        .insert("rearAntiRollBar", s.rear_anti_roll_bar)
        .insert("frontSuspensionHeight", s.front_suspension_height)
        .insert("rearSuspensionHeight", s.rear_suspension_height)
        .insert("brakePressure", s.brake_pressure)
        .insert("brakeBias", s.brake_bias)
        .insert("frontTyrePressure", s.front_tyre_pressure)
        .insert("rearTyrePressure", s.rear_tyre_pressure)
        .insert("ballast", s.ballast)
        .insert("fuelLoad", s.fuel_load);
    f
}

pub fn car_telemetry(t: &CarTelemetryData) -> FieldSet {
    let mut f = FieldSet::with_capacity(30);
    f.insert("speed", t.speed)
        .insert("throttle", t.throttle)
        .insert("steer", t.steer)
        .insert("brake", t.brake)
        .insert("clutch", t.clutch)
        .insert("gear", t.gear)
        .insert("engineRPM", t.engine_rpm)
        .insert("drs", t.drs)
        .insert("revLightsPercent", t.rev_lights_percent)
        .insert("engineTemperature", t.engine_temperature)
        .insert_wheels("brakesTemperature", t.brakes_temperature)
        .insert_wheels("tyresSurfaceTemperature", t.tyres_surface_temperature)
        .insert_wheels("tyresInnerTemperature", t.tyres_inner_temperature)
        .insert_wheels("tyresPressure", t.tyres_pressure)
        .insert_wheels("surfaceType", t.surface_type);
    f
}

pub fn car_status(s: &CarStatusData) -> FieldSet {
    let mut f = FieldSet::with_capacity(33);
    f.insert("tractionControl", s.traction_control)
        .insert("antiLockBrakes", s.anti_lock_brakes)
        .insert("fuelMix", s.fuel_mix)
        .insert("frontBrakeBias", s.front_brake_bias)
        .insert("pitLimiterStatus", s.pit_limiter_status)
        .insert("fuelInTank", s.fuel_in_tank)
        .insert("fuelCapacity", s.fuel_capacity)
        .insert("fuelRemainingLaps", s.fuel_remaining_laps)
        .insert("maxRPM", s.max_rpm)
        .insert("idleRPM", s.idle_rpm)
        .insert("maxGears", s.max_gears)
        .insert("drsAllowed", s.drs_allowed)
        .insert("actualTyreCompound", s.actual_tyre_compound)
        .insert("tyreVisualCompound", s.tyre_visual_compound)
        .insert("frontLeftWingDamage", s.front_left_wing_damage)
        .insert("frontRightWingDamage", s.front_right_wing_damage)
        .insert("rearWingDamage", s.rear_wing_damage)
        .insert("engineDamage", s.engine_damage)
        .insert("gearBoxDamage", s.gear_box_damage)
        .insert("vehicleFiaFlags", s.vehicle_fia_flags)
        .insert("ersStoreEnergy", s.ers_store_energy)
        .insert("ersDeployMode", s.ers_deploy_mode)
        .insert("ersHarvestedThisLapMGUK", s.ers_harvested_this_lap_mguk)
        .insert("ersHarvestedThisLapMGUH", s.ers_harvested_this_lap_mguh)
        .insert("ersDeployedThisLap", s.ers_deployed_this_lap)
        .insert_wheels("tyresWear", s.tyres_wear)
        .insert_wheels("tyresDamage", s.tyres_damage);
    f
}

pub fn lap(l: &LapData) -> FieldSet {
    let mut f = FieldSet::with_capacity(17);
    f.insert("lastLapTime", l.last_lap_time)
        .insert("currentLapTime", l.current_lap_time)
        .insert("bestLapTime", l.best_lap_time)
        .insert("sector1Time", l.sector1_time)
        .insert("sector2Time", l.sector2_time)
        .insert("lapDistance", l.lap_distance)
        .insert("totalDistance", l.total_distance)
        .insert("safetyCarDelta", l.safety_car_delta)
        .insert("carPosition", l.car_position)
        .insert("currentLapNum", l.current_lap_num)
        .insert("pitStatus", l.pit_status)
        .insert("sector", l.sector)
        .insert("currentLapInvalid", l.current_lap_invalid)
        .insert("penalties", l.penalties)
        .insert("gridPosition", l.grid_position)
        .insert("driverStatus", l.driver_status)
        .insert("resultStatus", l.result_status);
    f
}

pub fn marshal_zone(z: &MarshalZone) -> FieldSet {
    let mut f = FieldSet::with_capacity(2);
    f.insert("zoneStart", z.zone_start).insert("zoneFlag", z.zone_flag);
    f
}

/// Session scalars; marshal zones are emitted as their own records
pub fn session(s: &PacketSessionData) -> FieldSet {
    let mut f = FieldSet::with_capacity(18);
    f.insert("weather", s.weather)
        .insert("trackTemperature", s.track_temperature)
        .insert("airTemperature", s.air_temperature)
        .insert("totalLaps", s.total_laps)
        .insert("trackLength", s.track_length)
        .insert("sessionType", s.session_type)
        .insert("trackId", s.track_id)
        .insert("formula", s.formula)
        .insert("sessionTimeLeft", s.session_time_left)
        .insert("sessionDuration", s.session_duration)
        .insert("pitSpeedLimit", s.pit_speed_limit)
        .insert("gamePaused", s.game_paused)
        .insert("isSpectating", s.is_spectating)
        .insert("spectatorCarIndex", s.spectator_car_index)
        .insert("sliProNativeSupport", s.sli_pro_native_support)
        .insert("numMarshalZones", s.num_marshal_zones)
        .insert("safetyCarStatus", s.safety_car_status)
        .insert("networkGame", s.network_game);
    f
}

pub fn event(e: &PacketEventData) -> FieldSet {
    let mut f = FieldSet::with_capacity(3);
    f.insert("eventStringCode", e.code());
    match e.details {
        EventDetails::FastestLap { vehicle_idx, lap_time } => {
            f.insert("vehicleIdx", vehicle_idx).insert("lapTime", lap_time);
        }
        EventDetails::Retirement { vehicle_idx }
        | EventDetails::TeamMateInPits { vehicle_idx }
        | EventDetails::RaceWinner { vehicle_idx } => {
            f.insert("vehicleIdx", vehicle_idx);
        }
        EventDetails::None => {}
    }
    f
}

pub fn participant(p: &ParticipantData, name: &str) -> FieldSet {
    let mut f = FieldSet::with_capacity(7);
    f.insert("aiControlled", p.ai_controlled)
        .insert("driverId", p.driver_id)
        .insert("teamId", p.team_id)
        .insert("raceNumber", p.race_number)
        .insert("nationality", p.nationality)
        .insert("name", name)
        .insert("yourTelemetry", p.your_telemetry);
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    #[test]
    fn telemetry_has_no_array_fields() {
        let t = CarTelemetryData { tyres_pressure: [1.0, 2.0, 3.0, 4.0], ..Default::default() };
        let f = car_telemetry(&t);

        for name in
            ["brakesTemperature", "tyresSurfaceTemperature", "tyresInnerTemperature", "tyresPressure", "surfaceType"]
        {
            assert!(!f.contains(name), "{} should be expanded", name);
            for suffix in ["RL", "RR", "FL", "FR"] {
                assert!(f.contains(&format!("{}_{}", name, suffix)));
            }
        }
        assert_eq!(f.get("tyresPressure_FL"), Some(&FieldValue::Float(3.0)));
        assert_eq!(f.len(), 10 + 5 * 4);
    }

    #[test]
    fn status_expands_wear_and_damage() {
        let s = CarStatusData { tyres_wear: [10, 20, 30, 40], tyres_damage: [1, 2, 3, 4], ..Default::default() };
        let f = car_status(&s);
        assert!(!f.contains("tyresWear"));
        assert!(!f.contains("tyresDamage"));
        assert_eq!(f.get("tyresWear_RL"), Some(&FieldValue::Int(10)));
        assert_eq!(f.get("tyresDamage_FR"), Some(&FieldValue::Int(4)));
    }

    #[test]
    fn event_fields_follow_details() {
        let header = crate::test_utils::header(crate::packet::PacketId::Event, 1);
        let e = PacketEventData {
            header,
            event_string_code: *b"RTMT",
            details: EventDetails::Retirement { vehicle_idx: 7 },
        };
        let f = event(&e);
        assert_eq!(f.get("eventStringCode").and_then(FieldValue::as_str), Some("RTMT"));
        assert_eq!(f.get("vehicleIdx"), Some(&FieldValue::Int(7)));
        assert!(!f.contains("lapTime"));
        assert!(!f.contains("header"));
    }
}
