//! Sensor packet table and request builder
//!
//! Each sensor packet id has a fixed response width (1 or 2 bytes, big-endian)
//! and signedness. This table is the single source of truth for both building
//! requests and slicing the concatenated response apart again.

use super::packet::Command;
use crate::error::{Error, Result};

// Packet ids used by the bridge
pub const PACKET_BUMPS_WHEEL_DROPS: u8 = 7;
pub const PACKET_CLIFF_LEFT: u8 = 9;
pub const PACKET_CLIFF_FRONT_LEFT: u8 = 10;
pub const PACKET_CLIFF_FRONT_RIGHT: u8 = 11;
pub const PACKET_CLIFF_RIGHT: u8 = 12;
pub const PACKET_ANGLE: u8 = 20;
pub const PACKET_BATTERY_CHARGE: u8 = 25;
pub const PACKET_BATTERY_CAPACITY: u8 = 26;
pub const PACKET_CHARGING_SOURCES: u8 = 34;
pub const PACKET_LEFT_ENCODER: u8 = 43;
pub const PACKET_RIGHT_ENCODER: u8 = 44;
pub const PACKET_LIGHT_BUMPER: u8 = 45;
pub const PACKET_LEFT_MOTOR_CURRENT: u8 = 54;
pub const PACKET_RIGHT_MOTOR_CURRENT: u8 = 55;
pub const PACKET_MAIN_BRUSH_CURRENT: u8 = 56;

/// Packets polled for status classification, in request order
pub const STATUS_SENSORS: [u8; 6] = [
    PACKET_CHARGING_SOURCES,
    PACKET_MAIN_BRUSH_CURRENT,
    PACKET_LEFT_MOTOR_CURRENT,
    PACKET_RIGHT_MOTOR_CURRENT,
    PACKET_BATTERY_CHARGE,
    PACKET_BATTERY_CAPACITY,
];

/// Packets polled for movement recording, in request order
pub const MOVEMENT_SENSORS: [u8; 9] = [
    PACKET_LEFT_ENCODER,
    PACKET_RIGHT_ENCODER,
    PACKET_ANGLE,
    PACKET_LIGHT_BUMPER,
    PACKET_CLIFF_LEFT,
    PACKET_CLIFF_FRONT_LEFT,
    PACKET_CLIFF_FRONT_RIGHT,
    PACKET_CLIFF_RIGHT,
    PACKET_BUMPS_WHEEL_DROPS,
];

/// Width and signedness of one sensor packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSpec {
    pub id: u8,
    pub name: &'static str,
    /// Response width in bytes (1 or 2)
    pub width: usize,
    /// Interpret as two's complement
    pub signed: bool,
}

const fn unsigned(id: u8, name: &'static str, width: usize) -> SensorSpec {
    SensorSpec {
        id,
        name,
        width,
        signed: false,
    }
}

const fn signed(id: u8, name: &'static str, width: usize) -> SensorSpec {
    SensorSpec {
        id,
        name,
        width,
        signed: true,
    }
}

/// Packet ids 7..=58, indexed by `id - 7`
static SENSOR_TABLE: [SensorSpec; 52] = [
    unsigned(7, "bumps_wheel_drops", 1),
    unsigned(8, "wall", 1),
    unsigned(9, "cliff_left", 1),
    unsigned(10, "cliff_front_left", 1),
    unsigned(11, "cliff_front_right", 1),
    unsigned(12, "cliff_right", 1),
    unsigned(13, "virtual_wall", 1),
    unsigned(14, "wheel_overcurrents", 1),
    unsigned(15, "dirt_detect", 1),
    unsigned(16, "unused_16", 1),
    unsigned(17, "ir_opcode", 1),
    unsigned(18, "buttons", 1),
    signed(19, "distance", 2),
    signed(20, "angle", 2),
    unsigned(21, "charging_state", 1),
    unsigned(22, "voltage", 2),
    signed(23, "current", 2),
    signed(24, "temperature", 1),
    unsigned(25, "battery_charge", 2),
    unsigned(26, "battery_capacity", 2),
    unsigned(27, "wall_signal", 2),
    unsigned(28, "cliff_left_signal", 2),
    unsigned(29, "cliff_front_left_signal", 2),
    unsigned(30, "cliff_front_right_signal", 2),
    unsigned(31, "cliff_right_signal", 2),
    unsigned(32, "unused_32", 1),
    unsigned(33, "unused_33", 2),
    unsigned(34, "charging_sources", 1),
    unsigned(35, "oi_mode", 1),
    unsigned(36, "song_number", 1),
    unsigned(37, "song_playing", 1),
    unsigned(38, "stream_packet_count", 1),
    signed(39, "requested_velocity", 2),
    signed(40, "requested_radius", 2),
    signed(41, "requested_right_velocity", 2),
    signed(42, "requested_left_velocity", 2),
    unsigned(43, "left_encoder", 2),
    unsigned(44, "right_encoder", 2),
    unsigned(45, "light_bumper", 1),
    unsigned(46, "light_bump_left", 2),
    unsigned(47, "light_bump_front_left", 2),
    unsigned(48, "light_bump_center_left", 2),
    unsigned(49, "light_bump_center_right", 2),
    unsigned(50, "light_bump_front_right", 2),
    unsigned(51, "light_bump_right", 2),
    unsigned(52, "ir_opcode_left", 1),
    unsigned(53, "ir_opcode_right", 1),
    signed(54, "left_motor_current", 2),
    signed(55, "right_motor_current", 2),
    signed(56, "main_brush_current", 2),
    signed(57, "side_brush_current", 2),
    unsigned(58, "stasis", 1),
];

const FIRST_PACKET_ID: u8 = 7;

/// Look up the width/signedness of a packet id
pub fn spec(id: u8) -> Result<&'static SensorSpec> {
    id.checked_sub(FIRST_PACKET_ID)
        .and_then(|idx| SENSOR_TABLE.get(idx as usize))
        .ok_or(Error::UnknownSensor(id))
}

/// Ordered list of packet ids for one request/response exchange
///
/// The same request must be handed to the decoder; the response carries no
/// ids or delimiters, so the order here is the only framing information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorRequest {
    ids: Vec<u8>,
    frame_len: usize,
}

impl SensorRequest {
    /// Build a request, rejecting empty lists and unknown ids
    pub fn new(ids: &[u8]) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::EmptyRequest);
        }
        let mut frame_len = 0;
        for &id in ids {
            frame_len += spec(id)?.width;
        }
        Ok(Self {
            ids: ids.to_vec(),
            frame_len,
        })
    }

    /// Requested ids in request order
    #[inline]
    pub fn ids(&self) -> &[u8] {
        &self.ids
    }

    /// Expected response length in bytes
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Query-list command asking for exactly these packets
    pub fn command(&self) -> Command {
        Command::SendSensors(self.ids.clone())
    }
}
