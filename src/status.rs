//! Operating state inference and the outbound status payload

use crate::devices::create2::protocol::SensorFrame;
use crate::devices::create2::sensors::{
    PACKET_BATTERY_CAPACITY, PACKET_BATTERY_CHARGE, PACKET_CHARGING_SOURCES,
    PACKET_LEFT_MOTOR_CURRENT, PACKET_MAIN_BRUSH_CURRENT, PACKET_RIGHT_MOTOR_CURRENT,
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse robot operating state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotState {
    Docked,
    Cleaning,
    Idle,
    /// Device silent or disconnected
    Error,
}

impl RobotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotState::Docked => "docked",
            RobotState::Cleaning => "cleaning",
            RobotState::Idle => "idle",
            RobotState::Error => "error",
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the robot from charging, motor activity and battery readings
///
/// First match wins:
/// 1. every input is zero: `Error` with a 0.0 battery fraction
/// 2. charging > 0: `Docked`
/// 3. any activity value > 0: `Cleaning`
/// 4. `Idle`
///
/// The battery fraction is `charge / capacity` clamped to [0, 1], or 0.0
/// when the capacity is not positive.
pub fn classify(
    charging: i32,
    activity: &[i32],
    charge: i32,
    capacity: i32,
) -> (RobotState, f64) {
    let all_zero =
        charging == 0 && charge == 0 && capacity == 0 && activity.iter().all(|&a| a == 0);
    if all_zero {
        return (RobotState::Error, 0.0);
    }

    let fraction = battery_fraction(charge, capacity);

    let state = if charging > 0 {
        RobotState::Docked
    } else if activity.iter().any(|&a| a > 0) {
        RobotState::Cleaning
    } else {
        RobotState::Idle
    };

    (state, fraction)
}

fn battery_fraction(charge: i32, capacity: i32) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    (charge as f64 / capacity as f64).clamp(0.0, 1.0)
}

/// Classify a decoded status frame (see [`STATUS_SENSORS`](crate::devices::create2::sensors::STATUS_SENSORS))
pub fn classify_frame(frame: &SensorFrame) -> (RobotState, f64) {
    classify(
        frame.value(PACKET_CHARGING_SOURCES),
        &[
            frame.value(PACKET_MAIN_BRUSH_CURRENT),
            frame.value(PACKET_LEFT_MOTOR_CURRENT),
            frame.value(PACKET_RIGHT_MOTOR_CURRENT),
        ],
        frame.value(PACKET_BATTERY_CHARGE),
        frame.value(PACKET_BATTERY_CAPACITY),
    )
}

/// Status message published to the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: RobotState,
    /// Percent, one decimal place
    pub battery_level: f64,
}

impl StatusReport {
    pub fn new(state: RobotState, fraction: f64) -> Self {
        Self {
            state,
            battery_level: (fraction * 1000.0).round() / 10.0,
        }
    }

    /// Report for a device that stopped answering
    pub fn unresponsive() -> Self {
        Self::new(RobotState::Error, 0.0)
    }

    pub fn from_frame(frame: &SensorFrame) -> Self {
        let (state, fraction) = classify_frame(frame);
        Self::new(state, fraction)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
