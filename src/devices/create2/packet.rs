//! Outbound command encoding
//!
//! Every command is one opcode byte followed by its parameter bytes:
//!
//! ```text
//! [OPCODE] [PARAM 0] [PARAM 1] ...
//! ```
//!
//! Multi-byte parameters are big-endian. Signed parameters are written as
//! `modulus + value` for negative values (65536 for 16-bit fields, 256 for
//! 8-bit fields) after checking them against the range the device documents
//! for that field.
//!
//! # Example
//!
//! ```
//! use setu::devices::create2::packet::{encode, Command};
//!
//! let pkt = encode(&Command::DriveDirect { right: -1, left: 500 })?;
//! assert_eq!(pkt.as_bytes(), &[145, 0xFF, 0xFF, 0x01, 0xF4]);
//! # Ok::<(), setu::Error>(())
//! ```

use super::opcode::{Opcode, PayloadShape};
use super::sensors;
use super::song::{Song, MAX_SONG_SLOT};
use crate::error::{Error, Result};

// Documented parameter ranges
const DRIVE_VELOCITY_MAX: i32 = 500;
const DRIVE_RADIUS_MAX: i32 = 2000;
const DRIVE_PWM_MAX: i32 = 255;
const BRUSH_PWM_MAX: i32 = 127;
const VACUUM_PWM_MAX: i32 = 127;
const BAUD_CODE_MAX: u8 = 11;

/// Radius value the device interprets as "drive straight"
const RADIUS_STRAIGHT: u16 = 0x8000;

/// Turning radius for the drive command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveRadius {
    /// Drive straight ahead (special value 0x8000)
    Straight,
    /// Spin in place clockwise (special value -1)
    TurnClockwise,
    /// Spin in place counter-clockwise (special value 1)
    TurnCounterClockwise,
    /// Arc with this radius in mm (-2000..=2000)
    Millimeters(i16),
}

/// Start time for one weekday of the cleaning schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleTime {
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
}

/// Typed Open Interface command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Stop,
    /// Baud rate code 0-11 (11 = 115200)
    Baud(u8),
    Safe,
    Full,
    Clean,
    Spot,
    Dock,
    Power,
    /// Cleaning schedule: day bitmask (bit 0 = Sunday) and a start time per day
    Schedule {
        days: u8,
        times: [ScheduleTime; 7],
    },
    /// Set the robot clock (day 0 = Sunday)
    Clock {
        day: u8,
        hour: u8,
        minute: u8,
    },
    /// Velocity in mm/s (-500..=500) along a turning radius
    Drive {
        velocity: i16,
        radius: DriveRadius,
    },
    /// Per-wheel velocity in mm/s (-500..=500)
    DriveDirect {
        right: i16,
        left: i16,
    },
    /// Per-wheel PWM (-255..=255)
    DrivePwm {
        right: i16,
        left: i16,
    },
    /// Cleaning motor on/off bits
    Motors(u8),
    /// Cleaning motor duty cycles: brushes -127..=127, vacuum 0..=127
    MotorsPwm {
        main_brush: i16,
        side_brush: i16,
        vacuum: i16,
    },
    /// LED bits, power LED colour and intensity
    Leds {
        bits: u8,
        color: u8,
        intensity: u8,
    },
    ScheduleLeds {
        weekdays: u8,
        bits: u8,
    },
    /// Raw segment bits for the 4 display digits, left to right
    ScheduleDisplay([u8; 4]),
    /// Printable ASCII (32-126) for the 4 display digits, left to right
    ScheduleDisplayAscii([u8; 4]),
    EmulateButtons(u8),
    StoreSong(Song),
    /// Play song slot 0-3
    PlaySong(u8),
    /// Request a single sensor packet
    SendSensor(u8),
    /// Request a list of sensor packets, answered in request order
    SendSensors(Vec<u8>),
    /// Start streaming a list of sensor packets every 15ms
    StreamSensors(Vec<u8>),
    /// Pause (false) or resume (true) the sensor stream
    ChangeStreamStatus(bool),
}

impl Command {
    /// Opcode this command is sent with
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Start => Opcode::Start,
            Command::Reset => Opcode::Reset,
            Command::Stop => Opcode::Stop,
            Command::Baud(_) => Opcode::Baud,
            Command::Safe => Opcode::Safe,
            Command::Full => Opcode::Full,
            Command::Clean => Opcode::Clean,
            Command::Spot => Opcode::Spot,
            Command::Dock => Opcode::Dock,
            Command::Power => Opcode::Power,
            Command::Schedule { .. } => Opcode::Schedule,
            Command::Clock { .. } => Opcode::Clock,
            Command::Drive { .. } => Opcode::Drive,
            Command::DriveDirect { .. } => Opcode::DriveDirect,
            Command::DrivePwm { .. } => Opcode::DrivePwm,
            Command::Motors(_) => Opcode::Motors,
            Command::MotorsPwm { .. } => Opcode::MotorsPwm,
            Command::Leds { .. } => Opcode::Leds,
            Command::ScheduleLeds { .. } => Opcode::ScheduleLeds,
            Command::ScheduleDisplay(_) => Opcode::ScheduleDisplay,
            Command::ScheduleDisplayAscii(_) => Opcode::ScheduleDisplayAscii,
            Command::EmulateButtons(_) => Opcode::EmulateButtons,
            Command::StoreSong(_) => Opcode::StoreSong,
            Command::PlaySong(_) => Opcode::PlaySong,
            Command::SendSensor(_) => Opcode::SendSensor,
            Command::SendSensors(_) => Opcode::SendSensors,
            Command::StreamSensors(_) => Opcode::StreamSensors,
            Command::ChangeStreamStatus(_) => Opcode::ChangeStreamStatus,
        }
    }

    /// Encode to wire bytes
    #[inline]
    pub fn encode(&self) -> Result<EncodedCommand> {
        encode(self)
    }
}

/// Complete outbound byte sequence: opcode followed by parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    bytes: Vec<u8>,
}

impl EncodedCommand {
    fn new(opcode: Opcode) -> Self {
        let capacity = match opcode.payload_shape() {
            PayloadShape::Fixed(n) => 1 + n,
            PayloadShape::Variable => 8,
        };
        let mut bytes = Vec::with_capacity(capacity);
        bytes.push(opcode.byte());
        Self { bytes }
    }

    /// Packet bytes for sending
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Leading opcode byte
    #[inline]
    pub fn opcode_byte(&self) -> u8 {
        self.bytes[0]
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    #[inline]
    fn push_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Push a signed 16-bit field, negative values as `65536 + value`
    fn push_signed_16(&mut self, field: &'static str, value: i32, min: i32, max: i32) -> Result<()> {
        check_range(field, value, min, max)?;
        let raw = if value < 0 { 0x1_0000 + value } else { value };
        self.push_u16(raw as u16);
        Ok(())
    }

    /// Push a signed 8-bit field, negative values as `256 + value`
    fn push_signed_8(&mut self, field: &'static str, value: i32, min: i32, max: i32) -> Result<()> {
        check_range(field, value, min, max)?;
        let raw = if value < 0 { 0x100 + value } else { value };
        self.push(raw as u8);
        Ok(())
    }
}

impl AsRef<[u8]> for EncodedCommand {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

fn check_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<()> {
    if value < min || value > max {
        return Err(Error::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_u8(field: &'static str, value: u8, max: u8) -> Result<()> {
    check_range(field, value as i32, 0, max as i32)
}

/// Encode a command into its opcode + parameter bytes
///
/// Pure transformation; parameters outside the documented ranges are rejected
/// with [`Error::OutOfRange`], empty sensor lists with [`Error::EmptyRequest`].
pub fn encode(command: &Command) -> Result<EncodedCommand> {
    let mut pkt = EncodedCommand::new(command.opcode());

    match command {
        Command::Start
        | Command::Reset
        | Command::Stop
        | Command::Safe
        | Command::Full
        | Command::Clean
        | Command::Spot
        | Command::Dock
        | Command::Power => {}

        Command::Baud(code) => {
            check_u8("baud code", *code, BAUD_CODE_MAX)?;
            pkt.push(*code);
        }

        Command::Schedule { days, times } => {
            check_u8("schedule days", *days, 0x7F)?;
            pkt.push(*days);
            for time in times {
                check_u8("schedule hour", time.hour, 23)?;
                check_u8("schedule minute", time.minute, 59)?;
                pkt.push(time.hour);
                pkt.push(time.minute);
            }
        }

        Command::Clock { day, hour, minute } => {
            check_u8("clock day", *day, 6)?;
            check_u8("clock hour", *hour, 23)?;
            check_u8("clock minute", *minute, 59)?;
            pkt.push(*day);
            pkt.push(*hour);
            pkt.push(*minute);
        }

        Command::Drive { velocity, radius } => {
            pkt.push_signed_16(
                "velocity",
                *velocity as i32,
                -DRIVE_VELOCITY_MAX,
                DRIVE_VELOCITY_MAX,
            )?;
            match radius {
                DriveRadius::Straight => pkt.push_u16(RADIUS_STRAIGHT),
                DriveRadius::TurnClockwise => pkt.push_signed_16("radius", -1, -1, -1)?,
                DriveRadius::TurnCounterClockwise => pkt.push_signed_16("radius", 1, 1, 1)?,
                DriveRadius::Millimeters(mm) => pkt.push_signed_16(
                    "radius",
                    *mm as i32,
                    -DRIVE_RADIUS_MAX,
                    DRIVE_RADIUS_MAX,
                )?,
            }
        }

        Command::DriveDirect { right, left } => {
            pkt.push_signed_16(
                "right velocity",
                *right as i32,
                -DRIVE_VELOCITY_MAX,
                DRIVE_VELOCITY_MAX,
            )?;
            pkt.push_signed_16(
                "left velocity",
                *left as i32,
                -DRIVE_VELOCITY_MAX,
                DRIVE_VELOCITY_MAX,
            )?;
        }

        Command::DrivePwm { right, left } => {
            pkt.push_signed_16("right pwm", *right as i32, -DRIVE_PWM_MAX, DRIVE_PWM_MAX)?;
            pkt.push_signed_16("left pwm", *left as i32, -DRIVE_PWM_MAX, DRIVE_PWM_MAX)?;
        }

        Command::Motors(bits) => pkt.push(*bits),

        Command::MotorsPwm {
            main_brush,
            side_brush,
            vacuum,
        } => {
            pkt.push_signed_8(
                "main brush pwm",
                *main_brush as i32,
                -BRUSH_PWM_MAX,
                BRUSH_PWM_MAX,
            )?;
            pkt.push_signed_8(
                "side brush pwm",
                *side_brush as i32,
                -BRUSH_PWM_MAX,
                BRUSH_PWM_MAX,
            )?;
            pkt.push_signed_8("vacuum pwm", *vacuum as i32, 0, VACUUM_PWM_MAX)?;
        }

        Command::Leds {
            bits,
            color,
            intensity,
        } => {
            pkt.push(*bits);
            pkt.push(*color);
            pkt.push(*intensity);
        }

        Command::ScheduleLeds { weekdays, bits } => {
            pkt.push(*weekdays);
            pkt.push(*bits);
        }

        Command::ScheduleDisplay(digits) => {
            for digit in digits {
                pkt.push(*digit);
            }
        }

        Command::ScheduleDisplayAscii(chars) => {
            for &ch in chars {
                check_range("display character", ch as i32, 32, 126)?;
                pkt.push(ch);
            }
        }

        Command::EmulateButtons(bits) => pkt.push(*bits),

        Command::StoreSong(song) => {
            for byte in song.payload() {
                pkt.push(byte);
            }
        }

        Command::PlaySong(slot) => {
            check_u8("song slot", *slot, MAX_SONG_SLOT)?;
            pkt.push(*slot);
        }

        Command::SendSensor(id) => {
            sensors::spec(*id)?;
            pkt.push(*id);
        }

        Command::SendSensors(ids) | Command::StreamSensors(ids) => {
            if ids.is_empty() {
                return Err(Error::EmptyRequest);
            }
            check_range("sensor count", ids.len() as i32, 1, u8::MAX as i32)?;
            pkt.push(ids.len() as u8);
            for &id in ids {
                sensors::spec(id)?;
                pkt.push(id);
            }
        }

        Command::ChangeStreamStatus(on) => pkt.push(u8::from(*on)),
    }

    if let PayloadShape::Fixed(n) = command.opcode().payload_shape() {
        debug_assert_eq!(pkt.as_bytes().len(), 1 + n);
    }

    Ok(pkt)
}
