//! Open Interface opcode table
//!
//! Every outbound command starts with one opcode byte, followed by either a
//! fixed number of parameter bytes or a variable-length payload whose size is
//! carried inside the payload itself (song store, multi-sensor requests).

/// Shape of the parameter bytes that follow an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Exactly this many parameter bytes (0 for bare opcodes)
    Fixed(usize),
    /// Length derived from a count byte inside the payload
    Variable,
}

/// Open Interface opcodes understood by the Create 2 / Roomba 600 series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Start = 128,
    Reset = 7,
    Stop = 173,
    Baud = 129,
    Safe = 131,
    Full = 132,
    Clean = 135,
    Spot = 134,
    Dock = 143,
    Power = 133,
    Schedule = 167,
    Clock = 168,
    Drive = 137,
    DriveDirect = 145,
    DrivePwm = 146,
    Motors = 138,
    MotorsPwm = 144,
    Leds = 139,
    ScheduleLeds = 162,
    ScheduleDisplay = 163,
    ScheduleDisplayAscii = 164,
    EmulateButtons = 165,
    StoreSong = 140,
    PlaySong = 141,
    SendSensor = 142,
    SendSensors = 149,
    StreamSensors = 148,
    ChangeStreamStatus = 150,
}

impl Opcode {
    /// All opcodes, in the order the device documentation lists them
    pub const ALL: [Opcode; 28] = [
        Opcode::Start,
        Opcode::Reset,
        Opcode::Stop,
        Opcode::Baud,
        Opcode::Safe,
        Opcode::Full,
        Opcode::Clean,
        Opcode::Spot,
        Opcode::Dock,
        Opcode::Power,
        Opcode::Schedule,
        Opcode::Clock,
        Opcode::Drive,
        Opcode::DriveDirect,
        Opcode::DrivePwm,
        Opcode::Motors,
        Opcode::MotorsPwm,
        Opcode::Leds,
        Opcode::ScheduleLeds,
        Opcode::ScheduleDisplay,
        Opcode::ScheduleDisplayAscii,
        Opcode::EmulateButtons,
        Opcode::StoreSong,
        Opcode::PlaySong,
        Opcode::SendSensor,
        Opcode::SendSensors,
        Opcode::StreamSensors,
        Opcode::ChangeStreamStatus,
    ];

    /// Opcode byte as sent on the wire
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Look up an opcode from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.byte() == byte)
    }

    /// Parameter layout following the opcode
    pub const fn payload_shape(self) -> PayloadShape {
        match self {
            Opcode::Start
            | Opcode::Reset
            | Opcode::Stop
            | Opcode::Safe
            | Opcode::Full
            | Opcode::Clean
            | Opcode::Spot
            | Opcode::Dock
            | Opcode::Power => PayloadShape::Fixed(0),
            Opcode::Baud
            | Opcode::Motors
            | Opcode::EmulateButtons
            | Opcode::PlaySong
            | Opcode::SendSensor
            | Opcode::ChangeStreamStatus => PayloadShape::Fixed(1),
            Opcode::ScheduleLeds => PayloadShape::Fixed(2),
            Opcode::Clock | Opcode::MotorsPwm | Opcode::Leds => PayloadShape::Fixed(3),
            Opcode::Drive
            | Opcode::DriveDirect
            | Opcode::DrivePwm
            | Opcode::ScheduleDisplay
            | Opcode::ScheduleDisplayAscii => PayloadShape::Fixed(4),
            // days bitmask + (hour, minute) for each of the 7 days
            Opcode::Schedule => PayloadShape::Fixed(15),
            Opcode::StoreSong | Opcode::SendSensors | Opcode::StreamSensors => {
                PayloadShape::Variable
            }
        }
    }

    /// Human-readable name used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Start => "start",
            Opcode::Reset => "reset",
            Opcode::Stop => "stop",
            Opcode::Baud => "baud",
            Opcode::Safe => "safe",
            Opcode::Full => "full",
            Opcode::Clean => "clean",
            Opcode::Spot => "spot",
            Opcode::Dock => "dock",
            Opcode::Power => "power",
            Opcode::Schedule => "schedule",
            Opcode::Clock => "clock",
            Opcode::Drive => "drive",
            Opcode::DriveDirect => "drive_direct",
            Opcode::DrivePwm => "drive_pwm",
            Opcode::Motors => "motors",
            Opcode::MotorsPwm => "motors_pwm",
            Opcode::Leds => "leds",
            Opcode::ScheduleLeds => "schedule_leds",
            Opcode::ScheduleDisplay => "schedule_display",
            Opcode::ScheduleDisplayAscii => "schedule_display_ascii",
            Opcode::EmulateButtons => "emulate_buttons",
            Opcode::StoreSong => "store_song",
            Opcode::PlaySong => "play_song",
            Opcode::SendSensor => "send_sensor",
            Opcode::SendSensors => "send_sensors",
            Opcode::StreamSensors => "stream_sensors",
            Opcode::ChangeStreamStatus => "change_stream_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_opcode_bytes_unique() {
        let bytes: HashSet<u8> = Opcode::ALL.iter().map(|op| op.byte()).collect();
        assert_eq!(bytes.len(), Opcode::ALL.len());
    }

    #[test]
    fn test_from_byte() {
        assert_eq!(Opcode::from_byte(128), Some(Opcode::Start));
        assert_eq!(Opcode::from_byte(149), Some(Opcode::SendSensors));
        assert_eq!(Opcode::from_byte(0), None);
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op.byte()), Some(op));
        }
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(Opcode::Start.payload_shape(), PayloadShape::Fixed(0));
        assert_eq!(Opcode::Drive.payload_shape(), PayloadShape::Fixed(4));
        assert_eq!(Opcode::MotorsPwm.payload_shape(), PayloadShape::Fixed(3));
        assert_eq!(Opcode::Schedule.payload_shape(), PayloadShape::Fixed(15));
        assert_eq!(Opcode::StoreSong.payload_shape(), PayloadShape::Variable);
        assert_eq!(Opcode::SendSensors.payload_shape(), PayloadShape::Variable);
    }
}
