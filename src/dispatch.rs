//! Bus command names to Open Interface step sequences

use crate::devices::create2::constants::MODE_CHANGE_DELAY_MS;
use crate::devices::create2::packet::{Command, EncodedCommand};
use crate::devices::create2::song::Song;
use crate::error::{Error, Result};
use std::time::Duration;

/// Command names accepted from the bus
pub const COMMAND_NAMES: [&str; 5] = ["start", "pause", "return_to_base", "clean_spot", "locate"];

/// One encoded command and the wait before the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub command: EncodedCommand,
    pub delay_after: Duration,
}

impl Step {
    fn new(command: &Command, delay_after: Duration) -> Result<Self> {
        Ok(Self {
            command: command.encode()?,
            delay_after,
        })
    }

    fn immediate(command: &Command) -> Result<Self> {
        Self::new(command, Duration::ZERO)
    }
}

/// Build the step sequence for a bus command
///
/// | name             | steps                                                     |
/// |------------------|-----------------------------------------------------------|
/// | `start`          | START                                                     |
/// | `pause`          | SAFE, 50ms, START                                         |
/// | `return_to_base` | DOCK                                                      |
/// | `clean_spot`     | SPOT                                                      |
/// | `locate`         | SAFE, 50ms, STORE_SONG, 50ms, PLAY_SONG, song length, START |
///
/// Unknown names fail with [`Error::UnknownCommand`].
pub fn dispatch(name: &str) -> Result<Vec<Step>> {
    let mode_change = Duration::from_millis(MODE_CHANGE_DELAY_MS);

    match name {
        "start" => Ok(vec![Step::immediate(&Command::Start)?]),
        "pause" => Ok(vec![
            Step::new(&Command::Safe, mode_change)?,
            Step::immediate(&Command::Start)?,
        ]),
        "return_to_base" => Ok(vec![Step::immediate(&Command::Dock)?]),
        "clean_spot" => Ok(vec![Step::immediate(&Command::Spot)?]),
        "locate" => {
            let song = Song::locate();
            let playing = song.duration();
            let slot = song.slot();
            Ok(vec![
                Step::new(&Command::Safe, mode_change)?,
                Step::new(&Command::StoreSong(song), mode_change)?,
                Step::new(&Command::PlaySong(slot), playing)?,
                Step::immediate(&Command::Start)?,
            ])
        }
        other => Err(Error::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(steps: &[Step]) -> Vec<Vec<u8>> {
        steps.iter().map(|s| s.command.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_single_opcode_commands() {
        assert_eq!(bytes(&dispatch("start").unwrap()), vec![vec![128]]);
        assert_eq!(bytes(&dispatch("return_to_base").unwrap()), vec![vec![143]]);
        assert_eq!(bytes(&dispatch("clean_spot").unwrap()), vec![vec![134]]);
    }

    #[test]
    fn test_pause_toggles_safe_mode() {
        let steps = dispatch("pause").unwrap();
        assert_eq!(bytes(&steps), vec![vec![131], vec![128]]);
        assert_eq!(steps[0].delay_after, Duration::from_millis(50));
        assert_eq!(steps[1].delay_after, Duration::ZERO);
    }

    #[test]
    fn test_locate_sequence() {
        let steps = dispatch("locate").unwrap();
        let opcodes: Vec<u8> = steps.iter().map(|s| s.command.opcode_byte()).collect();
        assert_eq!(opcodes, vec![131, 140, 141, 128]);

        let store = steps[1].command.as_bytes();
        assert_eq!(&store[1..3], &[0, 7]);
        assert_eq!(steps[2].command.as_bytes(), &[141, 0]);
    }

    #[test]
    fn test_locate_waits_for_song() {
        let steps = dispatch("locate").unwrap();
        // 154 units of 1/64 s
        assert_eq!(steps[2].delay_after, Duration::from_micros(2_406_250));
        assert!(steps[2].delay_after >= Duration::from_secs_f64(154.0 / 64.0));
        let total: Duration = steps.iter().map(|s| s.delay_after).sum();
        assert_eq!(total, Duration::from_micros(2_406_250 + 100_000));
    }

    #[test]
    fn test_unknown_command() {
        let err = dispatch("dance").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(ref name) if name == "dance"));
        assert!(dispatch("").is_err());
        assert!(dispatch("START").is_err());
    }

    #[test]
    fn test_every_name_dispatches() {
        for name in COMMAND_NAMES {
            assert!(!dispatch(name).unwrap().is_empty(), "{}", name);
        }
    }
}
