//! Movement log recording.
//!
//! Each recorded poll becomes one [`MovementSample`]. The log is a
//! pretty-printed JSON array rewritten in full after every append, so the
//! file on disk is always a complete document that the replay can read
//! even if the daemon is killed mid-run.

use crate::devices::create2::protocol::SensorFrame;
use crate::devices::create2::sensors::{
    PACKET_ANGLE, PACKET_BUMPS_WHEEL_DROPS, PACKET_CLIFF_FRONT_LEFT, PACKET_CLIFF_FRONT_RIGHT,
    PACKET_CLIFF_LEFT, PACKET_CLIFF_RIGHT, PACKET_LIGHT_BUMPER,
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One recorded poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementSample {
    /// Combined encoder ticks since the previous sample
    pub encoder_delta: i64,
    /// Rotation since the previous sample, degrees (counter-clockwise positive)
    pub degrees_turned: i32,
    pub light_bumper: bool,
    /// Any of the four cliff sensors
    pub cliff: bool,
    pub bumper_wheel_drop: bool,
}

impl MovementSample {
    /// Build a sample from a decoded movement frame
    /// (see [`MOVEMENT_SENSORS`](crate::devices::create2::sensors::MOVEMENT_SENSORS))
    pub fn from_frame(encoder_delta: i64, frame: &SensorFrame) -> Self {
        let cliff = [
            PACKET_CLIFF_LEFT,
            PACKET_CLIFF_FRONT_LEFT,
            PACKET_CLIFF_FRONT_RIGHT,
            PACKET_CLIFF_RIGHT,
        ]
        .iter()
        .any(|&id| frame.flag(id));

        Self {
            encoder_delta,
            degrees_turned: frame.value(PACKET_ANGLE),
            light_bumper: frame.flag(PACKET_LIGHT_BUMPER),
            cliff,
            bumper_wheel_drop: frame.flag(PACKET_BUMPS_WHEEL_DROPS),
        }
    }
}

/// Movement log backed by a JSON file
#[derive(Debug)]
pub struct MovementLog {
    path: PathBuf,
    samples: Vec<MovementSample>,
}

impl MovementLog {
    /// Open a log, continuing any samples already on disk
    ///
    /// A missing file or a file that is not a valid sample array starts an
    /// empty log. Other I/O failures (permissions, a directory in the way)
    /// are returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let samples = read_samples(&path)?;
        log::info!(
            "Movement log {}: {} existing samples",
            path.display(),
            samples.len()
        );
        Ok(Self { path, samples })
    }

    /// Like [`load`](Self::load), but any failure starts an empty log
    ///
    /// Appends to the same path keep being attempted and logged, so recording
    /// resumes once the path becomes writable.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(log) => log,
            Err(e) => {
                log::error!(
                    "Cannot read movement log {}: {} (starting empty)",
                    path.display(),
                    e
                );
                Self {
                    path: path.to_path_buf(),
                    samples: Vec::new(),
                }
            }
        }
    }

    /// Append a sample and persist the whole log
    pub fn append(&mut self, sample: MovementSample) -> Result<()> {
        self.samples.push(sample);
        self.save()
    }

    /// Write the log to its file
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.samples)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn samples(&self) -> &[MovementSample] {
        &self.samples
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Read a sample array from disk with the missing/corrupt fallbacks
pub fn read_samples(path: &Path) -> Result<Vec<MovementSample>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str(&contents) {
        Ok(samples) => Ok(samples),
        Err(e) => {
            log::warn!(
                "Movement log {} is not a sample array ({}), starting empty",
                path.display(),
                e
            );
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::create2::protocol::decode;
    use crate::devices::create2::sensors::MOVEMENT_SENSORS;
    use tempfile::TempDir;

    fn sample(delta: i64) -> MovementSample {
        MovementSample {
            encoder_delta: delta,
            degrees_turned: -3,
            light_bumper: false,
            cliff: true,
            bumper_wheel_drop: false,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let log = MovementLog::load(temp_dir.path().join("movement.json")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("movement.json");
        fs::write(&path, "{ not json").unwrap();

        let log = MovementLog::load(&path).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_unreadable_path_propagates() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be read as a file
        assert!(MovementLog::load(temp_dir.path()).is_err());
    }

    #[test]
    fn test_load_or_empty_on_unreadable_path() {
        let temp_dir = TempDir::new().unwrap();
        let mut log = MovementLog::load_or_empty(temp_dir.path());
        assert!(log.is_empty());
        assert_eq!(log.path(), temp_dir.path());

        // Writing over a directory still fails, without panicking
        assert!(log.append(sample(5)).is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_load_or_empty_keeps_existing_samples() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("movement.json");
        MovementLog::load(&path).unwrap().append(sample(7)).unwrap();

        let log = MovementLog::load_or_empty(&path);
        assert_eq!(log.samples(), &[sample(7)]);
    }

    #[test]
    fn test_append_persists_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("movement.json");

        let mut log = MovementLog::load(&path).unwrap();
        log.append(sample(40)).unwrap();
        log.append(sample(-12)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"encoder_delta\": 40"));
        assert!(contents.contains("\"bumper_wheel_drop\": false"));

        let reloaded = MovementLog::load(&path).unwrap();
        assert_eq!(reloaded.samples(), &[sample(40), sample(-12)]);
    }

    #[test]
    fn test_sample_from_frame() {
        let raw = [
            0x00, 0x64, // left encoder
            0x00, 0x64, // right encoder
            0xFF, 0xFB, // angle -5
            0x00, // light bumper
            0x00, 0x00, 0x01, 0x00, // cliffs, front right set
            0x02, // wheel drop left
        ];
        let frame = decode(&MOVEMENT_SENSORS, &raw).unwrap();
        let sample = MovementSample::from_frame(22, &frame);
        assert_eq!(
            sample,
            MovementSample {
                encoder_delta: 22,
                degrees_turned: -5,
                light_bumper: false,
                cliff: true,
                bumper_wheel_drop: true,
            }
        );
    }
}
