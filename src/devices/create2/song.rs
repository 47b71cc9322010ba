//! Songs for the store-song / play-song opcodes
//!
//! The device holds 4 song slots of up to 16 notes each. A note is a MIDI tone
//! number (31-127, anything else plays as a rest) and a duration in 1/64ths
//! of a second.

use crate::error::{Error, Result};
use std::time::Duration;

/// Highest song slot number
pub const MAX_SONG_SLOT: u8 = 3;

/// Maximum notes per song slot
pub const MAX_SONG_NOTES: usize = 16;

/// One device duration unit (1/64 s) in microseconds
const DURATION_UNIT_US: u64 = 15_625;

/// A single (tone, duration) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// MIDI note number
    pub tone: u8,
    /// Length in 1/64ths of a second
    pub duration: u8,
}

impl Note {
    pub const fn new(tone: u8, duration: u8) -> Self {
        Self { tone, duration }
    }
}

/// Slot 0 melody played by the `locate` command (154/64 s)
pub const LOCATE_MELODY: [Note; 7] = [
    Note::new(64, 22),
    Note::new(67, 22),
    Note::new(70, 22),
    Note::new(73, 22),
    Note::new(70, 22),
    Note::new(67, 22),
    Note::new(64, 22),
];

/// A validated song bound to a device slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    slot: u8,
    notes: Vec<Note>,
}

impl Song {
    /// Create a song, validating the slot and note count
    pub fn new(slot: u8, notes: &[Note]) -> Result<Self> {
        if slot > MAX_SONG_SLOT {
            return Err(Error::OutOfRange {
                field: "song slot",
                value: slot as i32,
                min: 0,
                max: MAX_SONG_SLOT as i32,
            });
        }
        if notes.is_empty() || notes.len() > MAX_SONG_NOTES {
            return Err(Error::InvalidSong(format!(
                "note count {} outside 1..={}",
                notes.len(),
                MAX_SONG_NOTES
            )));
        }
        Ok(Self {
            slot,
            notes: notes.to_vec(),
        })
    }

    /// Parse a raw store-song payload: `[slot, count, tone, duration, ...]`
    ///
    /// The declared count must agree with the number of (tone, duration) pairs
    /// that follow it.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let [slot, count, pairs @ ..] = payload else {
            return Err(Error::InvalidSong(format!(
                "payload too short ({} bytes)",
                payload.len()
            )));
        };
        let count = *count as usize;
        if count == 0 || count > MAX_SONG_NOTES {
            return Err(Error::InvalidSong(format!(
                "declared note count {} outside 1..={}",
                count, MAX_SONG_NOTES
            )));
        }
        if pairs.len() != count * 2 {
            return Err(Error::InvalidSong(format!(
                "declared {} notes but payload carries {} bytes of note data",
                count,
                pairs.len()
            )));
        }
        let notes: Vec<Note> = pairs
            .chunks_exact(2)
            .map(|pair| Note::new(pair[0], pair[1]))
            .collect();
        Self::new(*slot, &notes)
    }

    /// The locate melody in slot 0
    pub fn locate() -> Self {
        Self {
            slot: 0,
            notes: LOCATE_MELODY.to_vec(),
        }
    }

    #[inline]
    pub fn slot(&self) -> u8 {
        self.slot
    }

    #[inline]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Sum of note durations in device units (1/64 s)
    pub fn duration_units(&self) -> u32 {
        self.notes.iter().map(|n| n.duration as u32).sum()
    }

    /// Wall-clock playing time
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.duration_units() as u64 * DURATION_UNIT_US)
    }

    /// Store-song parameter bytes (slot, count, interleaved notes)
    pub fn payload(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.notes.len() * 2);
        bytes.push(self.slot);
        bytes.push(self.notes.len() as u8);
        for note in &self.notes {
            bytes.push(note.tone);
            bytes.push(note.duration);
        }
        bytes
    }
}
