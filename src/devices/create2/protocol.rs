//! Sensor response decoding
//!
//! A query-list response is the concatenation of each requested packet's
//! big-endian value, in request order, with no ids or delimiters:
//!
//! ```text
//! request:  [149] [3] [34] [25] [26]
//! response: [charging(1)] [charge_hi charge_lo] [capacity_hi capacity_lo]
//! ```
//!
//! The decoder therefore needs the exact id list used for the request. It
//! never guesses: a frame whose length differs from the summed widths fails
//! with [`Error::FrameLengthMismatch`] and yields no partial values.

use super::sensors::{self, SensorRequest};
use crate::error::{Error, Result};

/// Decoded values from one sensor response, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorFrame {
    values: Vec<(u8, i32)>,
}

impl SensorFrame {
    /// Value of a packet id, if it was part of the request
    pub fn get(&self, id: u8) -> Option<i32> {
        self.values
            .iter()
            .find(|(packet, _)| *packet == id)
            .map(|(_, value)| *value)
    }

    /// Value of a packet id, 0 when absent
    #[inline]
    pub fn value(&self, id: u8) -> i32 {
        self.get(id).unwrap_or(0)
    }

    /// Boolean view of a packet (any non-zero value)
    #[inline]
    pub fn flag(&self, id: u8) -> bool {
        self.value(id) != 0
    }

    /// True when every field is zero, which is what a silent device
    /// looks like after zero-padding
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|(_, value)| *value == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, i32)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Slice a raw response into per-id values
///
/// # Arguments
/// * `ids` - Packet ids in the order they were requested
/// * `raw` - Bytes returned by the device for that request
pub fn decode(ids: &[u8], raw: &[u8]) -> Result<SensorFrame> {
    let mut specs = Vec::with_capacity(ids.len());
    let mut expected = 0;
    for &id in ids {
        let spec = sensors::spec(id)?;
        expected += spec.width;
        specs.push(spec);
    }

    if raw.len() != expected {
        return Err(Error::FrameLengthMismatch {
            expected,
            actual: raw.len(),
        });
    }

    let mut values = Vec::with_capacity(specs.len());
    let mut offset = 0;
    for spec in specs {
        let field = &raw[offset..offset + spec.width];
        let value = match (spec.width, spec.signed) {
            (1, false) => field[0] as i32,
            (1, true) => field[0] as i8 as i32,
            (_, false) => u16::from_be_bytes([field[0], field[1]]) as i32,
            (_, true) => i16::from_be_bytes([field[0], field[1]]) as i32,
        };
        values.push((spec.id, value));
        offset += spec.width;
    }

    log::trace!("Decoded sensor frame {:02X?} -> {:?}", raw, values);
    Ok(SensorFrame { values })
}

impl SensorRequest {
    /// Decode a response to this request
    #[inline]
    pub fn decode(&self, raw: &[u8]) -> Result<SensorFrame> {
        decode(self.ids(), raw)
    }
}
