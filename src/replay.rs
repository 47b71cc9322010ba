//! Dead-reckoning replay of a recorded movement log

use crate::recorder::MovementSample;
use std::fmt;

/// Plot units per encoder tick used by the `replay` subcommand
pub const DEFAULT_SCALE: f64 = 20.0;

/// Sensor event seen at a trace point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    BumperDrop,
    Cliff,
    LightBumper,
}

impl Marker {
    /// Highest-priority event in a sample, if any
    pub fn for_sample(sample: &MovementSample) -> Option<Self> {
        if sample.bumper_wheel_drop {
            Some(Marker::BumperDrop)
        } else if sample.cliff {
            Some(Marker::Cliff)
        } else if sample.light_bumper {
            Some(Marker::LightBumper)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Marker::BumperDrop => "bumper/drop",
            Marker::Cliff => "cliff sensor",
            Marker::LightBumper => "light bumper",
        }
    }
}

/// Position after replaying one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub x: f64,
    pub y: f64,
    /// Degrees, 0 along +x, counter-clockwise positive
    pub heading: f64,
    pub marker: Option<Marker>,
}

impl fmt::Display for TracePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:10.1} {:10.1} {:8.1}", self.x, self.y, self.heading)?;
        if let Some(marker) = self.marker {
            write!(f, "  {}", marker.label())?;
        }
        Ok(())
    }
}

/// Replay samples from the origin facing +x
///
/// Each sample first turns by `degrees_turned`, then advances
/// `encoder_delta * scale` along the new heading.
pub fn trace(samples: &[MovementSample], scale: f64) -> Vec<TracePoint> {
    let mut x = 0.0;
    let mut y = 0.0;
    let mut heading = 0.0_f64;

    samples
        .iter()
        .map(|sample| {
            heading = (heading + sample.degrees_turned as f64).rem_euclid(360.0);
            let distance = sample.encoder_delta as f64 * scale;
            let radians = heading.to_radians();
            x += distance * radians.cos();
            y += distance * radians.sin();

            TracePoint {
                x,
                y,
                heading,
                marker: Marker::for_sample(sample),
            }
        })
        .collect()
}
