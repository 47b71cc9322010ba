//! Odometry tracking across 16-bit wrapping wheel encoders

/// Encoder counter modulus (16-bit hardware counters)
const ENCODER_MODULUS: i64 = 0x1_0000;

/// Combined deltas above this are logged as suspicious
const MAX_REASONABLE_DELTA: i64 = 10_000;

/// Reconstructs combined wheel travel from raw encoder counts
///
/// The baseline is owned here and replaced on every update. Callers must
/// only feed encoder values from frames that passed the no-response check:
/// a pair of zero encoders alone cannot tell a silent device from a robot
/// parked with freshly reset counters.
#[derive(Debug, Default)]
pub struct OdometryTracker {
    /// Last read encoder values
    last_left_encoder: Option<u16>,
    last_right_encoder: Option<u16>,

    /// Sum of every delta since creation or reset
    total: i64,
}

impl OdometryTracker {
    /// Create a tracker with no baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with new encoder readings
    ///
    /// Returns the combined (left + right) tick delta since the previous call
    /// and whether this was the first sample. The first sample only sets the
    /// baseline and reports a zero delta.
    pub fn update(&mut self, raw_left: u16, raw_right: u16) -> (i64, bool) {
        let (last_left, last_right) = match (self.last_left_encoder, self.last_right_encoder) {
            (Some(left), Some(right)) => (left, right),
            _ => {
                self.last_left_encoder = Some(raw_left);
                self.last_right_encoder = Some(raw_right);
                log::debug!(
                    "OdometryTracker: Initial encoder readings - L={}, R={}",
                    raw_left,
                    raw_right
                );
                return (0, true);
            }
        };

        let left_delta = side_delta(last_left, raw_left);
        let right_delta = side_delta(last_right, raw_right);
        let delta = left_delta + right_delta;

        if delta.abs() > MAX_REASONABLE_DELTA {
            log::warn!(
                "OdometryTracker: Large encoder jump - ΔL={}, ΔR={} (missed polls or reversed wheels)",
                left_delta,
                right_delta
            );
        }

        self.last_left_encoder = Some(raw_left);
        self.last_right_encoder = Some(raw_right);
        self.total += delta;

        log::debug!(
            "OdometryTracker: L={}, R={}, ΔL={}, ΔR={}, total={}",
            raw_left,
            raw_right,
            left_delta,
            right_delta,
            self.total
        );

        (delta, false)
    }

    /// Combined ticks accumulated since creation or the last reset
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Whether a baseline has been observed
    pub fn has_baseline(&self) -> bool {
        self.last_left_encoder.is_some()
    }

    /// Forget the baseline and the accumulated total
    pub fn reset(&mut self) {
        self.last_left_encoder = None;
        self.last_right_encoder = None;
        self.total = 0;
    }
}

/// Delta for one wheel; a smaller reading than last time means the counter wrapped
fn side_delta(previous: u16, current: u16) -> i64 {
    let previous = previous as i64;
    let current = current as i64;
    if current < previous {
        current - (previous - ENCODER_MODULUS)
    } else {
        current - previous
    }
}
