//! Poll-loop session
//!
//! One [`Session`] owns everything that touches the serial link: the device
//! handle, the odometry baseline and the movement log. The bus thread only
//! reaches it through the command queue.
//!
//! Each [`Session::cycle`] walks the same states:
//!
//! ```text
//! Idle -> Dispatching -> Polling -> Idle
//!                           |
//!                      no response
//!                           v
//!                        WakingUp -> Idle
//! ```
//!
//! A wake is attempted at most once per cycle. After `max_wake_attempts`
//! consecutive failed cycles the robot is reported as `error`, once per
//! outage; the next successful poll ends the outage.

use crate::bus::{CommandReceiver, Publisher};
use crate::config::AppConfig;
use crate::devices::create2::protocol::SensorFrame;
use crate::devices::create2::sensors::{
    SensorRequest, MOVEMENT_SENSORS, PACKET_LEFT_ENCODER, PACKET_RIGHT_ENCODER, STATUS_SENSORS,
};
use crate::devices::Create2;
use crate::dispatch::dispatch;
use crate::error::{Error, Result};
use crate::odometry::OdometryTracker;
use crate::recorder::{MovementLog, MovementSample};
use crate::status::StatusReport;
use crate::transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Where the session is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Polling,
    Dispatching,
    WakingUp,
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Status decoded and published
    Reported(StatusReport),
    /// Status or movement poll went unanswered and a wake was attempted.
    /// A status decoded earlier in the same cycle is still published.
    NoResponse {
        /// Consecutive failed cycles, this one included
        failures: u32,
    },
}

/// Session settings taken from the application config
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub status_topic: String,
    pub interval: Duration,
    pub max_wake_attempts: u32,
}

impl SessionOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            status_topic: config.mqtt.status_topic.clone(),
            interval: config.poll.interval(),
            max_wake_attempts: config.poll.max_wake_attempts.max(1),
        }
    }
}

/// Owned poll-loop state for one robot
pub struct Session<T: Transport, P: Publisher> {
    device: Create2<T>,
    publisher: P,
    commands: CommandReceiver,
    options: SessionOptions,
    state: SessionState,
    status_request: SensorRequest,
    movement_request: SensorRequest,
    odometry: OdometryTracker,
    movement_log: Option<MovementLog>,
    failures: u32,
    outage_reported: bool,
}

impl<T: Transport, P: Publisher> Session<T, P> {
    pub fn new(
        device: Create2<T>,
        publisher: P,
        commands: CommandReceiver,
        options: SessionOptions,
    ) -> Result<Self> {
        Ok(Self {
            device,
            publisher,
            commands,
            options,
            state: SessionState::Idle,
            status_request: SensorRequest::new(&STATUS_SENSORS)?,
            movement_request: SensorRequest::new(&MOVEMENT_SENSORS)?,
            odometry: OdometryTracker::new(),
            movement_log: None,
            failures: 0,
            outage_reported: false,
        })
    }

    /// Record a movement sample on every successful poll
    pub fn with_movement_log(mut self, log: MovementLog) -> Self {
        self.movement_log = Some(log);
        self
    }

    /// Open the link and put the robot under OI control
    pub fn connect(&mut self) -> Result<()> {
        self.state = SessionState::WakingUp;
        let result = self.device.wake();
        self.state = SessionState::Idle;
        result
    }

    /// Run one dispatch + poll cycle
    pub fn cycle(&mut self) -> CycleOutcome {
        self.state = SessionState::Dispatching;
        self.dispatch_pending();

        self.state = SessionState::Polling;
        let outcome = match self.poll() {
            Ok(report) => {
                if self.failures > 0 {
                    log::info!("Robot answering again after {} failed polls", self.failures);
                }
                self.failures = 0;
                self.outage_reported = false;
                CycleOutcome::Reported(report)
            }
            Err(e) => {
                if e.is_no_response() {
                    log::warn!("No response from robot: {}", e);
                } else {
                    log::warn!("Poll failed: {}", e);
                }
                self.recover();
                CycleOutcome::NoResponse {
                    failures: self.failures,
                }
            }
        };

        self.state = SessionState::Idle;
        outcome
    }

    /// Cycle until `running` clears, sleeping the poll interval in between
    pub fn run(&mut self, running: &AtomicBool) {
        if let Err(e) = self.connect() {
            log::warn!("Initial connect failed: {} (will retry)", e);
        }

        log::info!(
            "Polling every {:?}, reporting to {}",
            self.options.interval,
            self.options.status_topic
        );

        while running.load(Ordering::Relaxed) {
            self.cycle();
            thread::sleep(self.options.interval);
        }

        log::info!("Session stopped");
    }

    fn dispatch_pending(&mut self) {
        for name in self.commands.drain() {
            match dispatch(&name) {
                Ok(steps) => {
                    log::info!("Dispatching {:?} ({} steps)", name, steps.len());
                    if let Err(e) = self.device.run_sequence(&steps) {
                        log::warn!("Command {:?} failed: {}", name, e);
                    }
                }
                Err(e) => log::warn!("Dropping command: {}", e),
            }
        }
    }

    /// Status poll, publish, then the movement poll when recording
    fn poll(&mut self) -> Result<StatusReport> {
        let report = self.poll_status()?;
        self.publish(&report);
        if self.movement_log.is_some() {
            self.record_movement()?;
        }
        Ok(report)
    }

    fn poll_status(&mut self) -> Result<StatusReport> {
        let frame = query_answered(&mut self.device, &self.status_request)?;
        let report = StatusReport::from_frame(&frame);
        log::debug!("Status {:?} from {:?}", report, frame);
        Ok(report)
    }

    fn record_movement(&mut self) -> Result<()> {
        // Zero encoders from a silent device must never reach the tracker
        let frame = query_answered(&mut self.device, &self.movement_request)?;

        let left = frame.value(PACKET_LEFT_ENCODER) as u16;
        let right = frame.value(PACKET_RIGHT_ENCODER) as u16;
        let (delta, first) = self.odometry.update(left, right);
        if first {
            return Ok(());
        }

        let sample = MovementSample::from_frame(delta, &frame);
        if let Some(movement_log) = self.movement_log.as_mut() {
            if let Err(e) = movement_log.append(sample) {
                log::error!(
                    "Failed to write movement log {}: {}",
                    movement_log.path().display(),
                    e
                );
            }
        }
        Ok(())
    }

    fn recover(&mut self) {
        self.state = SessionState::WakingUp;
        self.failures += 1;

        match self.device.wake() {
            Ok(()) => log::info!("Wake sequence sent (attempt {})", self.failures),
            Err(e) => log::warn!("Wake attempt {} failed: {}", self.failures, e),
        }

        if self.failures >= self.options.max_wake_attempts && !self.outage_reported {
            let err = Error::DeviceUnresponsive {
                attempts: self.failures,
            };
            log::error!("{}", err);
            self.publish(&StatusReport::unresponsive());
            self.outage_reported = true;
        }
    }

    fn publish(&mut self, report: &StatusReport) {
        let payload = match report.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to encode status: {}", e);
                return;
            }
        };

        match self
            .publisher
            .publish(&self.options.status_topic, payload.as_bytes())
        {
            Ok(()) => log::debug!("Published {}", payload),
            Err(e) => log::error!("Failed to publish status: {}", e),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Consecutive failed cycles in the current outage
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn odometry(&self) -> &OdometryTracker {
        &self.odometry
    }

    pub fn movement_log(&self) -> Option<&MovementLog> {
        self.movement_log.as_ref()
    }
}

/// Query a packet set, treating an all-zero frame as no response
///
/// A silent device can leave a full frame of zeros behind, so the frame is
/// only trusted when at least one field is non-zero.
fn query_answered<T: Transport>(
    device: &mut Create2<T>,
    request: &SensorRequest,
) -> Result<SensorFrame> {
    let frame = device.query(request)?;
    if frame.is_all_zero() {
        return Err(Error::FrameLengthMismatch {
            expected: request.frame_len(),
            actual: 0,
        });
    }
    Ok(frame)
}
