//! iRobot Create 2 / Roomba 600-series Open Interface driver.
//!
//! The device speaks a half-duplex byte protocol over a 115200 baud UART:
//! the host writes an opcode followed by its parameters, and for sensor
//! queries reads back a fixed-length frame whose layout is implied by the
//! requested packet ids. There are no checksums, no framing bytes and no
//! correlation ids, so [`Create2`] owns its transport and never pipelines
//! requests.
//!
//! # Modules
//! - [`opcode`]: opcode bytes and payload shapes
//! - [`packet`]: typed commands and their wire encoding
//! - [`sensors`]: packet id width table and query-list requests
//! - [`protocol`]: query-list response decoding
//! - [`song`]: song slots, notes and the locate melody

pub mod constants;
pub mod opcode;
pub mod packet;
pub mod protocol;
pub mod sensors;
pub mod song;

use crate::dispatch::Step;
use crate::error::Result;
use crate::transport::Transport;
use constants::WAKE_SETTLE_MS;
use packet::{Command, EncodedCommand};
use protocol::SensorFrame;
use sensors::SensorRequest;
use std::thread;
use std::time::Duration;

/// Handle to one robot over one transport
pub struct Create2<T: Transport> {
    transport: T,
    /// Wait between writing a sensor request and reading its reply
    settle: Duration,
}

impl<T: Transport> Create2<T> {
    /// Wrap an (open or closed) transport
    pub fn new(transport: T, settle: Duration) -> Self {
        Self { transport, settle }
    }

    /// Encode and send a single command
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let pkt = command.encode()?;
        log::trace!("Sending {}", command.opcode().name());
        self.send_encoded(&pkt)
    }

    /// Send already-encoded bytes
    pub fn send_encoded(&mut self, pkt: &EncodedCommand) -> Result<()> {
        log::trace!("TX {:02X?}", pkt.as_bytes());
        self.transport.write(pkt.as_bytes())?;
        self.transport.flush()
    }

    /// Request a set of sensor packets and decode the reply
    ///
    /// A short or silent reply fails with
    /// [`Error::FrameLengthMismatch`](crate::Error::FrameLengthMismatch).
    pub fn query(&mut self, request: &SensorRequest) -> Result<SensorFrame> {
        self.transport.clear_input()?;
        self.send(&request.command())?;
        thread::sleep(self.settle);

        let raw = self.transport.read_up_to(request.frame_len())?;
        log::trace!("RX {:02X?}", raw);
        request.decode(&raw)
    }

    /// Reconnect and put the device back under OI control
    ///
    /// Close, reopen, wait, START, wait. Safe to call repeatedly.
    pub fn wake(&mut self) -> Result<()> {
        let settle = Duration::from_millis(WAKE_SETTLE_MS);

        self.transport.close()?;
        self.transport.open()?;
        thread::sleep(settle);
        self.send(&Command::Start)?;
        thread::sleep(settle);
        Ok(())
    }

    /// Send each step in order, honouring its trailing delay
    ///
    /// Not interruptible once started.
    pub fn run_sequence(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            self.send_encoded(&step.command)?;
            if !step.delay_after.is_zero() {
                thread::sleep(step.delay_after);
            }
        }
        Ok(())
    }
}
