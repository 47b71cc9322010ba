//! Serial transport implementation

use super::Transport;
use crate::error::{Error, Result};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Serial transport for the robot's mini-DIN UART
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    read_timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Describe a serial port without opening it
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (115200 unless changed with the baud opcode)
    /// * `read_timeout` - Upper bound on a single blocking read
    pub fn new(path: &str, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            path: path.to_string(),
            baud_rate,
            read_timeout,
            port: None,
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| Error::Other(format!("Serial port {} is not open", self.path)))
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open()?;

        log::info!("Opened serial port: {} at {} baud", self.path, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            log::debug!("Closed serial port: {}", self.path);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port_mut()?.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port_mut()?;
        port.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.port_mut()?.flush()?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.port_mut()?.clear(ClearBuffer::Input)?;
        Ok(())
    }
}
