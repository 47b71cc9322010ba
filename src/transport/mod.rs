//! Transport layer for I/O abstraction
//!
//! The Open Interface is strictly half-duplex: one request, one response, no
//! correlation ids. A transport is therefore owned by exactly one session and
//! never shared between threads.

use crate::error::Result;

mod serial;
pub use serial::SerialTransport;

#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

/// Transport trait for device communication
pub trait Transport: Send {
    /// Open (or reopen) the link
    fn open(&mut self) -> Result<()>;

    /// Close the link; reading or writing afterwards fails until reopened
    fn close(&mut self) -> Result<()>;

    /// Whether the link is currently open
    fn is_open(&self) -> bool;

    /// Read data into buffer, returns number of bytes read (0 on timeout)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Discard unread input (stale bytes from an earlier exchange)
    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read up to `n` bytes, returning fewer if the read timeout expires first
    fn read_up_to(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut data = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self.read(&mut data[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        data.truncate(filled);
        Ok(data)
    }
}
