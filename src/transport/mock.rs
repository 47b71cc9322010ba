//! Mock transport for testing
//!
//! Behaves like a scripted device: bytes injected with [`MockTransport::inject_read`]
//! or produced by a responder closure (called on every write) are handed back
//! by `read`. Clones share state, so a test can keep one handle while the
//! session owns another.

use super::Transport;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

/// Mock transport for unit testing
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    writes: Vec<Vec<u8>>,
    responder: Option<Responder>,
    open: bool,
    open_count: u32,
    close_count: u32,
    failing_opens: u32,
}

impl MockTransport {
    /// Create a new mock transport (closed)
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                write_buffer: Vec::new(),
                writes: Vec::new(),
                responder: None,
                open: false,
                open_count: 0,
                close_count: 0,
                failing_opens: 0,
            })),
        }
    }

    /// Create a mock whose replies are computed from each write
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let transport = Self::new();
        transport.inner.lock().responder = Some(Box::new(responder));
        transport
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.lock().read_buffer.extend(data);
    }

    /// Get all written data, concatenated
    pub fn get_written(&self) -> Vec<u8> {
        self.inner.lock().write_buffer.clone()
    }

    /// Get each write call separately
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.lock().writes.clone()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        let mut inner = self.inner.lock();
        inner.write_buffer.clear();
        inner.writes.clear();
    }

    /// Make the next `count` calls to `open` fail
    pub fn fail_next_opens(&self, count: u32) {
        self.inner.lock().failing_opens = count;
    }

    /// Number of successful opens so far
    pub fn open_count(&self) -> u32 {
        self.inner.lock().open_count
    }

    /// Number of closes so far
    pub fn close_count(&self) -> u32 {
        self.inner.lock().close_count
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.failing_opens > 0 {
            inner.failing_opens -= 1;
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "mock port unavailable",
            )));
        }
        inner.open = true;
        inner.open_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.open = false;
        inner.close_count += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().open
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        let available = inner.read_buffer.len().min(buffer.len());

        for (slot, byte) in buffer
            .iter_mut()
            .zip(inner.read_buffer.drain(..available))
        {
            *slot = byte;
        }

        Ok(available)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "mock port closed",
            )));
        }
        inner.write_buffer.extend_from_slice(data);
        inner.writes.push(data.to_vec());
        if let Some(responder) = inner.responder.as_mut() {
            let reply = responder(data);
            inner.read_buffer.extend(reply);
        }
        Ok(data.len())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.inner.lock().read_buffer.clear();
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
