//! In-memory publisher for tests

use super::Publisher;
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Publisher that keeps every message; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    messages: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All (topic, payload) pairs in publish order
    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().clone()
    }

    /// UTF-8 payloads published to one topic
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        self.messages
            .lock()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}
