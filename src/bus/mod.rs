//! Message bus: status publishing and command intake
//!
//! The bus client runs on its own thread. Incoming command names cross to the
//! poll loop through a [`command_queue`]; the client only ever holds the
//! sending half, the session holds the only receiver.

use crate::error::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

mod mqtt;
pub use mqtt::{MqttBus, MqttPublisher};

#[cfg(any(test, feature = "mock"))]
mod memory;
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryPublisher;

/// Outbound side of the bus
pub trait Publisher: Send {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()>;
}

/// Producer half of the command queue, held by the bus callback
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<String>,
}

impl CommandSender {
    /// Queue a command name; false once the session is gone
    pub fn push(&self, name: impl Into<String>) -> bool {
        self.tx.send(name.into()).is_ok()
    }
}

/// Consumer half of the command queue, held by the session
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<String>,
}

impl CommandReceiver {
    /// Take every queued command without blocking, oldest first
    pub fn drain(&self) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(name) => names.push(name),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create the command queue shared by the bus client and the session
pub fn command_queue() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (CommandSender { tx }, CommandReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drain_in_order() {
        let (tx, rx) = command_queue();
        assert!(rx.drain().is_empty());

        tx.push("start");
        tx.push("locate".to_string());
        assert_eq!(rx.drain(), vec!["start", "locate"]);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_push_from_other_thread() {
        let (tx, rx) = command_queue();
        let producer = thread::spawn(move || {
            for _ in 0..100 {
                tx.push("pause");
            }
        });
        producer.join().unwrap();
        assert_eq!(rx.drain().len(), 100);
    }

    #[test]
    fn test_push_after_receiver_dropped() {
        let (tx, rx) = command_queue();
        drop(rx);
        assert!(!tx.push("start"));
    }
}
