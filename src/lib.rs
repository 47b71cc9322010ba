//! Setu - serial bridge between an iRobot Roomba / Create 2 and MQTT
//!
//! This library provides the Open Interface codec, telemetry state
//! inference, odometry and the poll-loop session used by the `setu` daemon.
//!
//! ## Features
//!
//! - `mock`: Enable the scripted transport and in-memory publisher for
//!   hardware-free testing

pub mod bus;
pub mod config;
pub mod devices;
pub mod dispatch;
pub mod error;
pub mod odometry;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod status;
pub mod transport;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use session::Session;
