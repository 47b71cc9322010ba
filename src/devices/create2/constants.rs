//! Constants for the Create 2 Open Interface link

// Serial link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const SERIAL_READ_TIMEOUT_MS: u64 = 100;

// Timing
pub const WAKE_SETTLE_MS: u64 = 50; // After reopening the port and after START
pub const MODE_CHANGE_DELAY_MS: u64 = 50; // Between a mode switch and the next command
pub const RESPONSE_SETTLE_MS: u64 = 50; // Between a sensor request and reading the reply
