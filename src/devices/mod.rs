//! Device implementations

pub mod create2;

pub use create2::Create2;
