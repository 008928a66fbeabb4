//! Input module tests
//!
//! Contains test suites for the device multiplexer:
//! - Per-device ordering under concurrent feeds
//! - Failed and ended feeds
//! - Stop flag and closed queues

#[cfg(test)]
mod multiplexer_tests;
