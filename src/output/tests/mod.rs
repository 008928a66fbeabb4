//! Output module tests
//!
//! Contains test suites for the emission sequence:
//! - Erase counts and cursor markers
//! - Clipboard save/restore
//! - Modifier release on failure

#[cfg(test)]
mod emitter_tests;
