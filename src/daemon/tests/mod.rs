//! Daemon module tests
//!
//! Contains end-to-end tests of the event loop:
//! - Key events through matching and emission
//! - Reload ordering relative to queued events
//! - Shutdown and queue closure
//! - Contained emission failures
//! - Reloads from the file watcher, including failed ones
