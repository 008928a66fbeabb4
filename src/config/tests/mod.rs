//! Configuration module tests
//!
//! Contains test suites for:
//! - Loading config.yml and match files into a rule set
//! - Rule set validation
//! - Backups and atomic rewrites
//! - Default initialisation and schema migration

#[cfg(test)]
mod loader_tests;
#[cfg(test)]
mod transaction_tests;
