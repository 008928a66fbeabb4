//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Matching engine tests (modes, longest match, buffer handling, reloads)
//! - Variable resolution tests (date tokens, chaining, unknown references)
//! - Conflict detection tests
//! - Type tests (Rule, RuleSet ordering)
