// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/mod.rs
//!
//! Core matching logic
//!
//! This module contains the data structures and algorithms that turn a
//! keystroke stream into expansions, including:
//! - Type definitions for rules, rule sets and key events
//! - The static key code → character table
//! - Variable resolution and template expansion
//! - The typing session and the matching engine
//! - Trigger conflict detection
//!
//! Nothing in here performs I/O, so the whole automaton can be tested
//! without an input device, a virtual keyboard or a clipboard.

pub mod conflict;
pub mod engine;
pub mod keymap;
pub mod session;
pub mod types;
pub mod variables;

pub use conflict::{Conflict, ConflictDetector};
pub use engine::{Expansion, MatchingEngine};
pub use keymap::KeyCode;
pub use session::TypingSession;
pub use types::*;
pub use variables::ResolvedVariables;

#[cfg(test)]
mod tests;
