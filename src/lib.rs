// Copyright 2025 bakri (tidynest@proton.me)
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

//! texpand
//!
//! A background text expansion daemon for Linux. It reads keystrokes from
//! every physical keyboard, and when the recently typed characters end in
//! a configured trigger it erases the trigger and pastes the replacement.
//!
//! # Features
//!
//! - **Longest match wins:** rules are kept sorted longest-trigger-first
//! - **Two trigger modes:** on space, or immediately after the last character
//! - **Date variables:** `{{today}}`-style placeholders with offsets and chaining
//! - **Cursor placement:** `$|$` in a replacement marks where the cursor lands
//! - **Live reload:** edits to the config directory apply within half a second
//! - **Safe config writes:** timestamped backups and atomic rewrites
//!
//! # Architecture
//!
//! - **`core`:** Rule set, key table, variable resolver, matching engine, conflicts
//! - **`input`:** evdev keyboards and the device multiplexer
//! - **`output`:** Action emitter, uinput keyboard, Wayland clipboard
//! - **`config`:** YAML loading, validation, defaults, migrations, backups
//! - **`daemon`:** The single-threaded event loop, reloads, signals
//!
//! # Examples
//!
//! ## Matching keystrokes
//!
//! ```
//! use std::sync::Arc;
//! use texpand::core::{DeviceId, KeyAction, KeyCode, KeyEvent, MatchingEngine, Rule, RuleSet, TriggerMode};
//!
//! let rules = RuleSet::new(
//!     TriggerMode::Immediate,
//!     vec![Rule::new("omw", "on my way", vec![])?],
//!     vec![],
//! );
//! let mut engine = MatchingEngine::new(Arc::new(rules));
//!
//! let kbd = DeviceId::new("/dev/input/event3");
//! let mut fired = None;
//! for code in [KeyCode::O, KeyCode::M, KeyCode::W] {
//!     fired = engine.handle_event(&KeyEvent::new(kbd.clone(), code, KeyAction::Down));
//! }
//! assert_eq!(fired.map(|e| e.replacement), Some("on my way".to_string()));
//! # Ok::<(), texpand::core::RuleError>(())
//! ```
//!
//! ## Running the daemon
//!
//! ```no_run
//! use texpand::config::default_config_dir;
//! use texpand::daemon::{run, DaemonOptions};
//!
//! let stats = run(DaemonOptions::new(default_config_dir()?))?;
//! println!("{} expansions", stats.expansions);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod daemon;
pub mod input;
pub mod output;

// Re-export commonly used types for convenience
pub use core::{Expansion, KeyCode, KeyEvent, MatchingEngine, Rule, RuleSet, TriggerMode};
