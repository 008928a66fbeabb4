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

//! src/core/engine.rs
//!
//! Trigger-detection automaton
//!
//! The `MatchingEngine` is a single-owner reducer over `TypingSession`:
//! each key event is applied in order, and at most one `Expansion` comes
//! out of each event. The engine performs no I/O. The caller must emit a
//! returned expansion before feeding the next event, which keeps two
//! corrections from ever interleaving.
//!
//! # Per-event transitions (first match wins)
//! 1. Shift keys update the shift state and stop.
//! 2. Anything other than a key press stops (releases, autorepeat).
//! 3. Navigation/control keys clear the buffer.
//! 4. Backspace removes the last buffered character.
//! 5. In `Space` mode, space scans the buffer and then clears it.
//! 6. Mapped keys append a character; in `Immediate` mode the buffer is
//!    scanned right after, and cleared only when a rule fires.

use chrono::{DateTime, Local, TimeZone};
use log::{debug, trace};
use std::{fmt, sync::Arc};

use crate::core::{
    keymap::{self, KeyCode},
    session::TypingSession,
    types::{KeyAction, KeyEvent, RuleSet, TriggerMode},
    variables,
};

/// A fired rule, ready for the action emitter
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Expansion {
    /// Trigger text that was matched (still on screen)
    pub trigger: String,

    /// Replacement with variables resolved (cursor marker still present)
    pub replacement: String,

    /// True when detected on a just-typed space, which must also be erased
    pub via_space: bool,
}

impl Expansion {
    /// Trigger length in characters
    pub fn trigger_chars(&self) -> usize {
        self.trigger.chars().count()
    }
}

/// Matches the live keystroke stream against the active rule set
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use texpand::core::{
///     DeviceId, KeyAction, KeyCode, KeyEvent, MatchingEngine, Rule, RuleSet, TriggerMode,
/// };
///
/// let rules = RuleSet::new(
///     TriggerMode::Immediate,
///     vec![Rule::new("omw", "on my way", vec![])?],
///     vec![],
/// );
/// let mut engine = MatchingEngine::new(Arc::new(rules));
/// let kbd = DeviceId::new("/dev/input/event3");
///
/// let mut fired = None;
/// for code in [KeyCode::O, KeyCode::M, KeyCode::W] {
///     fired = engine.handle_event(&KeyEvent::new(kbd.clone(), code, KeyAction::Down));
/// }
/// assert_eq!(fired.map(|e| e.replacement), Some("on my way".to_string()));
/// # Ok::<(), texpand::core::RuleError>(())
/// ```
#[derive(Debug)]
pub struct MatchingEngine {
    rules: Arc<RuleSet>,
    session: TypingSession,
}

impl MatchingEngine {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            session: TypingSession::new(),
        }
    }

    /// The active snapshot
    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    /// Swaps in a new snapshot, keeping the newest buffered characters
    /// that still fit under its longest trigger.
    pub fn replace_rules(&mut self, rules: Arc<RuleSet>) {
        self.session.truncate_to(rules.max_trigger_len());
        self.rules = rules;
    }

    /// Applies one event, resolving variables against the local clock.
    pub fn handle_event(&mut self, event: &KeyEvent) -> Option<Expansion> {
        self.handle_event_at(event, &Local::now())
    }

    /// Applies one event, resolving variables against `now`.
    pub fn handle_event_at<Tz>(&mut self, event: &KeyEvent, now: &DateTime<Tz>) -> Option<Expansion>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let code = event.code;

        if keymap::is_shift(code) {
            // Autorepeat of a held shift keeps it active
            self.session.set_shift(event.action != KeyAction::Up);
            return None;
        }

        if event.action != KeyAction::Down {
            return None;
        }

        if keymap::is_buffer_reset(code) {
            self.session.clear();
            return None;
        }

        if code == KeyCode::BACKSPACE {
            self.session.pop_char();
            return None;
        }

        let mode = self.rules.trigger_mode();

        if mode == TriggerMode::Space && code == KeyCode::SPACE {
            trace!("space pressed, buffer={:?}", self.session.buffer());
            let expansion = self.scan(true, now);
            self.session.clear();
            return expansion;
        }

        let ch = keymap::char_for(code, self.session.shift_active())?;
        self.session.push_char(ch, self.rules.max_trigger_len());

        if mode == TriggerMode::Immediate {
            trace!("key {:?}, buffer={:?}", ch, self.session.buffer());
            let expansion = self.scan(false, now);
            if expansion.is_some() {
                self.session.clear();
            }
            return expansion;
        }

        None
    }

    /// Longest-match scan of the current buffer
    fn scan<Tz>(&self, via_space: bool, now: &DateTime<Tz>) -> Option<Expansion>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let rule = self.rules.find_match(self.session.buffer())?;
        debug!("match: trigger={:?}", rule.trigger());

        Some(Expansion {
            trigger: rule.trigger().to_string(),
            replacement: variables::render_replacement(rule, self.rules.global_variables(), now),
            via_space,
        })
    }
}
