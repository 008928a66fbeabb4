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

//! src/core/types.rs
//!
//! Core type definitions for text expansion
//!
//! This module defines the fundamental types used throughout the daemon:
//! - `TriggerMode`: When the buffer is checked for triggers
//! - `VariableDef`: A dynamic value (e.g. a date) usable in replacements
//! - `Rule`: A trigger paired with its replacement template
//! - `RuleSet`: An immutable, longest-trigger-first snapshot of all rules
//! - `KeyEvent`: One key transition read from a physical keyboard
//!
//! Rules and rule sets are immutable once built. A configuration reload
//! produces a new `RuleSet` rather than mutating the active one, so the
//! sort invariant is established exactly once, in `RuleSet::new`.

use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;

use crate::core::keymap::KeyCode;

/// When the typing buffer is checked against the rule set
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Check only when space is pressed; the space is part of the correction
    #[default]
    Space,
    /// Check after every typed character
    Immediate,
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMode::Space => write!(f, "space"),
            TriggerMode::Immediate => write!(f, "immediate"),
        }
    }
}

/// Kind of dynamic variable
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VariableKind {
    /// Current date/time shifted by an offset, rendered through a format
    Date,
}

/// A variable definition, either global or local to one rule
///
/// # Example
/// ```
/// use texpand::core::VariableDef;
///
/// let today = VariableDef::date("today", "%Y-%m-%d", 0);
/// let tomorrow = VariableDef::date("tomorrow", "%Y-%m-%d", 86_400);
/// assert_eq!(today.name, "today");
/// assert_eq!(tomorrow.offset_seconds, 86_400);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariableDef {
    /// Name used in `{{name}}` references
    pub name: String,

    /// What kind of value this variable produces
    pub kind: VariableKind,

    /// Seconds added to "now" before formatting (may be negative)
    pub offset_seconds: i64,

    /// Format string; may contain date tokens and `{{name}}` references
    pub format: String,
}

impl VariableDef {
    /// Creates a date variable.
    pub fn date(name: &str, format: &str, offset_seconds: i64) -> Self {
        Self {
            name: name.to_string(),
            kind: VariableKind::Date,
            offset_seconds,
            format: format.to_string(),
        }
    }
}

/// Errors raised while building rules
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("Trigger must not be empty")]
    EmptyTrigger,
}

/// A trigger and the text it expands to
///
/// The character length of the trigger is cached because it drives both
/// the rule ordering and the number of erase keystrokes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rule {
    trigger: String,
    replacement: String,
    variables: Vec<VariableDef>,
    trigger_len: usize,
}

impl Rule {
    /// Creates a rule, rejecting empty triggers.
    pub fn new(trigger: &str, replacement: &str, variables: Vec<VariableDef>) -> Result<Self, RuleError> {
        if trigger.is_empty() {
            return Err(RuleError::EmptyTrigger);
        }

        Ok(Self {
            trigger: trigger.to_string(),
            replacement: replacement.to_string(),
            variables,
            trigger_len: trigger.chars().count(),
        })
    }

    /// The exact text that fires this rule
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Replacement template (may contain `{{name}}` and the cursor marker)
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Rule-local variables, in declaration order
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// Trigger length in characters
    pub fn trigger_len(&self) -> usize {
        self.trigger_len
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.trigger, self.replacement)
    }
}

/// Immutable snapshot of every active rule
///
/// Rules are kept sorted by descending trigger length (stable, so equal
/// lengths keep their declaration order). The first rule whose trigger is
/// a suffix of the buffer is therefore the longest match.
///
/// # Example
/// ```
/// use texpand::core::{Rule, RuleSet, TriggerMode};
///
/// let rules = RuleSet::new(
///     TriggerMode::Space,
///     vec![
///         Rule::new("btw", "by the way", vec![])?,
///         Rule::new("btwn", "between", vec![])?,
///     ],
///     vec![],
/// );
///
/// assert_eq!(rules.rules()[0].trigger(), "btwn");
/// assert_eq!(rules.find_match("xbtwn").map(|r| r.replacement()), Some("between"));
/// # Ok::<(), texpand::core::RuleError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    trigger_mode: TriggerMode,
    rules: Vec<Rule>,
    global_variables: Vec<VariableDef>,
    max_trigger_len: usize,
}

impl RuleSet {
    /// Builds a snapshot, sorting rules longest-trigger-first.
    pub fn new(trigger_mode: TriggerMode, mut rules: Vec<Rule>, global_variables: Vec<VariableDef>) -> Self {
        // sort_by is stable: ties keep declaration order
        rules.sort_by(|a, b| b.trigger_len.cmp(&a.trigger_len));
        let max_trigger_len = rules.first().map_or(0, Rule::trigger_len);

        Self {
            trigger_mode,
            rules,
            global_variables,
            max_trigger_len,
        }
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    /// Rules in match order (longest trigger first)
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Variables visible to every rule, resolved before rule-local ones
    pub fn global_variables(&self) -> &[VariableDef] {
        &self.global_variables
    }

    /// Length in characters of the longest trigger (0 when empty)
    pub fn max_trigger_len(&self) -> usize {
        self.max_trigger_len
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the longest rule whose trigger is a suffix of `buffer`.
    pub fn find_match(&self, buffer: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| buffer.ends_with(rule.trigger()))
    }
}

/// Key transition reported by a keyboard
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyAction {
    Up,
    Down,
    Repeat,
}

impl KeyAction {
    /// Maps an evdev key event value (0 release, 1 press, 2 autorepeat).
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyAction::Up),
            1 => Some(KeyAction::Down),
            2 => Some(KeyAction::Repeat),
            _ => None,
        }
    }
}

/// Identifies the keyboard an event came from (its device node path)
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single key transition from one physical keyboard
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyEvent {
    /// Keyboard that produced the event
    pub source: DeviceId,

    /// Physical key
    pub code: KeyCode,

    /// Press, release or autorepeat
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn new(source: DeviceId, code: KeyCode, action: KeyAction) -> Self {
        Self { source, code, action }
    }
}
