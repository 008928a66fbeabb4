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

//! src/core/conflict.rs
//!
//! Trigger conflict detection
//!
//! Two kinds of conflicts make a rule unreachable or ambiguous:
//! - **Duplicate**: the same trigger is declared more than once. The first
//!   declaration always wins, later ones never fire.
//! - **Shadowed** (immediate mode only): a shorter trigger occurs inside a
//!   longer one anywhere except at its end, e.g. `btw` inside `btwn`.
//!   Typing the longer trigger fires the shorter one first.
//!
//! Rules are indexed by trigger in a HashMap, so duplicate lookup is O(1).
//! Shadow detection compares every pair of distinct triggers, which is fine
//! for the few hundred triggers a user config holds.

use std::collections::HashMap;

use crate::core::types::{Rule, RuleSet, TriggerMode};

/// A detected trigger conflict
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Conflict {
    /// One trigger declared several times
    Duplicate {
        trigger: String,
        /// Replacements in declaration order (the first one wins)
        replacements: Vec<String>,
    },

    /// A trigger that can never fire because a shorter one fires first
    Shadowed {
        trigger: String,
        shadowed_by: String,
    },
}

impl Conflict {
    /// The trigger whose rule is affected
    pub fn trigger(&self) -> &str {
        match self {
            Conflict::Duplicate { trigger, .. } | Conflict::Shadowed { trigger, .. } => trigger,
        }
    }
}

/// Indexes rules by trigger and reports conflicts
pub struct ConflictDetector {
    mode: TriggerMode,
    /// Maps trigger to every rule declaring it
    rules: HashMap<String, Vec<Rule>>,
}

impl ConflictDetector {
    /// Creates an empty detector for the given trigger mode.
    pub fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            rules: HashMap::new(),
        }
    }

    /// Builds a detector holding every rule of a snapshot.
    pub fn from_rule_set(rule_set: &RuleSet) -> Self {
        let mut detector = Self::new(rule_set.trigger_mode());
        for rule in rule_set.rules() {
            detector.add_rule(rule.clone());
        }
        detector
    }

    /// Adds a rule to the index.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.entry(rule.trigger().to_string()).or_default().push(rule);
    }

    /// Returns true if `trigger` is declared more than once.
    pub fn has_duplicate(&self, trigger: &str) -> bool {
        self.rules.get(trigger).is_some_and(|rules| rules.len() > 1)
    }

    /// Total number of rules tracked
    pub fn total_rules(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Finds all conflicts, duplicates first, each group sorted by trigger.
    pub fn find_conflicts(&self) -> Vec<Conflict> {
        let mut duplicates: Vec<Conflict> = self
            .rules
            .iter()
            .filter(|(_, rules)| rules.len() > 1)
            .map(|(trigger, rules)| Conflict::Duplicate {
                trigger: trigger.clone(),
                replacements: rules.iter().map(|r| r.replacement().to_string()).collect(),
            })
            .collect();
        duplicates.sort_by(|a, b| a.trigger().cmp(b.trigger()));

        let mut conflicts = duplicates;
        if self.mode == TriggerMode::Immediate {
            conflicts.extend(self.find_shadowed());
        }
        conflicts
    }

    fn find_shadowed(&self) -> Vec<Conflict> {
        let mut triggers: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        triggers.sort_unstable();

        let mut shadowed = Vec::new();
        for long in &triggers {
            // The shortest shadowing trigger is the one reported
            let blocker = triggers
                .iter()
                .filter(|short| short.len() < long.len() && fires_inside(short, long))
                .min_by_key(|short| short.len());

            if let Some(short) = blocker {
                shadowed.push(Conflict::Shadowed {
                    trigger: long.to_string(),
                    shadowed_by: short.to_string(),
                });
            }
        }
        shadowed
    }
}

/// True if `short` occurs in `long` ending before the end of `long`
fn fires_inside(short: &str, long: &str) -> bool {
    long.match_indices(short)
        .any(|(index, _)| index + short.len() < long.len())
}
