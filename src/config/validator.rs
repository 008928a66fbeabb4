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

//! Rule set validation
//!
//! Validation never rejects a configuration. Everything it finds is a
//! warning about rules that will not behave as the user expects:
//!
//! - **Duplicate triggers**: only the first declaration ever fires
//! - **Untypeable triggers**: contain characters the key table cannot
//!   produce, so the buffer can never hold them
//! - **Invalid variable names**: cannot be referenced as `{{name}}`
//!
//! Trigger conflicts (duplicates and, in immediate mode, shadowed
//! triggers) are also kept in the report so `texpand check` can fail on them.
//!
//! # Example
//! ```
//! use texpand::config::validate_rule_set;
//! use texpand::core::{Rule, RuleSet, TriggerMode};
//!
//! let rules = vec![
//!     Rule::new("btw", "by the way", vec![]).unwrap(),
//!     Rule::new("btw", "between", vec![]).unwrap(),
//! ];
//! let report = validate_rule_set(&RuleSet::new(TriggerMode::Space, rules, vec![]));
//! assert!(report.has_conflicts());
//! ```

use log::warn;
use regex::Regex;
use std::{fmt, sync::OnceLock};

use crate::core::{keymap, Conflict, ConflictDetector, RuleSet, VariableDef};

/// What kind of problem an issue describes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IssueKind {
    DuplicateTrigger,
    UntypeableTrigger,
    InvalidVariableName,
}

/// A single validation finding
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationIssue {
    /// Category of the finding
    pub kind: IssueKind,
    /// Trigger of the affected rule (empty for global variables)
    pub trigger: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trigger.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "'{}': {}", self.trigger, self.message)
        }
    }
}

/// Complete validation report for a rule set
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// All warnings, in the order they were found
    pub issues: Vec<ValidationIssue>,
    /// Trigger conflicts reported by the conflict detector
    pub conflicts: Vec<Conflict>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing was found
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.conflicts.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Number of issues of a given kind
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    fn add(&mut self, kind: IssueKind, trigger: &str, message: String) {
        self.issues.push(ValidationIssue {
            kind,
            trigger: trigger.to_string(),
            message,
        });
    }
}

#[allow(clippy::expect_used)]
fn variable_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]+$").expect("variable name pattern should be valid regex")
    })
}

/// True if `name` can be referenced as `{{name}}` in a template.
pub fn is_valid_variable_name(name: &str) -> bool {
    variable_name_pattern().is_match(name)
}

/// Checks a rule set for rules that can never fire or never resolve.
pub fn validate_rule_set(rule_set: &RuleSet) -> ValidationReport {
    let mut report = ValidationReport::new();

    report.conflicts = ConflictDetector::from_rule_set(rule_set).find_conflicts();
    for conflict in &report.conflicts {
        if let Conflict::Duplicate { trigger, replacements } = conflict {
            report.issues.push(ValidationIssue {
                kind: IssueKind::DuplicateTrigger,
                trigger: trigger.clone(),
                message: format!(
                    "declared {} times, only the first ('{}') will fire",
                    replacements.len(),
                    replacements.first().map(String::as_str).unwrap_or_default()
                ),
            });
        }
    }

    for rule in rule_set.rules() {
        let untypeable: String = rule.trigger().chars().filter(|&c| !keymap::can_type(c)).collect();
        if !untypeable.is_empty() {
            report.add(
                IssueKind::UntypeableTrigger,
                rule.trigger(),
                format!("contains characters that cannot be typed: {:?}", untypeable),
            );
        }
        check_variable_names(&mut report, rule.trigger(), rule.variables());
    }

    check_variable_names(&mut report, "", rule_set.global_variables());
    report
}

/// Validates a freshly loaded rule set and logs every finding.
pub fn log_validation(rule_set: &RuleSet) {
    let report = validate_rule_set(rule_set);
    for issue in &report.issues {
        warn!("{}", issue);
    }
    for conflict in &report.conflicts {
        if let Conflict::Shadowed { trigger, shadowed_by } = conflict {
            warn!("'{}' can never fire: '{}' fires first while typing it", trigger, shadowed_by);
        }
    }
}

fn check_variable_names(report: &mut ValidationReport, trigger: &str, variables: &[VariableDef]) {
    for var in variables {
        if !is_valid_variable_name(&var.name) {
            report.add(
                IssueKind::InvalidVariableName,
                trigger,
                format!(
                    "variable name '{}' can only use letters, digits, '_' and '-'",
                    var.name
                ),
            );
        }
    }
}
