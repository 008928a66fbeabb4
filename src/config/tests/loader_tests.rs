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

use std::{fs, path::Path};
use tempfile::TempDir;

use crate::config::{load_app_config, load_rule_set, match_files, ConfigError};
use crate::core::{TriggerMode, VariableKind};

/// Helper: writes `content` to `<dir>/<relative>`, creating parents.
fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

// ============================================================================
// config.yml
// ============================================================================

#[test]
fn test_missing_app_config_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let config = load_app_config(temp_dir.path()).unwrap();

    assert_eq!(config.config_version, 0);
    assert_eq!(config.trigger_mode, TriggerMode::Space);
}

#[test]
fn test_app_config_fields() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "config.yml", "config_version: 1\ntrigger_mode: immediate\n");

    let config = load_app_config(temp_dir.path()).unwrap();

    assert_eq!(config.config_version, 1);
    assert_eq!(config.trigger_mode, TriggerMode::Immediate);
}

#[test]
fn test_unknown_trigger_mode_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "config.yml", "trigger_mode: sometimes\n");

    let result = load_app_config(temp_dir.path());

    assert!(matches!(result, Err(ConfigError::Parse { .. })), "got {:?}", result);
}

#[test]
fn test_comment_only_app_config_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "config.yml", "# nothing here yet\n\n");

    let config = load_app_config(temp_dir.path()).unwrap();
    assert_eq!(config.trigger_mode, TriggerMode::Space);
}

// ============================================================================
// Match files
// ============================================================================

#[test]
fn test_match_files_sorted_and_filtered() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "match/b.yml", "");
    write(temp_dir.path(), "match/a.yaml", "");
    write(temp_dir.path(), "match/notes.txt", "");
    write(temp_dir.path(), "match/c.yml.bak", "");

    let files = match_files(temp_dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();

    assert_eq!(names, ["a.yaml", "b.yml"]);
}

#[test]
fn test_missing_match_dir_loads_empty_rule_set() {
    let temp_dir = TempDir::new().unwrap();

    let rules = load_rule_set(temp_dir.path()).unwrap();

    assert!(rules.is_empty());
    assert_eq!(rules.max_trigger_len(), 0);
}

#[test]
fn test_multi_trigger_matches_are_flattened() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "match/base.yml",
        r#"
matches:
  - triggers: ["btw", "BTW", ""]
    replace: "by the way"
  - trigger: "ignored"
    triggers: ["used"]
    replace: "triggers win"
  - trigger: ""
    replace: "never"
"#,
    );

    let rules = load_rule_set(temp_dir.path()).unwrap();
    let triggers: Vec<&str> = rules.rules().iter().map(|r| r.trigger()).collect();

    assert_eq!(rules.len(), 3);
    // Longest first, ties keep declaration order
    assert_eq!(triggers, ["used", "btw", "BTW"]);
    assert_eq!(rules.find_match("xBTW").unwrap().replacement(), "by the way");
}

#[test]
fn test_rules_sorted_across_files() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "match/a.yml", "matches:\n  - trigger: btw\n    replace: by the way\n");
    write(temp_dir.path(), "match/b.yml", "matches:\n  - trigger: btwn\n    replace: between\n");

    let rules = load_rule_set(temp_dir.path()).unwrap();

    assert_eq!(rules.rules()[0].trigger(), "btwn");
    assert_eq!(rules.find_match("btwn").unwrap().replacement(), "between");
    assert_eq!(rules.max_trigger_len(), 4);
}

#[test]
fn test_variables_loaded() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "match/a.yml",
        r#"
global_vars:
  - name: today
    type: date
    params:
      format: "%Y-%m-%d"
matches:
  - trigger: ":later"
    replace: "{{later}}"
    vars:
      - name: later
        type: date
        params:
          format: "%H:%M"
          offset: 3600
      - name: who
        type: shell
        params:
          cmd: whoami
"#,
    );
    write(
        temp_dir.path(),
        "match/b.yml",
        "global_vars:\n  - name: year\n    type: date\n    params:\n      format: \"%Y\"\n",
    );

    let rules = load_rule_set(temp_dir.path()).unwrap();

    // Globals from every file, in file order
    let globals: Vec<&str> = rules.global_variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(globals, ["today", "year"]);

    // Unsupported variable types are dropped
    let rule = rules.find_match(":later").unwrap();
    assert_eq!(rule.variables().len(), 1);
    let later = &rule.variables()[0];
    assert_eq!(later.kind, VariableKind::Date);
    assert_eq!(later.offset_seconds, 3600);
    assert_eq!(later.format, "%H:%M");
}

#[test]
fn test_trigger_mode_applied_to_rule_set() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "config.yml", "trigger_mode: immediate\n");
    write(temp_dir.path(), "match/a.yml", "matches:\n  - trigger: omw\n    replace: on my way\n");

    let rules = load_rule_set(temp_dir.path()).unwrap();

    assert_eq!(rules.trigger_mode(), TriggerMode::Immediate);
}

#[test]
fn test_obsolete_word_fields_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "match/old.yml",
        "matches:\n  - trigger: ty\n    replace: thank you\n    word: true\n    right_word: false\n",
    );

    let rules = load_rule_set(temp_dir.path()).unwrap();
    assert_eq!(rules.len(), 1);
}

#[test]
fn test_empty_match_file_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "match/empty.yml", "# todo\n");
    write(temp_dir.path(), "match/real.yml", "matches:\n  - trigger: ty\n    replace: thank you\n");

    let rules = load_rule_set(temp_dir.path()).unwrap();
    assert_eq!(rules.len(), 1);
}

#[test]
fn test_malformed_file_fails_whole_load() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "match/a.yml", "matches:\n  - trigger: ty\n    replace: thank you\n");
    write(temp_dir.path(), "match/b.yml", "matches: [unclosed\n");

    let result = load_rule_set(temp_dir.path());

    match result {
        Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with("b.yml")),
        other => panic!("Expected Parse error, got: {:?}", other),
    }
}
