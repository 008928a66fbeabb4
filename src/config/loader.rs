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

//! Configuration loader
//!
//! Reads `config.yml` and every match file under `match/` into an
//! immutable [`RuleSet`].
//!
//! ```yaml
//! # match/base.yml
//! global_vars:
//!   - name: today
//!     type: date
//!     params:
//!       format: "%Y-%m-%d"
//!
//! matches:
//!   - trigger: ":date"
//!     replace: "{{today}}"
//!   - triggers: ["btw", "BTW"]
//!     replace: "by the way"
//! ```

use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::config::{ConfigError, APP_CONFIG_FILE, MATCH_DIR};
use crate::core::{Rule, RuleSet, TriggerMode, VariableDef};

/// Application settings from `config.yml`
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Schema version, bumped by `migrate`
    pub config_version: u32,

    /// When triggers are checked
    pub trigger_mode: TriggerMode,
}

/// One match file as written on disk
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MatchFile {
    global_vars: Vec<RawVar>,
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    trigger: String,
    #[serde(default)]
    triggers: Vec<String>,
    #[serde(default)]
    replace: String,
    #[serde(default)]
    vars: Vec<RawVar>,
}

impl RawMatch {
    /// `triggers` wins over `trigger` when non-empty; blanks are dropped.
    fn trigger_list(&self) -> impl Iterator<Item = &str> {
        let triggers: &[String] = if self.triggers.is_empty() {
            std::slice::from_ref(&self.trigger)
        } else {
            &self.triggers
        };
        triggers.iter().map(String::as_str).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawVar {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    params: RawParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParams {
    format: String,
    offset: i64,
}

/// Converts a raw variable, skipping kinds the resolver does not know.
fn variable_def(raw: &RawVar, path: &Path) -> Option<VariableDef> {
    match raw.kind.as_str() {
        "date" => Some(VariableDef::date(&raw.name, &raw.params.format, raw.params.offset)),
        other => {
            warn!(
                "{}: variable '{}' has unsupported type '{}', ignoring it",
                path.display(),
                raw.name,
                other
            );
            None
        }
    }
}

/// True if the document holds nothing but blank lines and comments
pub(crate) fn is_blank_document(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

/// Reads and deserializes one YAML file. Blank documents yield `T::default()`.
pub(crate) fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if is_blank_document(&content) {
        return Ok(T::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads `config.yml`, returning defaults when it does not exist.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed (including an
/// unknown `trigger_mode`).
pub fn load_app_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = dir.join(APP_CONFIG_FILE);
    if !path.exists() {
        debug!("{} not found, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    read_yaml(&path)
}

/// Lists `match/*.yml` and `match/*.yaml`, sorted by file name.
///
/// A missing `match/` directory is treated as empty.
pub fn match_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let match_dir = dir.join(MATCH_DIR);
    let entries = match fs::read_dir(&match_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: match_dir,
                source,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_yaml_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// True for `.yml` and `.yaml` files
pub fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml" | "yaml")
    )
}

/// Loads the complete configuration into a sorted rule set.
///
/// Multi-trigger matches become one rule per trigger, in declaration
/// order. Global variables of all files are concatenated in file order.
///
/// # Errors
///
/// Any unreadable or malformed file fails the whole load; nothing is
/// partially returned.
pub fn load_rule_set(dir: &Path) -> Result<RuleSet, ConfigError> {
    let app = load_app_config(dir)?;
    let files = match_files(dir)?;

    let mut rules = Vec::new();
    let mut globals = Vec::new();

    for path in &files {
        let file: MatchFile = read_yaml(path)?;
        globals.extend(file.global_vars.iter().filter_map(|v| variable_def(v, path)));

        for raw in &file.matches {
            let vars: Vec<VariableDef> = raw.vars.iter().filter_map(|v| variable_def(v, path)).collect();
            for trigger in raw.trigger_list() {
                let rule = Rule::new(trigger, &raw.replace, vars.clone()).map_err(|source| {
                    ConfigError::InvalidRule {
                        path: path.clone(),
                        source,
                    }
                })?;
                rules.push(rule);
            }
        }
    }

    let rule_set = RuleSet::new(app.trigger_mode, rules, globals);
    info!(
        "Loaded {} rules from {} file(s) in {} (trigger mode: {})",
        rule_set.len(),
        files.len(),
        dir.display(),
        rule_set.trigger_mode()
    );
    Ok(rule_set)
}
