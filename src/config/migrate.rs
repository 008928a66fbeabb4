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

//! Configuration schema migrations
//!
//! `config_version` in `config.yml` records which migrations have run.
//! Pending migrations run in version order, then the version is bumped
//! to [`LATEST_CONFIG_VERSION`]. Every rewritten file is backed up first.
//!
//! Files are round-tripped through `serde_yaml::Value`, so comments in
//! rewritten files are not preserved (the backups keep them).

use log::{debug, info};
use serde_yaml::{Mapping, Number, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::{
    load_app_config,
    loader::is_blank_document,
    match_files,
    transaction::{write_atomic, BackupStore, ConfigTransaction},
    ConfigError, APP_CONFIG_FILE,
};

/// Schema version written by this release
pub const LATEST_CONFIG_VERSION: u32 = 1;

/// Keys dropped by migration 1
const WORD_KEYS: [&str; 2] = ["word", "right_word"];

type MigrationFn = fn(&Path, &BackupStore) -> Result<Vec<PathBuf>, ConfigError>;

/// One schema migration step
struct Migration {
    version: u32,
    name: &'static str,
    run: MigrationFn,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "remove_word_fields",
    run: remove_word_fields,
}];

/// Outcome of [`migrate_config`]
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Names of the migrations that ran
    pub applied: Vec<&'static str>,
    /// Files rewritten by migrations
    pub migrated_files: Vec<PathBuf>,
}

impl MigrationReport {
    pub fn is_up_to_date(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Runs all pending migrations on a configuration directory.
///
/// # Errors
///
/// Stops at the first failing migration with `ConfigError::Migration`.
/// Migrations that already ran stay applied, but `config_version` is only
/// bumped once every step has succeeded, so a rerun retries them all.
pub fn migrate_config(dir: &Path) -> Result<MigrationReport, ConfigError> {
    let current = load_app_config(dir)?.config_version;
    let mut report = MigrationReport {
        from_version: current,
        to_version: current,
        ..MigrationReport::default()
    };

    if current >= LATEST_CONFIG_VERSION {
        info!("Configuration is up to date (version {})", current);
        return Ok(report);
    }

    let store = BackupStore::new(dir)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!("Running migration {} ({})", migration.version, migration.name);
        let files = (migration.run)(dir, &store).map_err(|e| ConfigError::Migration {
            version: migration.version,
            name: migration.name,
            source: Box::new(e),
        })?;
        report.migrated_files.extend(files);
        report.applied.push(migration.name);
    }

    set_config_version(dir, &store, LATEST_CONFIG_VERSION)?;
    report.to_version = LATEST_CONFIG_VERSION;
    Ok(report)
}

/// Sets `config_version` in `config.yml`, creating the file or key as needed.
///
/// An existing key is updated in place; a missing key is inserted first.
pub fn set_config_version(dir: &Path, store: &BackupStore, version: u32) -> Result<(), ConfigError> {
    let path = dir.join(APP_CONFIG_FILE);
    let minimal = format!("config_version: {}\n", version);

    let Some(mut root) = read_document(&path)? else {
        return write_atomic(&path, &minimal);
    };
    let Some(mapping) = root.as_mapping_mut() else {
        return Err(ConfigError::NotAMapping(path));
    };

    let version_value = Value::Number(Number::from(version));
    match mapping.get_mut("config_version") {
        Some(existing) => *existing = version_value,
        None => {
            let mut updated = Mapping::new();
            updated.insert(Value::from("config_version"), version_value);
            for (key, value) in std::mem::take(mapping) {
                updated.insert(key, value);
            }
            *mapping = updated;
        }
    }

    ConfigTransaction::begin(store, &path)?.commit(&to_yaml(&root, &path)?)?;
    Ok(())
}

/// Migration 1: removes the obsolete `word` and `right_word` keys from
/// every match entry. Returns the files that changed.
fn remove_word_fields(dir: &Path, store: &BackupStore) -> Result<Vec<PathBuf>, ConfigError> {
    let mut migrated = Vec::new();

    for path in match_files(dir)? {
        let Some(mut root) = read_document(&path)? else {
            debug!("Skipping {} (empty)", path.display());
            continue;
        };

        let removed = remove_keys_from_matches(&mut root, &WORD_KEYS);
        if removed == 0 {
            debug!("Skipping {} (nothing to migrate)", path.display());
            continue;
        }

        let backup = ConfigTransaction::begin(store, &path)?.commit(&to_yaml(&root, &path)?)?;
        info!(
            "Migrated {} (removed {} word field(s), backup at {})",
            path.display(),
            removed,
            backup.display()
        );
        migrated.push(path);
    }
    Ok(migrated)
}

/// Removes `keys` from every mapping in the document's `matches` list.
///
/// Returns the number of key/value pairs removed. Documents without a
/// `matches` sequence are left alone.
pub fn remove_keys_from_matches(root: &mut Value, keys: &[&str]) -> usize {
    let Some(matches) = root
        .as_mapping_mut()
        .and_then(|m| m.get_mut("matches"))
        .and_then(Value::as_sequence_mut)
    else {
        return 0;
    };

    let mut removed = 0;
    for entry in matches.iter_mut().filter_map(Value::as_mapping_mut) {
        let mut kept = Mapping::new();
        for (key, value) in std::mem::take(entry) {
            if key.as_str().is_some_and(|k| keys.contains(&k)) {
                removed += 1;
            } else {
                kept.insert(key, value);
            }
        }
        *entry = kept;
    }
    removed
}

/// Reads a YAML document, returning `None` for a missing or blank file.
fn read_document(path: &Path) -> Result<Option<Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if is_blank_document(&content) {
        return Ok(None);
    }

    let value: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(if value.is_null() { None } else { Some(value) })
}

fn to_yaml(value: &Value, path: &Path) -> Result<String, ConfigError> {
    serde_yaml::to_string(value)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to serialize {}: {}", path.display(), e)))
}
