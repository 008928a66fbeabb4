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

use std::fs;
use tempfile::TempDir;

use crate::config::{
    transaction::write_atomic, BackupStore, ConfigError, ConfigTransaction, BACKUP_DIR,
};

// ============================================================================
// BackupStore Tests
// ============================================================================

#[test]
fn test_backup_dir_created() {
    let temp_dir = TempDir::new().unwrap();

    let store = BackupStore::new(temp_dir.path()).unwrap();

    assert_eq!(store.dir(), temp_dir.path().join(BACKUP_DIR));
    assert!(store.dir().is_dir(), "Backup dir should be created");
}

#[test]
fn test_create_timestamped_backup() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("base.yml");
    fs::write(&config_path, "matches: []\n").unwrap();
    let store = BackupStore::new(temp_dir.path()).unwrap();

    let backup_path = store.create_timestamped_backup(&config_path).unwrap();

    assert_eq!(backup_path.parent().unwrap(), store.dir());
    assert_eq!(fs::read_to_string(&backup_path).unwrap(), "matches: []\n");

    // "base.yml.2025-10-10_221500" -> name, ext, timestamp
    let filename = backup_path.file_name().unwrap().to_str().unwrap();
    let parts: Vec<&str> = filename.split('.').collect();
    assert_eq!(parts.len(), 3, "Filename should be name.ext.timestamp: {}", filename);
    assert_eq!(parts[0], "base");
    assert_eq!(parts[1], "yml");
    assert!(
        chrono::NaiveDateTime::parse_from_str(parts[2], "%Y-%m-%d_%H%M%S").is_ok(),
        "Timestamp should be valid chrono format: {}",
        parts[2]
    );
}

#[test]
fn test_backup_of_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let store = BackupStore::new(temp_dir.path()).unwrap();

    let result = store.create_timestamped_backup(&temp_dir.path().join("missing.yml"));

    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

// ============================================================================
// ConfigTransaction Tests
// ============================================================================

#[test]
fn test_transaction_basic_flow() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    let original_content = "# Original\ntrigger_mode: space\n";
    fs::write(&config_path, original_content).unwrap();
    let store = BackupStore::new(temp_dir.path()).unwrap();

    // Begin creates the backup before anything changes
    let tx = ConfigTransaction::begin(&store, &config_path).unwrap();
    assert!(tx.backup_path().exists());
    assert_eq!(fs::read_to_string(&config_path).unwrap(), original_content);

    let backup_path = tx.commit("trigger_mode: immediate\n").unwrap();

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "trigger_mode: immediate\n");
    assert_eq!(fs::read_to_string(&backup_path).unwrap(), original_content);
}

#[test]
fn test_write_atomic_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("new.yml");

    write_atomic(&path, "matches: []\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "matches: []\n");
}

#[test]
fn test_write_atomic_into_missing_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nope").join("new.yml");

    let result = write_atomic(&path, "x");

    assert!(matches!(result, Err(ConfigError::WriteFailed(_))));
    assert!(!path.exists());
}
