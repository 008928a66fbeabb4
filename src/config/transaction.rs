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

//! Backed-up atomic rewrites of configuration files
//!
//! Every file `texpand` rewrites goes through a [`ConfigTransaction`]:
//!
//! 1. `begin()` copies the current file into `<config>/backups/` with a
//!    timestamp suffix
//! 2. `commit()` writes the new content to a temp file and renames it over
//!    the original
//!
//! The configuration on disk is therefore never half-written, and the
//! pre-change version can always be recovered by hand.

use atomic_write_file::AtomicWriteFile;
use chrono::Local;
use log::debug;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::config::{ConfigError, BACKUP_DIR};

/// Directory of timestamped copies of configuration files
#[derive(Debug)]
pub struct BackupStore {
    backup_dir: PathBuf,
}

impl BackupStore {
    /// Opens (and creates if needed) `<config_dir>/backups`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BackupDirNotWritable` if the directory cannot
    /// be created or is read-only.
    pub fn new(config_dir: &Path) -> Result<Self, ConfigError> {
        let backup_dir = config_dir.join(BACKUP_DIR);

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        Ok(Self { backup_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copies `path` to `<backups>/<file name>.<YYYY-mm-dd_HHMMSS>`.
    pub fn create_timestamped_backup(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        let content = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
        let original_name = path
            .file_name()
            .ok_or_else(|| ConfigError::BackupFailed(format!("{} has no file name", path.display())))?
            .to_string_lossy();

        let backup_path = self.backup_dir.join(format!("{}.{}", original_name, timestamp));
        fs::write(&backup_path, content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        debug!("Backed up {} to {}", path.display(), backup_path.display());
        Ok(backup_path)
    }
}

/// A pending rewrite of one file whose backup already exists
#[derive(Debug)]
pub struct ConfigTransaction {
    path: PathBuf,
    backup_path: PathBuf,
}

impl ConfigTransaction {
    /// Begins a rewrite of `path` by backing it up.
    ///
    /// Nothing is modified if the backup fails.
    pub fn begin(store: &BackupStore, path: &Path) -> Result<Self, ConfigError> {
        let backup_path = store.create_timestamped_backup(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            backup_path,
        })
    }

    /// Where the pre-change copy was written
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Atomically replaces the file with `new_content`.
    ///
    /// On failure the original file is untouched.
    pub fn commit(self, new_content: &str) -> Result<PathBuf, ConfigError> {
        write_atomic(&self.path, new_content)?;
        Ok(self.backup_path)
    }
}

/// Writes `content` to `path` via temp file + rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
    let mut file = AtomicWriteFile::options().open(path).map_err(|e| {
        ConfigError::WriteFailed(format!("Failed to open {} for atomic write: {}", path.display(), e))
    })?;

    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write {}: {}", path.display(), e)))?;

    file.commit()
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit {}: {}", path.display(), e)))?;

    Ok(())
}
