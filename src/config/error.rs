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

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::core::RuleError;

/// Errors that can occur while loading, writing or migrating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` points anywhere usable.
    #[error("Cannot determine configuration directory (set XDG_CONFIG_HOME or HOME)")]
    NoConfigDir,

    /// A configuration file exists but cannot be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A configuration file is not valid YAML for its schema.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A match entry cannot be turned into a rule.
    #[error("Invalid match in {path}: {source}")]
    InvalidRule {
        path: PathBuf,
        #[source]
        source: RuleError,
    },

    /// The document root is not a mapping, so keys cannot be edited.
    #[error("{0} is not a YAML mapping")]
    NotAMapping(PathBuf),

    /// Backup directory cannot be created or written to.
    #[error("Backup directory not writable: {0}")]
    BackupDirNotWritable(PathBuf),

    /// Failed to create backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),

    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),

    /// A schema migration step failed; earlier steps stay applied.
    #[error("Migration {version} ({name}) failed: {source}")]
    Migration {
        version: u32,
        name: &'static str,
        #[source]
        source: Box<ConfigError>,
    },

    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
