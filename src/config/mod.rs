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

//! Configuration management
//!
//! The configuration directory (default `~/.config/texpand`) holds:
//!
//! ```text
//! config.yml        application settings (trigger_mode, config_version)
//! match/*.yml       match files, loaded in file-name order
//! backups/          timestamped copies written before any rewrite
//! ```
//!
//! Loading is read-only and all-or-nothing. The only writers are
//! `init` (creates missing defaults) and `migrate` (rewrites files through
//! a backed-up atomic transaction).
//!
//! # Example
//!
//! ```no_run
//! use texpand::config::{default_config_dir, load_rule_set};
//!
//! let dir = default_config_dir()?;
//! let rules = load_rule_set(&dir)?;
//! println!("{} rules loaded", rules.len());
//! # Ok::<(), texpand::config::ConfigError>(())
//! ```

pub mod defaults;
pub mod error;
pub mod loader;
pub mod migrate;
pub mod transaction;
pub mod validator;

pub use defaults::{init_config, InitOutcome, DEFAULT_FILES};
pub use error::ConfigError;
pub use loader::{is_yaml_file, load_app_config, load_rule_set, match_files, AppConfig};
pub use migrate::{migrate_config, MigrationReport, LATEST_CONFIG_VERSION};
pub use transaction::{BackupStore, ConfigTransaction};
pub use validator::{log_validation, validate_rule_set, IssueKind, ValidationIssue, ValidationReport};

use std::{env, path::PathBuf};

#[cfg(test)]
mod tests;

/// Application settings file name
pub const APP_CONFIG_FILE: &str = "config.yml";

/// Subdirectory holding match files
pub const MATCH_DIR: &str = "match";

/// Subdirectory holding backups
pub const BACKUP_DIR: &str = "backups";

/// Expands `~` and `$VARS` in a user-supplied path.
///
/// Unknown variables are left as written.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// `$XDG_CONFIG_HOME/texpand`, falling back to `~/.config/texpand`.
///
/// # Errors
///
/// `ConfigError::NoConfigDir` if neither variable yields a path.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("texpand"));
    }

    let expanded = shellexpand::tilde("~/.config/texpand");
    if expanded.starts_with('~') {
        return Err(ConfigError::NoConfigDir);
    }
    Ok(PathBuf::from(expanded.as_ref()))
}
