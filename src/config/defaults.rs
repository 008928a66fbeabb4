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

//! Bundled default configuration

use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::{transaction::write_atomic, ConfigError, APP_CONFIG_FILE, MATCH_DIR};

/// A file written by `texpand init`
#[derive(Clone, Copy, Debug)]
pub struct DefaultFile {
    /// Path relative to the configuration directory
    pub relative_path: &'static str,
    pub content: &'static str,
}

/// Files created by `init`, in creation order
pub const DEFAULT_FILES: &[DefaultFile] = &[
    DefaultFile {
        relative_path: APP_CONFIG_FILE,
        content: include_str!("defaults/config.yml"),
    },
    DefaultFile {
        relative_path: "match/base.yml",
        content: include_str!("defaults/base.yml"),
    },
];

/// What `init` did with one default file
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InitOutcome {
    Created(PathBuf),
    /// The file already existed and was left alone
    Skipped(PathBuf),
}

/// Creates `<dir>/match/` and writes every missing default file.
///
/// Existing files are never overwritten.
pub fn init_config(dir: &Path) -> Result<Vec<InitOutcome>, ConfigError> {
    fs::create_dir_all(dir.join(MATCH_DIR))?;

    let mut outcomes = Vec::with_capacity(DEFAULT_FILES.len());
    for file in DEFAULT_FILES {
        let path = dir.join(file.relative_path);
        if path.exists() {
            outcomes.push(InitOutcome::Skipped(path));
            continue;
        }

        write_atomic(&path, file.content)?;
        info!("Created {}", path.display());
        outcomes.push(InitOutcome::Created(path));
    }
    Ok(outcomes)
}
