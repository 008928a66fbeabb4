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

//! Clipboard access
//!
//! `WaylandClipboard` shells out to `wl-paste`/`wl-copy` from
//! wl-clipboard. Clipboard failures are transient: the emitter reports
//! them but never lets them stop the daemon.

use log::debug;
use std::{
    io,
    process::{Command, ExitStatus, Stdio},
};
use thiserror::Error;

/// Errors raised by clipboard operations
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The helper program could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: io::Error,
    },

    /// The helper program ran but reported failure
    #[error("{command} exited with {status}")]
    Failed {
        command: &'static str,
        status: ExitStatus,
    },
}

/// Read/write access to the system clipboard
pub trait Clipboard {
    /// Returns the current text content, or `None` if there is no text that
    /// can be restored unchanged.
    fn read(&mut self) -> Result<Option<String>, ClipboardError>;

    /// Replaces the clipboard content with `text`.
    fn write(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Wayland clipboard via wl-clipboard
#[derive(Debug, Default)]
pub struct WaylandClipboard;

impl WaylandClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Clipboard for WaylandClipboard {
    fn read(&mut self) -> Result<Option<String>, ClipboardError> {
        let output = Command::new("wl-paste")
            .arg("--no-newline")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ClipboardError::Spawn {
                command: "wl-paste",
                source,
            })?;

        // wl-paste exits non-zero when nothing has been copied
        if !output.status.success() {
            return Ok(None);
        }

        Ok(restorable_text(output.stdout))
    }

    fn write(&mut self, text: &str) -> Result<(), ClipboardError> {
        let status = Command::new("wl-copy")
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|source| ClipboardError::Spawn {
                command: "wl-copy",
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Failed {
                command: "wl-copy",
                status,
            })
        }
    }
}

/// Clipboard bytes as text, or `None` when empty or not UTF-8.
/// Non-text content (images, binary selections) is never written back.
fn restorable_text(bytes: Vec<u8>) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("Clipboard holds {} non-UTF-8 bytes, skipping restore", e.as_bytes().len());
            None
        }
    }
}
