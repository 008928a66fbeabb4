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

//! Recording fakes for the keyboard sink and clipboard

use std::io;

use crate::core::KeyCode;
use crate::output::{Clipboard, ClipboardError, KeyboardSink, OutputError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stroke {
    Hold(KeyCode),
    Release(KeyCode),
}

#[derive(Default)]
pub struct RecordingKeyboard {
    pub strokes: Vec<Stroke>,
    pub fail_on: Option<KeyCode>,
}

impl RecordingKeyboard {
    pub fn failing_on(key: KeyCode) -> Self {
        Self {
            strokes: Vec::new(),
            fail_on: Some(key),
        }
    }

    /// Keys that were pressed and released, in order
    pub fn pressed(&self) -> Vec<KeyCode> {
        self.strokes
            .iter()
            .filter_map(|s| match s {
                Stroke::Release(k) => Some(*k),
                Stroke::Hold(_) => None,
            })
            .collect()
    }

    pub fn count(&self, key: KeyCode) -> usize {
        self.pressed().iter().filter(|&&k| k == key).count()
    }
}

impl KeyboardSink for RecordingKeyboard {
    fn hold(&mut self, key: KeyCode) -> Result<(), OutputError> {
        if self.fail_on == Some(key) {
            return Err(OutputError::Emit {
                key,
                source: io::Error::other("device gone"),
            });
        }
        self.strokes.push(Stroke::Hold(key));
        Ok(())
    }

    fn release(&mut self, key: KeyCode) -> Result<(), OutputError> {
        self.strokes.push(Stroke::Release(key));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub content: Option<String>,
    pub writes: Vec<String>,
    pub fail_read: bool,
    pub fail_write: bool,
}

impl RecordingClipboard {
    pub fn holding(text: &str) -> Self {
        Self {
            content: Some(text.to_string()),
            ..Self::default()
        }
    }
}

impl Clipboard for RecordingClipboard {
    fn read(&mut self) -> Result<Option<String>, ClipboardError> {
        if self.fail_read {
            return Err(ClipboardError::Spawn {
                command: "wl-paste",
                source: io::Error::new(io::ErrorKind::NotFound, "not installed"),
            });
        }
        Ok(self.content.clone())
    }

    fn write(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail_write {
            return Err(ClipboardError::Spawn {
                command: "wl-copy",
                source: io::Error::new(io::ErrorKind::NotFound, "not installed"),
            });
        }
        self.writes.push(text.to_string());
        self.content = Some(text.to_string());
        Ok(())
    }
}
