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

//! src/core/session.rs
//!
//! Typing session state owned by the matching engine
//!
//! The buffer holds the most recently typed characters, never more than
//! the longest trigger in the active rule set. All lengths are counted in
//! characters, not bytes.

/// Buffered typing state for one consumer
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TypingSession {
    buffer: String,
    shift_active: bool,
}

impl TypingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recently typed characters (oldest first)
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Buffer length in characters
    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn shift_active(&self) -> bool {
        self.shift_active
    }

    pub fn set_shift(&mut self, active: bool) {
        self.shift_active = active;
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Removes the last character, if any.
    pub fn pop_char(&mut self) -> Option<char> {
        self.buffer.pop()
    }

    /// Appends `c`, then drops the oldest characters beyond `max_len`.
    pub fn push_char(&mut self, c: char, max_len: usize) {
        self.buffer.push(c);
        self.truncate_to(max_len);
    }

    /// Keeps only the newest `max_len` characters.
    pub fn truncate_to(&mut self, max_len: usize) {
        let count = self.len();
        if count <= max_len {
            return;
        }

        let cut = self
            .buffer
            .char_indices()
            .nth(count - max_len)
            .map_or(self.buffer.len(), |(index, _)| index);
        self.buffer.drain(..cut);
    }
}
