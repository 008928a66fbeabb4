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

//! Action emitter
//!
//! Turns an `Expansion` into the corrective output sequence. Emission is
//! synchronous: `emit` returns only after the clipboard has been restored,
//! so the caller can rely on one correction finishing before the next
//! event is processed.
//!
//! # Settle delays
//! Synthesized events travel through the compositor asynchronously, so
//! short pauses separate the sub-steps. The exact values are tuning, but
//! the pauses around the clipboard write and the Ctrl chord must not be
//! zero on a real desktop.

use log::{debug, warn};
use std::{thread, time::Duration};

use crate::core::{Expansion, KeyCode};
use crate::output::{Clipboard, KeyboardSink, OutputError};

/// Marks where the cursor should land after the paste
pub const CURSOR_MARKER: &str = "$|$";

/// Concrete output for one expansion
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputPlan {
    /// Backspaces to send before pasting
    pub erase_count: usize,

    /// Text to paste (cursor marker removed)
    pub text: String,

    /// Characters that followed the cursor marker
    pub cursor_left: usize,

    /// Re-type the space that was erased along with the trigger
    pub retype_space: bool,
}

impl OutputPlan {
    /// Computes erase count, paste text and cursor movement.
    ///
    /// # Example
    /// ```
    /// use texpand::core::Expansion;
    /// use texpand::output::OutputPlan;
    ///
    /// let plan = OutputPlan::from_expansion(&Expansion {
    ///     trigger: "btwn".to_string(),
    ///     replacement: "between".to_string(),
    ///     via_space: true,
    /// });
    /// assert_eq!(plan.erase_count, 5);
    /// assert_eq!(plan.text, "between");
    /// ```
    pub fn from_expansion(expansion: &Expansion) -> Self {
        let (text, cursor_left) = split_cursor_marker(&expansion.replacement);

        Self {
            erase_count: expansion.trigger_chars() + usize::from(expansion.via_space),
            text,
            cursor_left,
            retype_space: expansion.via_space,
        }
    }
}

/// Removes the first cursor marker and counts the characters after it.
pub fn split_cursor_marker(text: &str) -> (String, usize) {
    match text.split_once(CURSOR_MARKER) {
        Some((before, after)) => (format!("{before}{after}"), after.chars().count()),
        None => (text.to_string(), 0),
    }
}

/// Pauses between output sub-steps
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Delays {
    /// Before the first backspace
    pub pre_erase: Duration,
    /// After each backspace or cursor move
    pub per_key: Duration,
    /// Between writing the clipboard and pasting
    pub after_clipboard_write: Duration,
    /// Around the Ctrl+V chord
    pub modifier: Duration,
    /// After the chord, so the application reads the clipboard in time
    pub after_paste: Duration,
    /// Before moving the cursor
    pub before_cursor: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            pre_erase: Duration::from_millis(30),
            per_key: Duration::from_millis(8),
            after_clipboard_write: Duration::from_millis(50),
            modifier: Duration::from_millis(10),
            after_paste: Duration::from_millis(300),
            before_cursor: Duration::from_millis(30),
        }
    }
}

impl Delays {
    /// No pauses at all (tests only; real desktops drop events)
    pub fn none() -> Self {
        Self {
            pre_erase: Duration::ZERO,
            per_key: Duration::ZERO,
            after_clipboard_write: Duration::ZERO,
            modifier: Duration::ZERO,
            after_paste: Duration::ZERO,
            before_cursor: Duration::ZERO,
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Delivers expansions through a keyboard sink and a clipboard
pub struct ActionEmitter<K, C> {
    keyboard: K,
    clipboard: C,
    delays: Delays,
}

impl<K: KeyboardSink, C: Clipboard> ActionEmitter<K, C> {
    pub fn new(keyboard: K, clipboard: C, delays: Delays) -> Self {
        Self {
            keyboard,
            clipboard,
            delays,
        }
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Erases the trigger and pastes the replacement.
    ///
    /// # Errors
    ///
    /// Fails if a key cannot be emitted or the replacement cannot be
    /// written to the clipboard. A failed clipboard save or restore is
    /// only logged.
    pub fn emit(&mut self, expansion: &Expansion) -> Result<OutputPlan, OutputError> {
        let plan = OutputPlan::from_expansion(expansion);
        debug!(
            "emitting: erase={} cursor_left={} retype_space={}",
            plan.erase_count, plan.cursor_left, plan.retype_space
        );

        pause(self.delays.pre_erase);
        for _ in 0..plan.erase_count {
            self.keyboard.press(KeyCode::BACKSPACE)?;
            pause(self.delays.per_key);
        }

        self.paste(&plan)?;

        Ok(plan)
    }

    /// save clipboard → write → Ctrl+V → space → cursor moves → restore
    fn paste(&mut self, plan: &OutputPlan) -> Result<(), OutputError> {
        let saved = match self.clipboard.read() {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read clipboard, it will not be restored: {}", e);
                None
            }
        };

        self.clipboard.write(&plan.text)?;
        pause(self.delays.after_clipboard_write);

        let pasted = self.paste_chord().and_then(|()| self.finish_paste(plan));

        // Restore even if the chord failed; the replacement is on the clipboard either way
        if let Some(saved) = saved {
            if let Err(e) = self.clipboard.write(&saved) {
                warn!("Could not restore clipboard: {}", e);
            }
        }

        pasted
    }

    fn paste_chord(&mut self) -> Result<(), OutputError> {
        self.keyboard.hold(KeyCode::LEFT_CTRL)?;
        pause(self.delays.modifier);
        let pressed = self.keyboard.press(KeyCode::V);
        pause(self.delays.modifier);
        // Never leave Ctrl stuck down
        let released = self.keyboard.release(KeyCode::LEFT_CTRL);
        pause(self.delays.after_paste);

        pressed.and(released)
    }

    /// The separator space goes after the whole replacement, so the cursor
    /// has to travel back over it as well.
    fn finish_paste(&mut self, plan: &OutputPlan) -> Result<(), OutputError> {
        if !plan.retype_space {
            return self.move_cursor_left(plan.cursor_left);
        }

        self.keyboard.press(KeyCode::SPACE)?;
        pause(self.delays.per_key);
        if plan.cursor_left == 0 {
            return Ok(());
        }
        self.move_cursor_left(plan.cursor_left + 1)
    }

    fn move_cursor_left(&mut self, count: usize) -> Result<(), OutputError> {
        if count == 0 {
            return Ok(());
        }

        pause(self.delays.before_cursor);
        for _ in 0..count {
            self.keyboard.press(KeyCode::LEFT)?;
            pause(self.delays.per_key);
        }
        Ok(())
    }
}
