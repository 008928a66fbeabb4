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

//! Output side of an expansion
//!
//! An expansion is delivered to the focused application by synthesizing
//! keystrokes on a virtual keyboard and staging the replacement text on
//! the clipboard:
//!
//! 1. Erase the trigger (and the space, in space mode) with backspaces
//! 2. Save the clipboard, write the replacement, press Ctrl+V
//! 3. Move the cursor left if the replacement carried a cursor marker
//! 4. Restore the saved clipboard
//!
//! The keyboard and clipboard are traits so the sequence can be tested
//! with recording fakes and no window system.

pub mod clipboard;
pub mod emitter;
pub mod keyboard;

pub use clipboard::{Clipboard, ClipboardError, WaylandClipboard};
pub use emitter::{ActionEmitter, Delays, OutputPlan, CURSOR_MARKER};
pub use keyboard::{KeyboardSink, UinputKeyboard, VIRTUAL_DEVICE_NAME};

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use std::io;
use thiserror::Error;

use crate::core::KeyCode;

/// Errors raised while synthesizing output
#[derive(Debug, Error)]
pub enum OutputError {
    /// The uinput virtual keyboard could not be created
    #[error("Failed to create virtual keyboard: {0}")]
    DeviceCreation(#[source] io::Error),

    /// A key event could not be written to the virtual keyboard
    #[error("Failed to emit {key}: {source}")]
    Emit {
        key: KeyCode,
        #[source]
        source: io::Error,
    },

    /// The replacement text could not be staged on the clipboard
    #[error("Clipboard unavailable: {0}")]
    Clipboard(#[from] ClipboardError),
}
