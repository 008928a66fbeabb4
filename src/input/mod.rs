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

//! Keyboard input
//!
//! Each physical keyboard is a [`DeviceSource`]: a blocking, internally
//! ordered stream of [`KeyEvent`]s. The [`Multiplexer`] runs one worker
//! thread per source and fans every feed into a single bounded queue
//! consumed by the daemon.
//!
//! # Example
//! ```
//! use texpand::core::{KeyCode, KeyEvent};
//! use texpand::input::{Multiplexer, ScriptedSource, DeviceSource};
//!
//! let source = ScriptedSource::typing("kbd0", &[KeyCode::A, KeyCode::B]);
//! let (sender, receiver) = texpand::input::queue::<KeyEvent>();
//! let mux = Multiplexer::spawn(vec![Box::new(source) as Box<dyn DeviceSource>], sender).unwrap();
//!
//! let events: Vec<KeyEvent> = receiver.iter().collect();
//! assert_eq!(events.len(), 4);
//! mux.join();
//! ```

pub mod device;
pub mod multiplexer;
pub mod scripted;

pub use device::{find_keyboards, EvdevKeyboard};
pub use multiplexer::{queue, Multiplexer, QUEUE_CAPACITY};
pub use scripted::ScriptedSource;

use std::io;
use thiserror::Error;

use crate::core::{DeviceId, KeyEvent};

#[cfg(test)]
mod tests;

/// Errors raised while starting keyboard input
#[derive(Debug, Error)]
pub enum InputError {
    /// Nothing to listen to
    #[error("No keyboards found (is the user in the 'input' group?)")]
    NoKeyboards,

    /// A worker thread could not be started
    #[error("Failed to start input worker: {0}")]
    Spawn(#[source] io::Error),
}

/// A blocking stream of key events from one keyboard
pub trait DeviceSource: Send {
    /// Identifier stamped on every event from this source
    fn id(&self) -> &DeviceId;

    /// Human-readable device name
    fn name(&self) -> &str;

    /// Blocks until the next key event.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn next_event(&mut self) -> io::Result<Option<KeyEvent>>;

    /// Releases the underlying device. Further reads return `Ok(None)`.
    fn close(&mut self);
}
