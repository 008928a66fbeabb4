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

//! Keyboard output sink
//!
//! `UinputKeyboard` creates a virtual keyboard through `/dev/uinput`.
//! Every event batch is terminated with a SYN_REPORT by `evdev`, so each
//! primitive is a complete, independently delivered key transition.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, Key,
};

use crate::core::{keymap, KeyCode};
use crate::output::OutputError;

/// Name of the virtual keyboard; also used to skip it during discovery
pub const VIRTUAL_DEVICE_NAME: &str = "texpand";

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Primitive key synthesis used by the action emitter
pub trait KeyboardSink {
    /// Presses and releases a key.
    fn press(&mut self, key: KeyCode) -> Result<(), OutputError> {
        self.hold(key)?;
        self.release(key)
    }

    /// Presses a key without releasing it.
    fn hold(&mut self, key: KeyCode) -> Result<(), OutputError>;

    /// Releases a held key.
    fn release(&mut self, key: KeyCode) -> Result<(), OutputError>;
}

/// Virtual keyboard backed by uinput
pub struct UinputKeyboard {
    device: VirtualDevice,
}

impl UinputKeyboard {
    /// Creates the virtual keyboard, advertising every key it may emit.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::DeviceCreation` if `/dev/uinput` cannot be
    /// opened (usually missing permissions) or the device is rejected.
    pub fn create() -> Result<Self, OutputError> {
        let mut keys = AttributeSet::<Key>::new();
        for code in keymap::output_keys() {
            keys.insert(Key::new(code.0));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(OutputError::DeviceCreation)?
            .name(VIRTUAL_DEVICE_NAME)
            .with_keys(&keys)
            .map_err(OutputError::DeviceCreation)?
            .build()
            .map_err(OutputError::DeviceCreation)?;

        Ok(Self { device })
    }

    fn emit(&mut self, key: KeyCode, value: i32) -> Result<(), OutputError> {
        let event = InputEvent::new(EventType::KEY, key.0, value);
        self.device
            .emit(&[event])
            .map_err(|source| OutputError::Emit { key, source })
    }
}

impl KeyboardSink for UinputKeyboard {
    fn hold(&mut self, key: KeyCode) -> Result<(), OutputError> {
        self.emit(key, KEY_PRESS)
    }

    fn release(&mut self, key: KeyCode) -> Result<(), OutputError> {
        self.emit(key, KEY_RELEASE)
    }
}
