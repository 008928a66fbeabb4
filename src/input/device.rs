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

//! evdev keyboards

use evdev::{Device, EventType, Key};
use log::{debug, info};
use std::{collections::VecDeque, io, path::Path};

use super::DeviceSource;
use crate::core::{DeviceId, KeyAction, KeyCode, KeyEvent};
use crate::output::VIRTUAL_DEVICE_NAME;

/// A physical keyboard read through `/dev/input/event*`
pub struct EvdevKeyboard {
    id: DeviceId,
    name: String,
    device: Option<Device>,
    pending: VecDeque<KeyEvent>,
}

impl EvdevKeyboard {
    /// Opens a keyboard by device node path.
    pub fn open(path: &Path) -> io::Result<Self> {
        let device = Device::open(path)?;
        Ok(Self::from_device(path, device))
    }

    fn from_device(path: &Path, device: Device) -> Self {
        let name = device.name().unwrap_or("unknown keyboard").to_string();
        Self {
            id: DeviceId::new(&path.to_string_lossy()),
            name,
            device: Some(device),
            pending: VecDeque::new(),
        }
    }
}

impl DeviceSource for EvdevKeyboard {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn next_event(&mut self) -> io::Result<Option<KeyEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            let Some(device) = self.device.as_mut() else {
                return Ok(None);
            };

            // One fetch returns a whole SYN-delimited batch
            for event in device.fetch_events()? {
                if event.event_type() != EventType::KEY {
                    continue;
                }
                if let Some(action) = KeyAction::from_value(event.value()) {
                    self.pending
                        .push_back(KeyEvent::new(self.id.clone(), KeyCode(event.code()), action));
                }
            }
        }
    }

    fn close(&mut self) {
        self.device = None;
        self.pending.clear();
    }
}

/// True for devices that can type letters and submit lines.
///
/// Mice, power buttons and media remotes also report EV_KEY, but none of
/// them has both `KEY_A` and `KEY_ENTER`.
pub fn is_keyboard(device: &Device) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::KEY_A) && keys.contains(Key::KEY_ENTER))
}

/// Enumerates `/dev/input` and opens every keyboard.
///
/// The daemon's own virtual keyboard is skipped so injected keystrokes
/// are never read back as typing.
pub fn find_keyboards() -> Vec<EvdevKeyboard> {
    let mut keyboards = Vec::new();

    for (path, device) in evdev::enumerate() {
        let name = device.name().unwrap_or_default();
        if name == VIRTUAL_DEVICE_NAME {
            debug!("Skipping own virtual keyboard at {}", path.display());
            continue;
        }
        if !is_keyboard(&device) {
            continue;
        }

        info!("Found keyboard: {} ({})", name, path.display());
        keyboards.push(EvdevKeyboard::from_device(&path, device));
    }

    keyboards.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    keyboards
}
