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

//! In-memory device source
//!
//! Replays a fixed list of events. Events may carry any `DeviceId`, so a
//! single scripted source can reproduce an exact cross-device
//! interleaving that real concurrent keyboards would make nondeterministic.

use std::{collections::VecDeque, io};

use super::DeviceSource;
use crate::core::{DeviceId, KeyAction, KeyCode, KeyEvent};

/// Replays scripted key events, optionally ending in a read error
#[derive(Debug)]
pub struct ScriptedSource {
    id: DeviceId,
    events: VecDeque<KeyEvent>,
    failure: Option<io::ErrorKind>,
    closed: bool,
}

impl ScriptedSource {
    pub fn new(name: &str, events: Vec<KeyEvent>) -> Self {
        Self {
            id: DeviceId::new(name),
            events: events.into(),
            failure: None,
            closed: false,
        }
    }

    /// A source that presses and releases each key in turn.
    pub fn typing(name: &str, keys: &[KeyCode]) -> Self {
        let id = DeviceId::new(name);
        let events = keys
            .iter()
            .flat_map(|&code| {
                [
                    KeyEvent::new(id.clone(), code, KeyAction::Down),
                    KeyEvent::new(id.clone(), code, KeyAction::Up),
                ]
            })
            .collect();
        Self::new(name, events)
    }

    /// Fails with `kind` once the scripted events are exhausted,
    /// like a keyboard being unplugged.
    pub fn failing_with(mut self, kind: io::ErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl DeviceSource for ScriptedSource {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn next_event(&mut self) -> io::Result<Option<KeyEvent>> {
        if self.closed {
            return Ok(None);
        }
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None => match self.failure {
                Some(kind) => Err(io::Error::new(kind, "scripted device failure")),
                None => Ok(None),
            },
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_produces_press_release_pairs() {
        let mut source = ScriptedSource::typing("kbd", &[KeyCode::H, KeyCode::I]);
        assert_eq!(source.remaining(), 4);

        let first = source.next_event().unwrap().unwrap();
        assert_eq!(first.code, KeyCode::H);
        assert_eq!(first.action, KeyAction::Down);
        assert_eq!(first.source.as_str(), "kbd");

        let second = source.next_event().unwrap().unwrap();
        assert_eq!(second.action, KeyAction::Up);
    }

    #[test]
    fn test_exhausted_source_ends_or_fails() {
        let mut ending = ScriptedSource::typing("a", &[]);
        assert!(ending.next_event().unwrap().is_none());

        let mut failing = ScriptedSource::typing("b", &[]).failing_with(io::ErrorKind::NotConnected);
        let err = failing.next_event().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_closed_source_ends() {
        let mut source = ScriptedSource::typing("kbd", &[KeyCode::A]);
        source.close();
        assert!(source.next_event().unwrap().is_none());
    }
}
