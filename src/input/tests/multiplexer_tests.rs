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

//! Multiplexer tests

use crossbeam_channel::bounded;
use std::io;

use crate::core::{KeyAction, KeyCode, KeyEvent};
use crate::input::{queue, DeviceSource, InputError, Multiplexer, ScriptedSource};

const LETTERS: [KeyCode; 10] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
];

fn boxed(source: ScriptedSource) -> Box<dyn DeviceSource> {
    Box::new(source)
}

fn events_from<'a>(events: &'a [KeyEvent], device: &'a str) -> impl Iterator<Item = &'a KeyEvent> {
    events.iter().filter(move |e| e.source.as_str() == device)
}

#[test]
fn test_no_sources_is_an_error() {
    let (sender, _receiver) = queue::<KeyEvent>();
    let result = Multiplexer::spawn(vec![], sender);
    assert!(matches!(result, Err(InputError::NoKeyboards)));
}

#[test]
fn test_per_device_order_is_preserved() {
    let (sender, receiver) = queue::<KeyEvent>();
    let mux = Multiplexer::spawn(
        vec![
            boxed(ScriptedSource::typing("left", &LETTERS)),
            boxed(ScriptedSource::typing("right", &LETTERS)),
        ],
        sender,
    )
    .unwrap();
    assert_eq!(mux.device_names(), ["left", "right"]);

    let events: Vec<KeyEvent> = receiver.iter().collect();
    mux.join();

    assert_eq!(events.len(), 40);
    for device in ["left", "right"] {
        let expected = ScriptedSource::typing(device, &LETTERS);
        let got: Vec<&KeyEvent> = events_from(&events, device).collect();
        assert_eq!(got.len(), expected.remaining());

        // Down/Up alternate and letters arrive in typing order
        for (i, event) in got.iter().enumerate() {
            assert_eq!(event.code, LETTERS[i / 2]);
            let action = if i % 2 == 0 { KeyAction::Down } else { KeyAction::Up };
            assert_eq!(event.action, action);
        }
    }
}

#[test]
fn test_failed_feed_does_not_stop_others() {
    let (sender, receiver) = queue::<KeyEvent>();
    let mux = Multiplexer::spawn(
        vec![
            boxed(ScriptedSource::typing("flaky", &[KeyCode::X]).failing_with(io::ErrorKind::NotConnected)),
            boxed(ScriptedSource::typing("steady", &LETTERS)),
        ],
        sender,
    )
    .unwrap();

    let events: Vec<KeyEvent> = receiver.iter().collect();
    mux.join();

    assert_eq!(events_from(&events, "flaky").count(), 2);
    assert_eq!(events_from(&events, "steady").count(), 20);
}

#[test]
fn test_live_feeds_reach_zero() {
    let (sender, receiver) = queue::<KeyEvent>();
    let mux = Multiplexer::spawn(vec![boxed(ScriptedSource::typing("kbd", &LETTERS))], sender).unwrap();

    // Queue disconnects only after the worker has exited
    assert_eq!(receiver.iter().count(), 20);
    assert_eq!(mux.live_feeds(), 0);
    mux.join();
}

#[test]
fn test_closed_queue_ends_feeds() {
    let (sender, receiver) = queue::<KeyEvent>();
    drop(receiver);

    let mux = Multiplexer::spawn(vec![boxed(ScriptedSource::typing("kbd", &LETTERS))], sender).unwrap();
    mux.join();
}

#[test]
fn test_stop_ends_feed_early() {
    let (sender, receiver) = bounded::<KeyEvent>(1);
    let mux = Multiplexer::spawn(vec![boxed(ScriptedSource::typing("kbd", &LETTERS))], sender).unwrap();

    receiver.recv().unwrap();
    mux.stop();
    assert!(mux.is_stopped());

    // At most the queued event and the one blocked in send get through
    let rest = receiver.iter().count();
    assert!(rest < 19, "feed kept running after stop: {rest}");
    mux.join();
}

#[test]
fn test_queue_carries_wider_messages() {
    #[derive(Debug)]
    enum Wrapped {
        Key(KeyEvent),
    }

    impl From<KeyEvent> for Wrapped {
        fn from(event: KeyEvent) -> Self {
            Wrapped::Key(event)
        }
    }

    let (sender, receiver) = queue::<Wrapped>();
    let mux = Multiplexer::spawn(vec![boxed(ScriptedSource::typing("kbd", &[KeyCode::Q]))], sender).unwrap();

    let first = receiver.recv().unwrap();
    let Wrapped::Key(event) = first;
    assert_eq!(event.code, KeyCode::Q);
    drop(receiver);
    mux.join();
}
