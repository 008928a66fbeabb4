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

//! Action emitter tests
//!
//! Runs the emitter against recording fakes and checks the exact key
//! and clipboard sequence it produces.

use crate::core::{Expansion, KeyCode};
use crate::output::{
    emitter::split_cursor_marker,
    testing::{RecordingClipboard, RecordingKeyboard, Stroke},
    ActionEmitter, Delays, OutputError, OutputPlan,
};

fn expansion(trigger: &str, replacement: &str, via_space: bool) -> Expansion {
    Expansion {
        trigger: trigger.to_string(),
        replacement: replacement.to_string(),
        via_space,
    }
}

fn emitter(
    keyboard: RecordingKeyboard,
    clipboard: RecordingClipboard,
) -> ActionEmitter<RecordingKeyboard, RecordingClipboard> {
    ActionEmitter::new(keyboard, clipboard, Delays::none())
}

#[test]
fn test_plan_counts_space_in_erase() {
    let plan = OutputPlan::from_expansion(&expansion("btwn", "between", true));
    assert_eq!(plan.erase_count, 5);
    assert!(plan.retype_space);

    let plan = OutputPlan::from_expansion(&expansion(":omw", "on my way", false));
    assert_eq!(plan.erase_count, 4);
    assert!(!plan.retype_space);
}

#[test]
fn test_plan_counts_characters_not_bytes() {
    let plan = OutputPlan::from_expansion(&expansion("café", "coffee", false));
    assert_eq!(plan.erase_count, 4);
}

#[test]
fn test_cursor_marker_split() {
    assert_eq!(split_cursor_marker("<b>$|$</b>"), ("<b></b>".to_string(), 4));
    assert_eq!(split_cursor_marker("plain"), ("plain".to_string(), 0));
    assert_eq!(split_cursor_marker("end$|$"), ("end".to_string(), 0));
    // Only the first marker is consumed
    assert_eq!(split_cursor_marker("a$|$b$|$"), ("ab$|$".to_string(), 4));
}

#[test]
fn test_space_mode_sequence() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::holding("saved"));

    emitter.emit(&expansion("btwn", "between", true)).unwrap();

    let keyboard = emitter.keyboard();
    let mut expected = vec![KeyCode::BACKSPACE; 5];
    expected.extend([KeyCode::V, KeyCode::LEFT_CTRL, KeyCode::SPACE]);
    assert_eq!(keyboard.pressed(), expected);

    // Ctrl is held around V
    let ctrl_down = keyboard
        .strokes
        .iter()
        .position(|s| *s == Stroke::Hold(KeyCode::LEFT_CTRL))
        .unwrap();
    let v_down = keyboard
        .strokes
        .iter()
        .position(|s| *s == Stroke::Hold(KeyCode::V))
        .unwrap();
    let ctrl_up = keyboard
        .strokes
        .iter()
        .position(|s| *s == Stroke::Release(KeyCode::LEFT_CTRL))
        .unwrap();
    assert!(ctrl_down < v_down && v_down < ctrl_up);

    assert_eq!(emitter.clipboard().writes, vec!["between", "saved"]);
}

#[test]
fn test_immediate_mode_does_not_retype_space() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::default());

    emitter.emit(&expansion(":omw", "on my way", false)).unwrap();

    assert_eq!(emitter.keyboard().count(KeyCode::BACKSPACE), 4);
    assert_eq!(emitter.keyboard().count(KeyCode::SPACE), 0);
}

#[test]
fn test_empty_clipboard_is_not_restored() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::default());

    emitter.emit(&expansion("ty", "thank you", true)).unwrap();

    assert_eq!(emitter.clipboard().writes, vec!["thank you"]);
}

#[test]
fn test_unreadable_clipboard_still_pastes() {
    let clipboard = RecordingClipboard {
        fail_read: true,
        ..RecordingClipboard::default()
    };
    let mut emitter = emitter(RecordingKeyboard::default(), clipboard);

    emitter.emit(&expansion("ty", "thank you", false)).unwrap();

    assert_eq!(emitter.clipboard().writes, vec!["thank you"]);
    assert_eq!(emitter.keyboard().count(KeyCode::V), 1);
}

#[test]
fn test_clipboard_write_failure_is_an_error() {
    let clipboard = RecordingClipboard {
        fail_write: true,
        ..RecordingClipboard::default()
    };
    let mut emitter = emitter(RecordingKeyboard::default(), clipboard);

    let result = emitter.emit(&expansion("ty", "thank you", false));

    assert!(matches!(result, Err(OutputError::Clipboard(_))));
    // Trigger was erased, but nothing was pasted
    assert_eq!(emitter.keyboard().count(KeyCode::BACKSPACE), 2);
    assert_eq!(emitter.keyboard().count(KeyCode::V), 0);
}

#[test]
fn test_cursor_marker_moves_cursor_left() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::holding("x"));

    let plan = emitter.emit(&expansion(":b", "<b>$|$</b>", false)).unwrap();

    assert_eq!(plan.text, "<b></b>");
    assert_eq!(plan.cursor_left, 4);
    assert_eq!(emitter.keyboard().count(KeyCode::LEFT), 4);
    assert_eq!(emitter.clipboard().writes, vec!["<b></b>", "x"]);
}

/// Applies recorded key presses to a one-line editor whose cursor starts at
/// the end of `line`. Ctrl+V inserts `pasted`.
fn replay(line: &str, pressed: &[KeyCode], pasted: &str) -> (String, usize) {
    let mut text: Vec<char> = line.chars().collect();
    let mut cursor = text.len();

    for &key in pressed {
        match key {
            KeyCode::BACKSPACE if cursor > 0 => {
                cursor -= 1;
                text.remove(cursor);
            }
            KeyCode::V => {
                for c in pasted.chars() {
                    text.insert(cursor, c);
                    cursor += 1;
                }
            }
            KeyCode::SPACE => {
                text.insert(cursor, ' ');
                cursor += 1;
            }
            KeyCode::LEFT => cursor = cursor.saturating_sub(1),
            _ => {}
        }
    }

    (text.into_iter().collect(), cursor)
}

#[test]
fn test_space_mode_keeps_separator_after_cursor_marker() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::default());

    emitter.emit(&expansion("q", "\"$|$\"", true)).unwrap();

    let pasted = emitter.clipboard().writes[0].clone();
    let (line, cursor) = replay("say q ", &emitter.keyboard().pressed(), &pasted);
    assert_eq!(line, "say \"\" ");
    // Between the quotes
    assert_eq!(cursor, 5);
}

#[test]
fn test_space_mode_without_marker_leaves_cursor_after_space() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::holding("x"));

    emitter.emit(&expansion("omw", "on my way", true)).unwrap();

    let (line, cursor) = replay("I am omw ", &emitter.keyboard().pressed(), "on my way");
    assert_eq!(line, "I am on my way ");
    assert_eq!(cursor, line.len());
    assert_eq!(emitter.keyboard().count(KeyCode::LEFT), 0);
}

#[test]
fn test_immediate_mode_cursor_marker() {
    let mut emitter = emitter(RecordingKeyboard::default(), RecordingClipboard::default());

    emitter.emit(&expansion(":b", "<b>$|$</b>", false)).unwrap();

    let (line, cursor) = replay("x :b", &emitter.keyboard().pressed(), "<b></b>");
    assert_eq!(line, "x <b></b>");
    assert_eq!(cursor, 5);
}

#[test]
fn test_ctrl_released_when_paste_fails() {
    let mut emitter = emitter(
        RecordingKeyboard::failing_on(KeyCode::V),
        RecordingClipboard::holding("saved"),
    );

    let result = emitter.emit(&expansion("ty", "thank you", false));

    assert!(matches!(result, Err(OutputError::Emit { key, .. }) if key == KeyCode::V));
    assert_eq!(
        emitter.keyboard().strokes.last(),
        Some(&Stroke::Release(KeyCode::LEFT_CTRL))
    );
    // Clipboard is restored regardless
    assert_eq!(emitter.clipboard().writes, vec!["thank you", "saved"]);
}
