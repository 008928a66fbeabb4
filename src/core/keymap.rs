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

//! src/core/keymap.rs
//!
//! Static key code tables
//!
//! Key codes are Linux input event codes (the numbers in
//! `linux/input-event-codes.h`). The tables below assume a US layout:
//! every printable key maps to exactly one unshifted and one shifted
//! character. Dead keys and IME composition are not modelled.
//!
//! The tables are plain `const` slices so the mapping is fixed at compile
//! time and shared by the engine, the config validator and the virtual
//! keyboard (which must advertise every key it may emit).

use std::fmt;

/// A physical key identifier (Linux input event code).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const ESC: KeyCode = KeyCode(1);
    pub const KEY_1: KeyCode = KeyCode(2);
    pub const KEY_2: KeyCode = KeyCode(3);
    pub const KEY_3: KeyCode = KeyCode(4);
    pub const KEY_4: KeyCode = KeyCode(5);
    pub const KEY_5: KeyCode = KeyCode(6);
    pub const KEY_6: KeyCode = KeyCode(7);
    pub const KEY_7: KeyCode = KeyCode(8);
    pub const KEY_8: KeyCode = KeyCode(9);
    pub const KEY_9: KeyCode = KeyCode(10);
    pub const KEY_0: KeyCode = KeyCode(11);
    pub const MINUS: KeyCode = KeyCode(12);
    pub const EQUAL: KeyCode = KeyCode(13);
    pub const BACKSPACE: KeyCode = KeyCode(14);
    pub const TAB: KeyCode = KeyCode(15);
    pub const Q: KeyCode = KeyCode(16);
    pub const W: KeyCode = KeyCode(17);
    pub const E: KeyCode = KeyCode(18);
    pub const R: KeyCode = KeyCode(19);
    pub const T: KeyCode = KeyCode(20);
    pub const Y: KeyCode = KeyCode(21);
    pub const U: KeyCode = KeyCode(22);
    pub const I: KeyCode = KeyCode(23);
    pub const O: KeyCode = KeyCode(24);
    pub const P: KeyCode = KeyCode(25);
    pub const LEFT_BRACE: KeyCode = KeyCode(26);
    pub const RIGHT_BRACE: KeyCode = KeyCode(27);
    pub const ENTER: KeyCode = KeyCode(28);
    pub const LEFT_CTRL: KeyCode = KeyCode(29);
    pub const A: KeyCode = KeyCode(30);
    pub const S: KeyCode = KeyCode(31);
    pub const D: KeyCode = KeyCode(32);
    pub const F: KeyCode = KeyCode(33);
    pub const G: KeyCode = KeyCode(34);
    pub const H: KeyCode = KeyCode(35);
    pub const J: KeyCode = KeyCode(36);
    pub const K: KeyCode = KeyCode(37);
    pub const L: KeyCode = KeyCode(38);
    pub const SEMICOLON: KeyCode = KeyCode(39);
    pub const APOSTROPHE: KeyCode = KeyCode(40);
    pub const GRAVE: KeyCode = KeyCode(41);
    pub const LEFT_SHIFT: KeyCode = KeyCode(42);
    pub const BACKSLASH: KeyCode = KeyCode(43);
    pub const Z: KeyCode = KeyCode(44);
    pub const X: KeyCode = KeyCode(45);
    pub const C: KeyCode = KeyCode(46);
    pub const V: KeyCode = KeyCode(47);
    pub const B: KeyCode = KeyCode(48);
    pub const N: KeyCode = KeyCode(49);
    pub const M: KeyCode = KeyCode(50);
    pub const COMMA: KeyCode = KeyCode(51);
    pub const DOT: KeyCode = KeyCode(52);
    pub const SLASH: KeyCode = KeyCode(53);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(54);
    pub const LEFT_ALT: KeyCode = KeyCode(56);
    pub const SPACE: KeyCode = KeyCode(57);
    pub const CAPS_LOCK: KeyCode = KeyCode(58);
    pub const F1: KeyCode = KeyCode(59);
    pub const RIGHT_CTRL: KeyCode = KeyCode(97);
    pub const RIGHT_ALT: KeyCode = KeyCode(100);
    pub const HOME: KeyCode = KeyCode(102);
    pub const UP: KeyCode = KeyCode(103);
    pub const PAGE_UP: KeyCode = KeyCode(104);
    pub const LEFT: KeyCode = KeyCode(105);
    pub const RIGHT: KeyCode = KeyCode(106);
    pub const END: KeyCode = KeyCode(107);
    pub const DOWN: KeyCode = KeyCode(108);
    pub const PAGE_DOWN: KeyCode = KeyCode(109);
    pub const INSERT: KeyCode = KeyCode(110);
    pub const DELETE: KeyCode = KeyCode(111);
    pub const LEFT_META: KeyCode = KeyCode(125);
    pub const RIGHT_META: KeyCode = KeyCode(126);
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {}", self.0)
    }
}

/// Printable keys: `(code, unshifted, shifted)`
const CHARACTER_KEYS: &[(KeyCode, char, char)] = &[
    (KeyCode::A, 'a', 'A'),
    (KeyCode::B, 'b', 'B'),
    (KeyCode::C, 'c', 'C'),
    (KeyCode::D, 'd', 'D'),
    (KeyCode::E, 'e', 'E'),
    (KeyCode::F, 'f', 'F'),
    (KeyCode::G, 'g', 'G'),
    (KeyCode::H, 'h', 'H'),
    (KeyCode::I, 'i', 'I'),
    (KeyCode::J, 'j', 'J'),
    (KeyCode::K, 'k', 'K'),
    (KeyCode::L, 'l', 'L'),
    (KeyCode::M, 'm', 'M'),
    (KeyCode::N, 'n', 'N'),
    (KeyCode::O, 'o', 'O'),
    (KeyCode::P, 'p', 'P'),
    (KeyCode::Q, 'q', 'Q'),
    (KeyCode::R, 'r', 'R'),
    (KeyCode::S, 's', 'S'),
    (KeyCode::T, 't', 'T'),
    (KeyCode::U, 'u', 'U'),
    (KeyCode::V, 'v', 'V'),
    (KeyCode::W, 'w', 'W'),
    (KeyCode::X, 'x', 'X'),
    (KeyCode::Y, 'y', 'Y'),
    (KeyCode::Z, 'z', 'Z'),
    (KeyCode::KEY_1, '1', '!'),
    (KeyCode::KEY_2, '2', '@'),
    (KeyCode::KEY_3, '3', '#'),
    (KeyCode::KEY_4, '4', '$'),
    (KeyCode::KEY_5, '5', '%'),
    (KeyCode::KEY_6, '6', '^'),
    (KeyCode::KEY_7, '7', '&'),
    (KeyCode::KEY_8, '8', '*'),
    (KeyCode::KEY_9, '9', '('),
    (KeyCode::KEY_0, '0', ')'),
    (KeyCode::MINUS, '-', '_'),
    (KeyCode::EQUAL, '=', '+'),
    (KeyCode::LEFT_BRACE, '[', '{'),
    (KeyCode::RIGHT_BRACE, ']', '}'),
    (KeyCode::SEMICOLON, ';', ':'),
    (KeyCode::APOSTROPHE, '\'', '"'),
    (KeyCode::GRAVE, '`', '~'),
    (KeyCode::BACKSLASH, '\\', '|'),
    (KeyCode::COMMA, ',', '<'),
    (KeyCode::DOT, '.', '>'),
    (KeyCode::SLASH, '/', '?'),
    (KeyCode::SPACE, ' ', ' '),
];

/// Keys that invalidate the typing context (cursor moved, line changed,
/// or a shortcut chord is being entered)
const BUFFER_RESET_KEYS: &[KeyCode] = &[
    KeyCode::ENTER,
    KeyCode::ESC,
    KeyCode::TAB,
    KeyCode::UP,
    KeyCode::DOWN,
    KeyCode::LEFT,
    KeyCode::RIGHT,
    KeyCode::HOME,
    KeyCode::END,
    KeyCode::PAGE_UP,
    KeyCode::PAGE_DOWN,
    KeyCode::DELETE,
    KeyCode::INSERT,
    KeyCode::LEFT_CTRL,
    KeyCode::RIGHT_CTRL,
    KeyCode::LEFT_ALT,
    KeyCode::RIGHT_ALT,
    KeyCode::LEFT_META,
    KeyCode::RIGHT_META,
];

/// Returns the character a key produces, or `None` for unmapped keys.
pub fn char_for(code: KeyCode, shift: bool) -> Option<char> {
    CHARACTER_KEYS
        .iter()
        .find(|(key, _, _)| *key == code)
        .map(|&(_, normal, shifted)| if shift { shifted } else { normal })
}

/// Returns true for the left and right shift keys.
pub fn is_shift(code: KeyCode) -> bool {
    code == KeyCode::LEFT_SHIFT || code == KeyCode::RIGHT_SHIFT
}

/// Returns true for keys that clear the typing buffer.
pub fn is_buffer_reset(code: KeyCode) -> bool {
    BUFFER_RESET_KEYS.contains(&code)
}

/// Returns true if some key (with or without shift) produces `c`.
///
/// Used to warn about triggers that can never be typed.
pub fn can_type(c: char) -> bool {
    CHARACTER_KEYS
        .iter()
        .any(|&(_, normal, shifted)| normal == c || shifted == c)
}

/// Every key the daemon may synthesize on its virtual keyboard.
///
/// Covers the printable table, the erase/cursor keys used for correction,
/// and the modifiers needed for the paste chord.
pub fn output_keys() -> impl Iterator<Item = KeyCode> {
    CHARACTER_KEYS
        .iter()
        .map(|&(code, _, _)| code)
        .chain(BUFFER_RESET_KEYS.iter().copied())
        .chain([KeyCode::BACKSPACE, KeyCode::LEFT_SHIFT, KeyCode::RIGHT_SHIFT])
}
