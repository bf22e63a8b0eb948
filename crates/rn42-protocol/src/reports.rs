//! HID raw reports.
//!
//! In HID mode the module turns each raw report it receives into one HID
//! input report for the connected host:
//!
//! ```text
//! +------+-----+---------------------+
//! | 0xFD | len | payload[0..len]     |
//! +------+-----+---------------------+
//! ```
//!
//! The length byte selects the report kind: 9 for keyboard, 5 for mouse and 6
//! for gamepad/joystick.

use bytes::{Buf, BytesMut};

use crate::constants::*;
use crate::keys::{GamepadButtons, Key, Modifiers, MouseButtons};

/// Keyboard report: modifier byte plus up to six pressed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    pub modifiers: Modifiers,
    pub keys: [Key; MAX_PRESSED_KEYS],
}

impl KeyboardReport {
    /// Report with a single key held.
    pub fn single(key: Key, modifiers: Modifiers) -> Self {
        let mut report = KeyboardReport::default();
        report.press(key, modifiers);
        report
    }

    /// Add `key` to the first free slot and set `modifiers`.
    ///
    /// A key that is already held is not added twice. When all six slots
    /// are taken the key is dropped and `false` is returned.
    pub fn press(&mut self, key: Key, modifiers: Modifiers) -> bool {
        self.modifiers = modifiers;
        if key == Key::NONE || self.keys.contains(&key) {
            return true;
        }
        match self.keys.iter_mut().find(|slot| **slot == Key::NONE) {
            Some(slot) => {
                *slot = key;
                true
            }
            None => false,
        }
    }

    /// Remove `key`, keeping the remaining keys packed at the front.
    pub fn release(&mut self, key: Key) {
        let held: Vec<Key> = self
            .keys
            .iter()
            .copied()
            .filter(|k| *k != key && *k != Key::NONE)
            .collect();
        self.keys = [Key::NONE; MAX_PRESSED_KEYS];
        for (slot, k) in self.keys.iter_mut().zip(held) {
            *slot = k;
        }
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.keys.iter().all(|k| *k == Key::NONE)
    }

    /// Keys currently held.
    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys.iter().copied().filter(|k| *k != Key::NONE)
    }

    /// Encode as a raw report.
    pub fn encode(&self) -> [u8; 11] {
        let mut buf = [0u8; 11];
        buf[0] = RAW_REPORT_START;
        buf[1] = KEYBOARD_REPORT_LEN;
        buf[2] = KEYBOARD_DESCRIPTOR;
        buf[3] = self.modifiers.bits();
        // buf[4] is reserved
        for (i, key) in self.keys.iter().enumerate() {
            buf[5 + i] = key.0;
        }
        buf
    }

    fn decode_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != KEYBOARD_REPORT_LEN as usize || payload[0] != KEYBOARD_DESCRIPTOR {
            return None;
        }
        let mut keys = [Key::NONE; MAX_PRESSED_KEYS];
        for (slot, &b) in keys.iter_mut().zip(&payload[3..]) {
            *slot = Key(b);
        }
        Some(KeyboardReport {
            modifiers: Modifiers(payload[1]),
            keys,
        })
    }
}

/// Mouse report: buttons, relative motion and wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseReport {
    pub buttons: MouseButtons,
    pub dx: i8,
    pub dy: i8,
    pub wheel: i8,
}

impl MouseReport {
    /// Encode as a raw report. Deltas are two's complement bytes.
    pub fn encode(&self) -> [u8; 7] {
        [
            RAW_REPORT_START,
            MOUSE_REPORT_LEN,
            MOUSE_DESCRIPTOR,
            self.buttons.bits(),
            self.dx as u8,
            self.dy as u8,
            self.wheel as u8,
        ]
    }

    fn decode_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != MOUSE_REPORT_LEN as usize || payload[0] != MOUSE_DESCRIPTOR {
            return None;
        }
        Some(MouseReport {
            buttons: MouseButtons(payload[1]),
            dx: payload[2] as i8,
            dy: payload[3] as i8,
            wheel: payload[4] as i8,
        })
    }
}

/// Gamepad/joystick report: two button banks and two sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GamepadReport {
    pub first: GamepadButtons,
    pub second: GamepadButtons,
    pub x1: i8,
    pub y1: i8,
    pub x2: i8,
    pub y2: i8,
}

impl GamepadReport {
    /// Encode as a raw report.
    pub fn encode(&self) -> [u8; 8] {
        [
            RAW_REPORT_START,
            GAMEPAD_REPORT_LEN,
            self.first.bits(),
            self.second.bits(),
            self.x1 as u8,
            self.y1 as u8,
            self.x2 as u8,
            self.y2 as u8,
        ]
    }

    fn decode_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != GAMEPAD_REPORT_LEN as usize {
            return None;
        }
        Some(GamepadReport {
            first: GamepadButtons(payload[0]),
            second: GamepadButtons(payload[1]),
            x1: payload[2] as i8,
            y1: payload[3] as i8,
            x2: payload[4] as i8,
            y2: payload[5] as i8,
        })
    }
}

/// Any raw report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Gamepad(GamepadReport),
}

impl HidReport {
    /// Encode as a raw report.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            HidReport::Keyboard(r) => r.encode().to_vec(),
            HidReport::Mouse(r) => r.encode().to_vec(),
            HidReport::Gamepad(r) => r.encode().to_vec(),
        }
    }

    /// Report kind, for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            HidReport::Keyboard(_) => "keyboard",
            HidReport::Mouse(_) => "mouse",
            HidReport::Gamepad(_) => "gamepad",
        }
    }

    /// Decode a report payload (the bytes after the length byte).
    pub fn decode_payload(payload: &[u8]) -> Option<HidReport> {
        match payload.len() as u8 {
            KEYBOARD_REPORT_LEN => KeyboardReport::decode_payload(payload).map(HidReport::Keyboard),
            MOUSE_REPORT_LEN => MouseReport::decode_payload(payload).map(HidReport::Mouse),
            GAMEPAD_REPORT_LEN => GamepadReport::decode_payload(payload).map(HidReport::Gamepad),
            _ => None,
        }
    }
}

/// Data-mode byte stream item: a raw report or a passthrough byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataItem {
    Report(HidReport),
    /// A byte outside any report. In HID mode the module types ASCII bytes
    /// as keystrokes.
    Byte(u8),
    /// A `0xFD` frame with an unknown length or descriptor.
    Malformed(Vec<u8>),
}

/// Splits a data-mode byte stream into raw reports and passthrough bytes.
#[derive(Debug, Default)]
pub struct ReportDecoder {
    buffer: BytesMut,
}

impl ReportDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        ReportDecoder { buffer: BytesMut::new() }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next item. Returns `None` if more data is needed.
    pub fn decode(&mut self) -> Option<DataItem> {
        let first = *self.buffer.first()?;
        if first != RAW_REPORT_START {
            self.buffer.advance(1);
            return Some(DataItem::Byte(first));
        }

        let len = *self.buffer.get(1)? as usize;
        if self.buffer.len() < 2 + len {
            return None;
        }

        let frame = self.buffer.split_to(2 + len);
        match HidReport::decode_payload(&frame[2..]) {
            Some(report) => Some(DataItem::Report(report)),
            None => Some(DataItem::Malformed(frame.to_vec())),
        }
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
