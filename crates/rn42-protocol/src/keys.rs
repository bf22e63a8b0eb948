//! Key scan codes, modifier bits and button bits.
//!
//! Scan codes are USB HID usage IDs from the keyboard/keypad usage page. The
//! values must match the usage tables exactly; the module forwards them to the
//! host unchanged.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A keyboard scan code (HID usage ID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Key(pub u8);

macro_rules! key_table {
    ($($(#[$doc:meta])* $name:ident = $value:expr;)*) => {
        impl Key {
            $($(#[$doc])* pub const $name: Key = Key($value);)*

            /// Every named key, in declaration order.
            pub const ALL: &'static [(&'static str, Key)] = &[
                $((stringify!($name), Key($value)),)*
            ];
        }
    };
}

key_table! {
    /// Letters
    A = 0x04; B = 0x05; C = 0x06; D = 0x07; E = 0x08; F = 0x09; G = 0x0A;
    H = 0x0B; I = 0x0C; J = 0x0D; K = 0x0E; L = 0x0F; M = 0x10; N = 0x11;
    O = 0x12; P = 0x13; Q = 0x14; R = 0x15; S = 0x16; T = 0x17; U = 0x18;
    V = 0x19; W = 0x1A; X = 0x1B; Y = 0x1C; Z = 0x1D;

    /// Top-row digits
    NUM_1 = 0x1E; NUM_2 = 0x1F; NUM_3 = 0x20; NUM_4 = 0x21; NUM_5 = 0x22;
    NUM_6 = 0x23; NUM_7 = 0x24; NUM_8 = 0x25; NUM_9 = 0x26; NUM_0 = 0x27;

    ENTER = 0x28;
    ESC = 0x29;
    BACKSPACE = 0x2A;
    TAB = 0x2B;
    /// Keyboard spacebar, used for typed text.
    SPACEBAR = 0x2C;
    MINUS = 0x2D;
    EQUAL = 0x2E;
    LEFT_BRACKET = 0x2F;
    RIGHT_BRACKET = 0x30;
    BACKSLASH = 0x31;
    SEMICOLON = 0x33;
    APOSTROPHE = 0x34;
    GRAVE = 0x35;
    COMMA = 0x36;
    PERIOD = 0x37;
    SLASH = 0x38;
    CAPS_LOCK = 0x39;

    F1 = 0x3A; F2 = 0x3B; F3 = 0x3C; F4 = 0x3D; F5 = 0x3E; F6 = 0x3F;
    F7 = 0x40; F8 = 0x41; F9 = 0x42; F10 = 0x43; F11 = 0x44; F12 = 0x45;

    PRINT_SCREEN = 0x46;
    SCROLL_LOCK = 0x47;
    BREAK_PAUSE = 0x48;
    INSERT = 0x49;
    HOME = 0x4A;
    PAGE_UP = 0x4B;
    DELETE = 0x4C;
    END = 0x4D;
    PAGE_DOWN = 0x4E;
    RIGHT = 0x4F;
    LEFT = 0x50;
    DOWN = 0x51;
    UP = 0x52;
    NUM_LOCK = 0x53;

    KEYPAD_1 = 0x59; KEYPAD_2 = 0x5A; KEYPAD_3 = 0x5B; KEYPAD_4 = 0x5C;
    KEYPAD_5 = 0x5D; KEYPAD_6 = 0x5E; KEYPAD_7 = 0x5F; KEYPAD_8 = 0x60;
    KEYPAD_9 = 0x61; KEYPAD_0 = 0x62;

    TOGGLE_VIRTUAL_KEYBOARD = 0x65;
    /// Keypad space. This is the value the RN-42 Arduino tooling publishes
    /// as its space key.
    SPACE = 0xCD;

    LEFT_CONTROL = 0xE0;
    LEFT_SHIFT = 0xE1;
    LEFT_ALT = 0xE2;
    LEFT_GUI = 0xE3;
    RIGHT_CONTROL = 0xE4;
    RIGHT_SHIFT = 0xE5;
    RIGHT_ALT = 0xE6;
    RIGHT_GUI = 0xE7;
}

impl Key {
    /// The empty key slot.
    pub const NONE: Key = Key(0x00);

    /// Look up a key by its table name (`"F1"`, `"page_up"`) or a single
    /// letter/digit (`"a"`, `"7"`). Case-insensitive.
    pub fn from_name(name: &str) -> Option<Key> {
        let upper = name.trim().to_ascii_uppercase();
        if let Some(&(_, key)) = Key::ALL.iter().find(|(n, _)| *n == upper) {
            return Some(key);
        }
        let mut chars = upper.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => {
                char_to_key(c.to_ascii_lowercase()).map(|(key, _)| key)
            }
            _ => None,
        }
    }

    /// The table name of this key, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        Key::ALL.iter().find(|(_, k)| k == self).map(|(n, _)| *n)
    }

    /// Whether this is one of the eight modifier keys (`0xE0..=0xE7`).
    pub fn is_modifier(&self) -> bool {
        (0xE0..=0xE7).contains(&self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Generates a byte-sized bitmask newtype with set operations.
macro_rules! bitmask {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u8);

        impl $name {
            /// Raw bit value.
            pub const fn bits(&self) -> u8 {
                self.0
            }

            /// Whether every bit of `other` is set.
            pub const fn contains(&self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            /// Whether no bit is set.
            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }

            /// Clear the bits of `other`.
            pub fn remove(&mut self, other: $name) {
                self.0 &= !other.0;
            }
        }

        impl BitOr for $name {
            type Output = $name;

            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }
    };
}

bitmask! {
    /// Keyboard modifier byte. Each bit is one modifier key.
    Modifiers
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0x00);
    pub const LEFT_CTRL: Modifiers = Modifiers(1 << 0);
    pub const LEFT_SHIFT: Modifiers = Modifiers(1 << 1);
    pub const LEFT_ALT: Modifiers = Modifiers(1 << 2);
    pub const LEFT_GUI: Modifiers = Modifiers(1 << 3);
    pub const RIGHT_CTRL: Modifiers = Modifiers(1 << 4);
    pub const RIGHT_SHIFT: Modifiers = Modifiers(1 << 5);
    pub const RIGHT_ALT: Modifiers = Modifiers(1 << 6);
    pub const RIGHT_GUI: Modifiers = Modifiers(1 << 7);

    /// Parse a modifier name. Bare names (`ctrl`, `shift`, `alt`, `gui`)
    /// mean the left-hand key.
    pub fn from_name(name: &str) -> Option<Modifiers> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "lctrl" | "left_ctrl" => Some(Modifiers::LEFT_CTRL),
            "shift" | "lshift" | "left_shift" => Some(Modifiers::LEFT_SHIFT),
            "alt" | "lalt" | "left_alt" => Some(Modifiers::LEFT_ALT),
            "gui" | "win" | "cmd" | "super" | "lgui" | "left_gui" => Some(Modifiers::LEFT_GUI),
            "rctrl" | "right_ctrl" => Some(Modifiers::RIGHT_CTRL),
            "rshift" | "right_shift" => Some(Modifiers::RIGHT_SHIFT),
            "ralt" | "altgr" | "right_alt" => Some(Modifiers::RIGHT_ALT),
            "rgui" | "right_gui" => Some(Modifiers::RIGHT_GUI),
            "none" => Some(Modifiers::NONE),
            _ => None,
        }
    }

    /// The modifier bit a modifier key (`0xE0..=0xE7`) corresponds to.
    pub fn for_key(key: Key) -> Option<Modifiers> {
        key.is_modifier().then(|| Modifiers(1 << (key.0 - 0xE0)))
    }
}

bitmask! {
    /// Mouse button byte.
    MouseButtons
}

impl MouseButtons {
    pub const NONE: MouseButtons = MouseButtons(0x00);
    pub const LEFT: MouseButtons = MouseButtons(1 << 0);
    pub const RIGHT: MouseButtons = MouseButtons(1 << 1);
    pub const MIDDLE: MouseButtons = MouseButtons(1 << 2);

    pub fn from_name(name: &str) -> Option<MouseButtons> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => Some(MouseButtons::LEFT),
            "right" => Some(MouseButtons::RIGHT),
            "middle" => Some(MouseButtons::MIDDLE),
            _ => None,
        }
    }
}

bitmask! {
    /// One of the two gamepad/joystick button bytes. The first byte carries
    /// buttons 0-7 of the first bank, the second byte buttons 0-7 of the
    /// second bank; both use the same bit values.
    GamepadButtons
}

impl GamepadButtons {
    pub const NONE: GamepadButtons = GamepadButtons(0x00);
    pub const BTN0: GamepadButtons = GamepadButtons(1 << 0);
    pub const BTN1: GamepadButtons = GamepadButtons(1 << 1);
    pub const BTN2: GamepadButtons = GamepadButtons(1 << 2);
    pub const BTN3: GamepadButtons = GamepadButtons(1 << 3);
    pub const BTN4: GamepadButtons = GamepadButtons(1 << 4);
    pub const BTN5: GamepadButtons = GamepadButtons(1 << 5);
    pub const BTN6: GamepadButtons = GamepadButtons(1 << 6);
    pub const BTN7: GamepadButtons = GamepadButtons(1 << 7);

    /// Button `index` (0-7) of a bank.
    pub fn button(index: u8) -> Option<GamepadButtons> {
        (index < 8).then(|| GamepadButtons(1 << index))
    }
}

/// Map a character to the key and modifiers a US layout needs to type it.
///
/// Covers printable ASCII plus newline, tab and backspace.
pub fn char_to_key(c: char) -> Option<(Key, Modifiers)> {
    let plain = |key| Some((key, Modifiers::NONE));
    let shifted = |key| Some((key, Modifiers::LEFT_SHIFT));

    match c {
        'a'..='z' => plain(Key(Key::A.0 + (c as u8 - b'a'))),
        'A'..='Z' => shifted(Key(Key::A.0 + (c as u8 - b'A'))),
        '1'..='9' => plain(Key(Key::NUM_1.0 + (c as u8 - b'1'))),
        '0' => plain(Key::NUM_0),
        ' ' => plain(Key::SPACEBAR),
        '\n' => plain(Key::ENTER),
        '\t' => plain(Key::TAB),
        '\u{8}' => plain(Key::BACKSPACE),
        '-' => plain(Key::MINUS),
        '_' => shifted(Key::MINUS),
        '=' => plain(Key::EQUAL),
        '+' => shifted(Key::EQUAL),
        '[' => plain(Key::LEFT_BRACKET),
        '{' => shifted(Key::LEFT_BRACKET),
        ']' => plain(Key::RIGHT_BRACKET),
        '}' => shifted(Key::RIGHT_BRACKET),
        '\\' => plain(Key::BACKSLASH),
        '|' => shifted(Key::BACKSLASH),
        ';' => plain(Key::SEMICOLON),
        ':' => shifted(Key::SEMICOLON),
        '\'' => plain(Key::APOSTROPHE),
        '"' => shifted(Key::APOSTROPHE),
        '`' => plain(Key::GRAVE),
        '~' => shifted(Key::GRAVE),
        ',' => plain(Key::COMMA),
        '<' => shifted(Key::COMMA),
        '.' => plain(Key::PERIOD),
        '>' => shifted(Key::PERIOD),
        '/' => plain(Key::SLASH),
        '?' => shifted(Key::SLASH),
        '!' => shifted(Key::NUM_1),
        '@' => shifted(Key::NUM_2),
        '#' => shifted(Key::NUM_3),
        '$' => shifted(Key::NUM_4),
        '%' => shifted(Key::NUM_5),
        '^' => shifted(Key::NUM_6),
        '&' => shifted(Key::NUM_7),
        '*' => shifted(Key::NUM_8),
        '(' => shifted(Key::NUM_9),
        ')' => shifted(Key::NUM_0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_values_are_unique() {
        let mut seen = HashSet::new();
        for (name, key) in Key::ALL {
            assert!(seen.insert(key.0), "{} reuses value 0x{:02X}", name, key.0);
        }
    }

    #[test]
    fn test_key_names_are_unique() {
        let names: HashSet<_> = Key::ALL.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), Key::ALL.len());
    }

    #[test]
    fn test_usage_ids() {
        assert_eq!(Key::A, Key(0x04));
        assert_eq!(Key::Z, Key(0x1D));
        assert_eq!(Key::NUM_1, Key(0x1E));
        assert_eq!(Key::NUM_0, Key(0x27));
        assert_eq!(Key::KEYPAD_1, Key(0x59));
        assert_eq!(Key::KEYPAD_0, Key(0x62));
        assert_eq!(Key::F12, Key(0x45));
        assert_eq!(Key::SPACE, Key(0xCD));
        assert_eq!(Key::RIGHT_GUI, Key(0xE7));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Key::from_name("F5"), Some(Key::F5));
        assert_eq!(Key::from_name("page_up"), Some(Key::PAGE_UP));
        assert_eq!(Key::from_name("q"), Some(Key::Q));
        assert_eq!(Key::from_name("7"), Some(Key::NUM_7));
        assert_eq!(Key::from_name("nope"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::ENTER.to_string(), "ENTER");
        assert_eq!(Key(0x32).to_string(), "0x32");
    }

    #[test]
    fn test_modifier_bits() {
        let mods = Modifiers::LEFT_CTRL | Modifiers::RIGHT_ALT;
        assert_eq!(mods.bits(), 0b0100_0001);
        assert!(mods.contains(Modifiers::LEFT_CTRL));
        assert!(!mods.contains(Modifiers::LEFT_SHIFT));
        assert_eq!(Modifiers::for_key(Key::RIGHT_SHIFT), Some(Modifiers::RIGHT_SHIFT));
        assert_eq!(Modifiers::for_key(Key::A), None);
    }

    #[test]
    fn test_gamepad_buttons() {
        assert_eq!(GamepadButtons::button(0), Some(GamepadButtons::BTN0));
        assert_eq!(GamepadButtons::button(7), Some(GamepadButtons::BTN7));
        assert_eq!(GamepadButtons::button(8), None);
    }

    #[test]
    fn test_char_to_key() {
        assert_eq!(char_to_key('a'), Some((Key::A, Modifiers::NONE)));
        assert_eq!(char_to_key('Q'), Some((Key::Q, Modifiers::LEFT_SHIFT)));
        assert_eq!(char_to_key('5'), Some((Key::NUM_5, Modifiers::NONE)));
        assert_eq!(char_to_key('0'), Some((Key::NUM_0, Modifiers::NONE)));
        assert_eq!(char_to_key('?'), Some((Key::SLASH, Modifiers::LEFT_SHIFT)));
        assert_eq!(char_to_key(' '), Some((Key::SPACEBAR, Modifiers::NONE)));
        assert_eq!(char_to_key('é'), None);
    }

    #[test]
    fn test_every_printable_ascii_is_mapped() {
        for b in 0x20u8..0x7F {
            assert!(char_to_key(b as char).is_some(), "{:?} has no mapping", b as char);
        }
    }
}
