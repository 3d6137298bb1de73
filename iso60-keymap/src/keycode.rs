//! Keycodes and modifier masks.

use core::ops::{BitOr, BitOrAssign};

/// USB HID keycodes, plus the two keymap markers and the action keys.
/// See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Keycode {
    /// No key at this position.
    No = 0x00,
    /// Transparent: defer to the next lower active layer.
    Trans = 0x01,

    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Numbers
    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LBracket = 0x2F,
    RBracket = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Dot = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,
    /// Non-US \ and | (ISO key left of Z, < > on Finnish layouts)
    NonUsBackslash = 0x64,

    // Function keys
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    // Action keys, index into the action table
    Fn0 = 0xC0,
    Fn1 = 0xC1,
    Fn2 = 0xC2,
    Fn3 = 0xC3,
    Fn4 = 0xC4,
    Fn5 = 0xC5,
    Fn6 = 0xC6,
    Fn7 = 0xC7,
    Fn8 = 0xC8,
    Fn9 = 0xC9,
    Fn10 = 0xCA,
    Fn11 = 0xCB,
    Fn12 = 0xCC,
    Fn13 = 0xCD,
    Fn14 = 0xCE,
    Fn15 = 0xCF,

    // Modifiers (used in the modifier byte, not in keycode array)
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl Keycode {
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&(self as u8))
    }

    /// The modifier mask for a modifier key, empty for anything else.
    pub fn mods(self) -> Mods {
        if self.is_modifier() {
            Mods(1 << (self as u8 - 0xE0))
        } else {
            Mods::NONE
        }
    }

    /// Action table index of an `FnN` key.
    pub fn fn_index(self) -> Option<usize> {
        let v = self as u8;
        (0xC0..=0xCF).contains(&v).then(|| (v - 0xC0) as usize)
    }

    pub fn is_transparent(self) -> bool {
        self == Keycode::Trans
    }

    /// Keys that put something in the report's key array.
    pub fn is_key(self) -> bool {
        !matches!(self, Keycode::No | Keycode::Trans) && !self.is_modifier() && self.fn_index().is_none()
    }

    /// Label as printed on a Finnish ISO keycap.
    pub fn display_name(self) -> &'static str {
        match self {
            Keycode::No => "",
            Keycode::Trans => "",
            Keycode::A => "A",
            Keycode::B => "B",
            Keycode::C => "C",
            Keycode::D => "D",
            Keycode::E => "E",
            Keycode::F => "F",
            Keycode::G => "G",
            Keycode::H => "H",
            Keycode::I => "I",
            Keycode::J => "J",
            Keycode::K => "K",
            Keycode::L => "L",
            Keycode::M => "M",
            Keycode::N => "N",
            Keycode::O => "O",
            Keycode::P => "P",
            Keycode::Q => "Q",
            Keycode::R => "R",
            Keycode::S => "S",
            Keycode::T => "T",
            Keycode::U => "U",
            Keycode::V => "V",
            Keycode::W => "W",
            Keycode::X => "X",
            Keycode::Y => "Y",
            Keycode::Z => "Z",
            Keycode::N1 => "1",
            Keycode::N2 => "2",
            Keycode::N3 => "3",
            Keycode::N4 => "4",
            Keycode::N5 => "5",
            Keycode::N6 => "6",
            Keycode::N7 => "7",
            Keycode::N8 => "8",
            Keycode::N9 => "9",
            Keycode::N0 => "0",
            Keycode::Enter => "Ent",
            Keycode::Escape => "Esc",
            Keycode::Backspace => "Bksp",
            Keycode::Tab => "Tab",
            Keycode::Space => "Spc",
            Keycode::Minus => "+?",
            Keycode::Equal => "\u{b4}`",
            Keycode::LBracket => "\u{e5}",
            Keycode::RBracket => "\u{a8}^",
            Keycode::Backslash => "'*",
            Keycode::Semicolon => "\u{f6}",
            Keycode::Quote => "\u{e4}",
            Keycode::Grave => "\u{a7}\u{bd}",
            Keycode::Comma => ",",
            Keycode::Dot => ".",
            Keycode::Slash => "-_",
            Keycode::CapsLock => "Caps",
            Keycode::NonUsBackslash => "<>",
            Keycode::F1 => "F1",
            Keycode::F2 => "F2",
            Keycode::F3 => "F3",
            Keycode::F4 => "F4",
            Keycode::F5 => "F5",
            Keycode::F6 => "F6",
            Keycode::F7 => "F7",
            Keycode::F8 => "F8",
            Keycode::F9 => "F9",
            Keycode::F10 => "F10",
            Keycode::F11 => "F11",
            Keycode::F12 => "F12",
            Keycode::PrintScreen => "PScr",
            Keycode::ScrollLock => "ScrL",
            Keycode::Pause => "Paus",
            Keycode::Insert => "Ins",
            Keycode::Home => "Home",
            Keycode::PageUp => "PgUp",
            Keycode::Delete => "Del",
            Keycode::End => "End",
            Keycode::PageDown => "PgDn",
            Keycode::Right => "\u{2192}",
            Keycode::Left => "\u{2190}",
            Keycode::Down => "\u{2193}",
            Keycode::Up => "\u{2191}",
            Keycode::Fn0 => "Fn0",
            Keycode::Fn1 => "Fn1",
            Keycode::Fn2 => "Fn2",
            Keycode::Fn3 => "Fn3",
            Keycode::Fn4 => "Fn4",
            Keycode::Fn5 => "Fn5",
            Keycode::Fn6 => "Fn6",
            Keycode::Fn7 => "Fn7",
            Keycode::Fn8 => "Fn8",
            Keycode::Fn9 => "Fn9",
            Keycode::Fn10 => "Fn10",
            Keycode::Fn11 => "Fn11",
            Keycode::Fn12 => "Fn12",
            Keycode::Fn13 => "Fn13",
            Keycode::Fn14 => "Fn14",
            Keycode::Fn15 => "Fn15",
            Keycode::LCtrl => "Ctrl",
            Keycode::LShift => "Shft",
            Keycode::LAlt => "Alt",
            Keycode::LGui => "Gui",
            Keycode::RCtrl => "RCtl",
            Keycode::RShift => "RSft",
            Keycode::RAlt => "AltGr",
            Keycode::RGui => "RGui",
        }
    }
}

/// Modifier bitmask as it appears in the report (bit 0 = LCtrl, bit 7 = RGui).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Mods(pub u8);

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const LCTRL: Mods = Mods(0x01);
    pub const LSHIFT: Mods = Mods(0x02);
    pub const LALT: Mods = Mods(0x04);
    pub const LGUI: Mods = Mods(0x08);
    pub const RCTRL: Mods = Mods(0x10);
    pub const RSHIFT: Mods = Mods(0x20);
    pub const RALT: Mods = Mods(0x40);
    pub const RGUI: Mods = Mods(0x80);

    /// `const` spelling of `|`, for the static tables.
    pub const fn with(self, other: Mods) -> Mods {
        Mods(self.0 | other.0)
    }

    pub const fn without(self, other: Mods) -> Mods {
        Mods(self.0 & !other.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Short label such as `Ctrl+Alt`.
    pub fn display_name(self) -> &'static str {
        match self {
            Mods::NONE => "",
            Mods::LCTRL => "Ctrl",
            Mods::LSHIFT => "Shft",
            Mods::LALT => "Alt",
            Mods::LGUI => "Gui",
            Mods::RALT => "AltGr",
            m if m == Mods::LCTRL.with(Mods::LALT) => "Ctrl+Alt",
            _ => "Mods",
        }
    }
}

impl BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Mods) -> Mods {
        self.with(rhs)
    }
}

impl BitOrAssign for Mods {
    fn bitor_assign(&mut self, rhs: Mods) {
        self.0 |= rhs.0;
    }
}
