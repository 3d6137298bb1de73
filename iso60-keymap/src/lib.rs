//! Keymap, action table and key dispatch for the ISO60 keyboard.
//!
//! This crate is `no_std`-compatible so it can be used by both the AVR
//! firmware and the native CLI tool. It is independent of the matrix scanner:
//! it takes stable rows as plain `u32` bitmasks.

#![no_std]

mod action;
pub mod dispatch;
pub mod host;
mod keycode;
mod resolve;
pub mod wiring;

pub use action::Action;
pub use keycode::{Keycode, Mods};
pub use resolve::Resolved;

use log::warn;
use wiring::{kmap, PhysicalLayout};

/// Number of rows in the matrix.
pub const ROWS: usize = 7;
/// Number of columns in the matrix.
pub const COLS: usize = 18;

/// One keymap layer in matrix order.
pub type Layer = [[Keycode; COLS]; ROWS];

/// Layer indices.
pub const LAYER_BASE: usize = 0;
/// Everything from the base layer with left Gui held, plus navigation.
pub const LAYER_LGUI: usize = 1;
/// AltGr symbols; other keys send left Alt + base key.
pub const LAYER_RALT: usize = 2;

/// Number of layers.
pub const NUM_LAYERS: usize = 3;

/// Release a held layer-tap key within this time to tap it.
pub const TAPPING_TERM_MS: u16 = 200;

/// A complete set of layers, overlays and actions.
pub struct Keymap<'a> {
    pub layers: &'a [Layer],
    /// Overlay layers and the modifier each one injects.
    pub overlays: &'a [(usize, Mods)],
    pub actions: &'a [Action],
}

impl Keymap<'_> {
    /// Raw table cell.
    pub fn keycode(&self, layer: usize, row: usize, col: usize) -> Keycode {
        self.layers[layer][row][col]
    }

    /// Modifier injected by an overlay layer.
    pub fn overlay_mods(&self, layer: usize) -> Option<Mods> {
        self.overlays
            .iter()
            .find(|&&(overlay, _)| overlay == layer)
            .map(|&(_, mods)| mods)
    }

    /// Look up the key at a matrix position on `layer`.
    ///
    /// A transparent cell on an overlay layer becomes an overlay of the base
    /// layer's key, unless the base layer has no key there.
    pub fn resolve(&self, layer: usize, row: usize, col: usize) -> Resolved {
        let current = self.keycode(layer, row, col);
        if let Some(mods) = self.overlay_mods(layer) {
            let base = self.keycode(LAYER_BASE, row, col);
            if current.is_transparent() && base != Keycode::No {
                return Resolved::Overlay { mods, key: base };
            }
        }
        Resolved::Key(current)
    }

    /// Action table entry by index.
    pub fn action(&self, index: usize) -> Action {
        self.actions[index]
    }

    /// Action behind an `FnN` keycode. `None` for other keycodes and for
    /// `FnN` keys with no table entry.
    pub fn action_for(&self, keycode: Keycode) -> Option<Action> {
        let index = keycode.fn_index()?;
        let action = self.actions.get(index).copied();
        if action.is_none() {
            warn!("no action for {:?}", keycode);
        }
        action
    }
}

const ___: Keycode = Keycode::Trans;

/// Shorthand aliases for readability.
const ESC: Keycode = Keycode::Escape;
const BSP: Keycode = Keycode::Backspace;
const TAB: Keycode = Keycode::Tab;
const ENT: Keycode = Keycode::Enter;
const CAPS: Keycode = Keycode::CapsLock;
const SPC: Keycode = Keycode::Space;
const DEL: Keycode = Keycode::Delete;
const INS: Keycode = Keycode::Insert;
const LSFT: Keycode = Keycode::LShift;
const RSFT: Keycode = Keycode::RShift;
const LALT: Keycode = Keycode::LAlt;
const RCTL: Keycode = Keycode::RCtrl;
const MINS: Keycode = Keycode::Minus;
const SCLN: Keycode = Keycode::Semicolon;
const QUOT: Keycode = Keycode::Quote;
const BSLS: Keycode = Keycode::Backslash;
const NUBS: Keycode = Keycode::NonUsBackslash;
const COMM: Keycode = Keycode::Comma;
const DOT: Keycode = Keycode::Dot;
const SLSH: Keycode = Keycode::Slash;
const PGUP: Keycode = Keycode::PageUp;
const PGDN: Keycode = Keycode::PageDown;
const HOME: Keycode = Keycode::Home;
const END: Keycode = Keycode::End;
const LEFT: Keycode = Keycode::Left;
const RGHT: Keycode = Keycode::Right;
/// Padding past the end of a short physical row.
const PAD: Keycode = Keycode::No;

use Keycode::*;

/// Layer 0: Finnish ISO QWERTY.
#[rustfmt::skip]
const BASE_LAYOUT: PhysicalLayout = [
    [ESC,  N1,   N2,   N3,   N4,   N5,   N6,   N7,   N8,   N9,   N0,   MINS, Fn14, BSP ],
    [TAB,  Q,    W,    E,    R,    T,    Y,    U,    I,    O,    P,    Fn10, Fn11, ENT ],
    [CAPS, A,    S,    D,    F,    G,    H,    J,    K,    L,    SCLN, QUOT, BSLS, PAD ],
    [LSFT, NUBS, Z,    X,    C,    V,    B,    N,    M,    COMM, DOT,  SLSH, RSFT, PAD ],
    [Fn0,  LALT, SPC,  Fn2,  RCTL, PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD ],
];

/// Layer 1: function keys and navigation, Gui+key everywhere else. Cells
/// over base action keys repeat the action, an overlay would put the raw
/// `FnN` code in the report.
#[rustfmt::skip]
const LGUI_LAYOUT: PhysicalLayout = [
    [___,  F1,   F2,   F3,   F4,   F5,   F6,   F7,   F8,   F9,   F10,  F11,  F12,  DEL ],
    [___,  ___,  ___,  Fn5,  Fn4,  Fn3,  ___,  PGUP, Up,   PGDN, HOME, Fn10, Fn11, ___ ],
    [___,  ___,  ___,  ___,  ___,  ___,  ___,  LEFT, Down, RGHT, END,  ___,  INS,  PAD ],
    [___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  PAD ],
    [Fn0,  ___,  ___,  Fn2,  ___,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD ],
];

/// Layer 2: AltGr symbols on the left hand, Alt+key everywhere else.
#[rustfmt::skip]
const RALT_LAYOUT: PhysicalLayout = [
    [___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  Fn14, ___ ],
    [___,  ___,  ___,  Fn10, Fn11, Fn8,  ___,  ___,  ___,  ___,  ___,  Fn10, Fn11, ___ ],
    [___,  Fn6,  Fn7,  Fn9,  Fn14, ___,  ___,  ___,  ___,  ___,  ___,  ___,  ___,  PAD ],
    [___,  ___,  ___,  ___,  Fn12, Fn13, ___,  ___,  ___,  ___,  ___,  ___,  ___,  PAD ],
    [Fn0,  ___,  ___,  Fn2,  ___,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD,  PAD ],
];

/// Keymap layers in matrix order.
pub static LAYERS: [Layer; NUM_LAYERS] = [
    kmap(&BASE_LAYOUT),
    kmap(&LGUI_LAYOUT),
    kmap(&RALT_LAYOUT),
];

/// Overlay layers. The AltGr layer injects *left* Alt around base keys.
pub static OVERLAYS: [(usize, Mods); 2] = [(LAYER_LGUI, Mods::LGUI), (LAYER_RALT, Mods::LALT)];

/// Action table, indexed by `FnN`.
pub static ACTIONS: [Action; 15] = [
    Action::LayerTapKey(LAYER_LGUI as u8, LGui),
    Action::LayerTapKey(LAYER_LGUI as u8, Space),
    Action::LayerMomentary(LAYER_RALT as u8),
    Action::ModsKey(Mods::LALT.with(Mods::LCTRL), Delete),
    Action::ModsKey(Mods::LGUI, R),
    Action::ModsKey(Mods::LGUI, L),
    Action::ModsKey(Mods::RALT, N2),         // @
    Action::ModsKey(Mods::RALT, N4),         // $
    Action::ModsKey(Mods::RALT, RBracket),   // ~
    Action::ModsKey(Mods::RALT, NonUsBackslash), // |
    Action::ModsKey(Mods::RALT, N7),         // {
    Action::ModsKey(Mods::RALT, N0),         // }
    Action::ModsKey(Mods::RALT, N8),         // [
    Action::ModsKey(Mods::RALT, N9),         // ]
    Action::ModsKey(Mods::RALT, Minus),      // backslash
];

/// The keymap this keyboard ships with.
pub static KEYMAP: Keymap<'static> = Keymap {
    layers: &LAYERS,
    overlays: &OVERLAYS,
    actions: &ACTIONS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiring::{matrix_position, PhysKey};

    fn at(phys_row: u8, phys_col: u8) -> (usize, usize) {
        matrix_position(PhysKey {
            row: phys_row,
            col: phys_col,
        })
        .unwrap()
    }

    #[test]
    fn test_base_layer_positions() {
        let (row, col) = at(0, 0);
        assert_eq!(KEYMAP.keycode(LAYER_BASE, row, col), Escape);
        let (row, col) = at(2, 1);
        assert_eq!(KEYMAP.keycode(LAYER_BASE, row, col), A);
        let (row, col) = at(4, 4);
        assert_eq!(KEYMAP.keycode(LAYER_BASE, row, col), RCtrl);
        // Unwired matrix cell.
        assert_eq!(KEYMAP.keycode(LAYER_BASE, 2, 0), Keycode::No);
    }

    #[test]
    fn test_direct_key_ignores_base() {
        // F1 on the Gui layer sits over 1 on the base layer.
        let (row, col) = at(0, 1);
        assert_eq!(KEYMAP.resolve(LAYER_LGUI, row, col), Resolved::Key(F1));
    }

    #[test]
    fn test_direct_key_regardless_of_base_content() {
        let mut base = [[Keycode::No; COLS]; ROWS];
        let mut top = [[Keycode::Trans; COLS]; ROWS];
        top[3][4] = Keycode::X;
        let overlays = [(1, Mods::LGUI)];
        for base_cell in [Keycode::No, Keycode::Trans, Keycode::A, Keycode::Fn0] {
            base[3][4] = base_cell;
            let layers = [base, top];
            let keymap = Keymap {
                layers: &layers,
                overlays: &overlays,
                actions: &[],
            };
            assert_eq!(keymap.resolve(1, 3, 4), Resolved::Key(Keycode::X));
        }
    }

    #[test]
    fn test_overlay_on_transparent_cell() {
        let (row, col) = at(1, 1);
        assert_eq!(
            KEYMAP.resolve(LAYER_LGUI, row, col),
            Resolved::Overlay {
                mods: Mods::LGUI,
                key: Q
            }
        );
        assert_eq!(
            KEYMAP.resolve(LAYER_RALT, row, col),
            Resolved::Overlay {
                mods: Mods::LALT,
                key: Q
            }
        );
    }

    #[test]
    fn test_overlay_pass_through_when_base_is_empty() {
        let mut base = [[Keycode::No; COLS]; ROWS];
        base[0][0] = Keycode::A;
        let top = [[Keycode::Trans; COLS]; ROWS];
        let layers = [base, top];
        let keymap = Keymap {
            layers: &layers,
            overlays: &[(1, Mods::LALT)],
            actions: &[],
        };
        assert_eq!(keymap.resolve(1, 0, 1), Resolved::Key(Keycode::Trans));
        assert!(matches!(keymap.resolve(1, 0, 0), Resolved::Overlay { .. }));
    }

    #[test]
    fn test_transparent_on_plain_layer_is_unchanged() {
        let base = [[Keycode::A; COLS]; ROWS];
        let top = [[Keycode::Trans; COLS]; ROWS];
        let layers = [base, top];
        let keymap = Keymap {
            layers: &layers,
            overlays: &[],
            actions: &[],
        };
        assert_eq!(keymap.resolve(1, 2, 2), Resolved::Key(Keycode::Trans));
    }

    #[test]
    fn test_base_layer_is_never_an_overlay() {
        for row in 0..ROWS {
            for col in 0..COLS {
                assert!(matches!(KEYMAP.resolve(LAYER_BASE, row, col), Resolved::Key(_)));
            }
        }
    }

    #[test]
    fn test_every_configured_action() {
        let expected = [
            Action::LayerTapKey(1, LGui),
            Action::LayerTapKey(1, Space),
            Action::LayerMomentary(2),
            Action::ModsKey(Mods::LALT | Mods::LCTRL, Delete),
            Action::ModsKey(Mods::LGUI, R),
            Action::ModsKey(Mods::LGUI, L),
            Action::ModsKey(Mods::RALT, N2),
            Action::ModsKey(Mods::RALT, N4),
            Action::ModsKey(Mods::RALT, RBracket),
            Action::ModsKey(Mods::RALT, NonUsBackslash),
            Action::ModsKey(Mods::RALT, N7),
            Action::ModsKey(Mods::RALT, N0),
            Action::ModsKey(Mods::RALT, N8),
            Action::ModsKey(Mods::RALT, N9),
            Action::ModsKey(Mods::RALT, Minus),
        ];
        for (index, action) in expected.iter().enumerate() {
            assert_eq!(KEYMAP.action(index), *action);
        }
        assert_eq!(KEYMAP.action_for(Fn3), Some(expected[3]));
        assert_eq!(KEYMAP.action_for(Fn15), None);
        assert_eq!(KEYMAP.action_for(A), None);
    }

    #[test]
    fn test_overlays_only_synthesize_report_keys() {
        for &(layer, _) in OVERLAYS.iter() {
            for row in 0..ROWS {
                for col in 0..COLS {
                    if let Resolved::Overlay { key, .. } = KEYMAP.resolve(layer, row, col) {
                        assert!(
                            key.is_key() || key.is_modifier(),
                            "layer {} ({}, {}) overlays {:?}",
                            layer,
                            row,
                            col,
                            key
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_base_action_keys_repeat_on_overlay_layers() {
        // Key right of P: AltGr+7 on every layer.
        let (row, col) = at(1, 11);
        for layer in [LAYER_BASE, LAYER_LGUI, LAYER_RALT] {
            assert_eq!(KEYMAP.resolve(layer, row, col), Resolved::Key(Fn10));
        }
    }

    #[test]
    fn test_every_fn_key_in_layers_has_an_action() {
        for layer in LAYERS.iter() {
            for keycode in layer.iter().flatten() {
                if keycode.fn_index().is_some() {
                    assert!(KEYMAP.action_for(*keycode).is_some(), "{:?}", keycode);
                }
            }
        }
    }
}
