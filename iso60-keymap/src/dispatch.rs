//! Turns stable matrix changes into host calls.
//!
//! Each press is resolved once, on the layers active at that moment, and the
//! outcome is remembered per key so the release undoes exactly that, even if
//! the layers changed in between. Overlay presses are sent in full at press
//! time and their release does nothing.

use log::{debug, trace};

use crate::host::Host;
use crate::{Action, Keycode, Keymap, Mods, Resolved, COLS, ROWS, TAPPING_TERM_MS};

/// What a held key did on press.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Held {
    Nothing,
    Key(Keycode),
    ModsKey(Mods, Keycode),
    Layer(u8),
    LayerTap {
        layer: u8,
        key: Keycode,
        since: u16,
        interrupted: bool,
    },
}

/// Active layers. The base layer is always on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerState {
    momentary: u8,
    toggled: u8,
}

impl LayerState {
    fn mask(self) -> u8 {
        self.momentary | self.toggled | 1
    }

    pub fn is_active(self, layer: usize) -> bool {
        layer < 8 && self.mask() & (1 << layer) != 0
    }

    /// Highest active layer.
    pub fn highest(self) -> usize {
        7 - self.mask().leading_zeros() as usize
    }

    fn on(&mut self, layer: u8) {
        self.momentary |= 1 << layer;
    }

    fn off(&mut self, layer: u8) {
        self.momentary &= !(1 << layer);
    }

    fn toggle(&mut self, layer: u8) {
        self.toggled ^= 1 << layer;
    }
}

pub struct Keyboard<'k> {
    keymap: &'k Keymap<'k>,
    previous: [u32; ROWS],
    held: [[Held; COLS]; ROWS],
    layers: LayerState,
}

impl<'k> Keyboard<'k> {
    pub fn new(keymap: &'k Keymap<'k>) -> Self {
        Self {
            keymap,
            previous: [0; ROWS],
            held: [[Held::Nothing; COLS]; ROWS],
            layers: LayerState::default(),
        }
    }

    pub fn layers(&self) -> LayerState {
        self.layers
    }

    /// Process a new stable matrix. Releases are handled before presses, each
    /// in row-major order. `now` is a free-running millisecond count.
    pub fn task<H: Host + ?Sized>(&mut self, rows: &[u32; ROWS], now: u16, host: &mut H) {
        for row in 0..ROWS {
            let released = self.previous[row] & !rows[row];
            for col in (0..COLS).filter(|col| released & (1 << col) != 0) {
                self.release(row, col, now, host);
            }
        }
        for row in 0..ROWS {
            let pressed = rows[row] & !self.previous[row];
            for col in (0..COLS).filter(|col| pressed & (1 << col) != 0) {
                self.press(row, col, now, host);
            }
        }
        self.previous = *rows;
    }

    /// Resolve a position on the active layers, walking down past
    /// transparent cells.
    pub fn lookup(&self, row: usize, col: usize) -> Resolved {
        for layer in (0..=self.layers.highest()).rev() {
            if !self.layers.is_active(layer) || layer >= self.keymap.layers.len() {
                continue;
            }
            match self.keymap.resolve(layer, row, col) {
                Resolved::Key(Keycode::Trans) => continue,
                resolved => return resolved,
            }
        }
        Resolved::Key(Keycode::No)
    }

    fn press<H: Host + ?Sized>(&mut self, row: usize, col: usize, now: u16, host: &mut H) {
        for held in self.held.iter_mut().flatten() {
            if let Held::LayerTap { interrupted, .. } = held {
                *interrupted = true;
            }
        }

        let resolved = self.lookup(row, col);
        trace!("press ({}, {}) -> {:?}", row, col, resolved);
        let keycode = resolved.apply(host);
        self.held[row][col] = match self.keymap.action_for(keycode) {
            Some(action) => self.start(action, now, host),
            None => register(keycode, host),
        };
    }

    fn release<H: Host + ?Sized>(&mut self, row: usize, col: usize, now: u16, host: &mut H) {
        let held = core::mem::replace(&mut self.held[row][col], Held::Nothing);
        trace!("release ({}, {}) {:?}", row, col, held);
        match held {
            Held::Nothing => {}
            Held::Key(keycode) => unregister(keycode, host),
            Held::ModsKey(mods, key) => {
                host.del_weak_mods(mods);
                host.del_key(key);
                host.send_report();
            }
            Held::Layer(layer) => {
                self.layers.off(layer);
                debug!("layer {} off", layer);
            }
            Held::LayerTap {
                layer,
                key,
                since,
                interrupted,
            } => {
                self.layers.off(layer);
                if !interrupted && now.wrapping_sub(since) < TAPPING_TERM_MS {
                    debug!("tap {:?}", key);
                    register(key, host);
                    unregister(key, host);
                } else {
                    debug!("layer {} off", layer);
                }
            }
        }
    }

    fn start<H: Host + ?Sized>(&mut self, action: Action, now: u16, host: &mut H) -> Held {
        trace!("action {:?}", action);
        match action {
            Action::ModsKey(mods, key) => {
                host.add_weak_mods(mods);
                host.add_key(key);
                host.send_report();
                Held::ModsKey(mods, key)
            }
            Action::LayerMomentary(layer) => {
                self.layers.on(layer);
                debug!("layer {} on", layer);
                Held::Layer(layer)
            }
            Action::LayerToggle(layer) => {
                self.layers.toggle(layer);
                debug!("layer {} toggled", layer);
                Held::Nothing
            }
            Action::LayerTapKey(layer, key) => {
                self.layers.on(layer);
                debug!("layer {} on (tap for {:?})", layer, key);
                Held::LayerTap {
                    layer,
                    key,
                    since: now,
                    interrupted: false,
                }
            }
        }
    }
}

fn register<H: Host + ?Sized>(keycode: Keycode, host: &mut H) -> Held {
    if keycode.is_modifier() {
        host.add_mods(keycode.mods());
    } else if keycode.is_key() {
        host.add_key(keycode);
    } else {
        return Held::Nothing;
    }
    host.send_report();
    Held::Key(keycode)
}

fn unregister<H: Host + ?Sized>(keycode: Keycode, host: &mut H) {
    if keycode.is_modifier() {
        host.del_mods(keycode.mods());
    } else {
        host.del_key(keycode);
    }
    host.send_report();
}
