//! Action table entries, reached through the `FnN` keycodes.

use crate::keycode::{Keycode, Mods};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Send `key` with the given modifiers held for just that key.
    ModsKey(Mods, Keycode),
    /// Hold for the layer, tap for `key`.
    LayerTapKey(u8, Keycode),
    /// Layer active while the key is held.
    LayerMomentary(u8),
    /// Flip the layer on every press.
    LayerToggle(u8),
}

impl Action {
    /// Layer the action switches, if any.
    pub fn layer(self) -> Option<u8> {
        match self {
            Action::ModsKey(..) => None,
            Action::LayerTapKey(layer, _) | Action::LayerMomentary(layer) | Action::LayerToggle(layer) => {
                Some(layer)
            }
        }
    }
}
