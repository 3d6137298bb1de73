//! Keycode lookup with modifier overlays.
//!
//! On an overlay layer a transparent key does not simply fall through: it
//! sends the base layer's key with the overlay's modifier held around it, so
//! e.g. the whole base layer is reachable as Gui+key without a table entry
//! per combination. The lookup itself is pure; [`Resolved::apply`] performs
//! the synthesized press on a [`Host`].

use log::trace;

use crate::host::Host;
use crate::keycode::{Keycode, Mods};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Report this keycode through the normal pipeline.
    Key(Keycode),
    /// Send `key` once with `mods` held, outside the normal pipeline.
    Overlay { mods: Mods, key: Keycode },
}

impl Resolved {
    /// Carry out an overlay on `host` and return what the normal pipeline
    /// should report: [`Keycode::No`] after an overlay, the keycode otherwise.
    ///
    /// An overlay emits two reports, key down with the modifier and key up
    /// without it.
    pub fn apply<H: Host + ?Sized>(self, host: &mut H) -> Keycode {
        match self {
            Resolved::Key(keycode) => keycode,
            Resolved::Overlay { mods, key } => {
                trace!("overlay {:?}+{:?}", mods, key);
                host.add_weak_mods(mods);
                host.add_key(key);
                host.send_report();
                host.del_weak_mods(mods);
                host.del_key(key);
                host.send_report();
                Keycode::No
            }
        }
    }
}
