//! Keyboard report state and the host primitives the keymap drives.

use heapless::Vec;

use crate::keycode::{Keycode, Mods};

/// Standard USB HID boot keyboard report (8 bytes).
/// Byte 0: modifier keys bitmask
/// Byte 1: reserved (0x00)
/// Bytes 2-7: up to 6 simultaneous keycodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub reserved: u8,
    pub keys: [u8; 6],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            reserved: 0,
            keys: [0; 6],
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.modifiers;
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }
}

/// Primitives for building and sending reports.
pub trait Host {
    /// Modifiers held by physical modifier keys.
    fn add_mods(&mut self, mods: Mods);
    fn del_mods(&mut self, mods: Mods);
    /// Modifiers held only for the duration of one synthesized key.
    fn add_weak_mods(&mut self, mods: Mods);
    fn del_weak_mods(&mut self, mods: Mods);
    fn add_key(&mut self, key: Keycode);
    fn del_key(&mut self, key: Keycode);
    /// Send the current report now.
    fn send_report(&mut self);
}

/// Where finished reports go, e.g. the USB interrupt endpoint.
pub trait ReportSink {
    fn send(&mut self, report: &KeyboardReport);
}

/// Current report contents. Keys beyond six are dropped, no rollover error.
///
/// Weak modifiers are counted per bit: every synthesized key that holds one
/// adds a reference, so an overlay or a second `ModsKey` releasing the same
/// modifier does not strip it from a key that is still down.
#[derive(Clone, Debug, Default)]
pub struct ReportBuffer {
    mods: Mods,
    weak_counts: [u8; 8],
    keys: Vec<Keycode, 6>,
}

impl ReportBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mods(&mut self, mods: Mods) {
        self.mods |= mods;
    }

    pub fn del_mods(&mut self, mods: Mods) {
        self.mods = self.mods.without(mods);
    }

    pub fn add_weak_mods(&mut self, mods: Mods) {
        for (bit, count) in self.weak_counts.iter_mut().enumerate() {
            if mods.bits() & (1 << bit) != 0 {
                *count = count.saturating_add(1);
            }
        }
    }

    pub fn del_weak_mods(&mut self, mods: Mods) {
        for (bit, count) in self.weak_counts.iter_mut().enumerate() {
            if mods.bits() & (1 << bit) != 0 {
                *count = count.saturating_sub(1);
            }
        }
    }

    /// Weak modifiers held by at least one synthesized key.
    pub fn weak_mods(&self) -> Mods {
        let bits = self
            .weak_counts
            .iter()
            .enumerate()
            .filter(|&(_, count)| *count != 0)
            .fold(0, |bits, (bit, _)| bits | (1 << bit));
        Mods(bits)
    }

    pub fn add_key(&mut self, key: Keycode) {
        if !self.keys.contains(&key) {
            // Full report: silently drop.
            let _ = self.keys.push(key);
        }
    }

    pub fn del_key(&mut self, key: Keycode) {
        if let Some(index) = self.keys.iter().position(|&k| k == key) {
            self.keys.remove(index);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) -> KeyboardReport {
        let mut report = KeyboardReport::empty();
        report.modifiers = (self.mods | self.weak_mods()).bits();
        for (slot, key) in report.keys.iter_mut().zip(self.keys.iter()) {
            *slot = *key as u8;
        }
        report
    }
}

/// A [`Host`] that keeps a [`ReportBuffer`] and sends it to a sink.
pub struct ReportHost<S> {
    buffer: ReportBuffer,
    sink: S,
}

impl<S: ReportSink> ReportHost<S> {
    pub fn new(sink: S) -> Self {
        Self {
            buffer: ReportBuffer::new(),
            sink,
        }
    }

    pub fn buffer(&self) -> &ReportBuffer {
        &self.buffer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: ReportSink> Host for ReportHost<S> {
    fn add_mods(&mut self, mods: Mods) {
        self.buffer.add_mods(mods);
    }

    fn del_mods(&mut self, mods: Mods) {
        self.buffer.del_mods(mods);
    }

    fn add_weak_mods(&mut self, mods: Mods) {
        self.buffer.add_weak_mods(mods);
    }

    fn del_weak_mods(&mut self, mods: Mods) {
        self.buffer.del_weak_mods(mods);
    }

    fn add_key(&mut self, key: Keycode) {
        self.buffer.add_key(key);
    }

    fn del_key(&mut self, key: Keycode) {
        self.buffer.del_key(key);
    }

    fn send_report(&mut self) {
        let report = self.buffer.report();
        self.sink.send(&report);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use heapless::Vec;

    use super::Host;
    use crate::keycode::{Keycode, Mods};

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        AddMods(Mods),
        DelMods(Mods),
        AddWeakMods(Mods),
        DelWeakMods(Mods),
        AddKey(Keycode),
        DelKey(Keycode),
        Send,
    }

    /// Records every host call in order.
    pub struct RecordingHost {
        pub calls: Vec<Call, 64>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self { calls: Vec::new() }
        }

        fn record(&mut self, call: Call) {
            self.calls.push(call).expect("recording host full");
        }
    }

    impl Host for RecordingHost {
        fn add_mods(&mut self, mods: Mods) {
            self.record(Call::AddMods(mods));
        }

        fn del_mods(&mut self, mods: Mods) {
            self.record(Call::DelMods(mods));
        }

        fn add_weak_mods(&mut self, mods: Mods) {
            self.record(Call::AddWeakMods(mods));
        }

        fn del_weak_mods(&mut self, mods: Mods) {
            self.record(Call::DelWeakMods(mods));
        }

        fn add_key(&mut self, key: Keycode) {
            self.record(Call::AddKey(key));
        }

        fn del_key(&mut self, key: Keycode) {
            self.record(Call::DelKey(key));
        }

        fn send_report(&mut self) {
            self.record(Call::Send);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LastReport(Option<KeyboardReport>, usize);

    impl ReportSink for LastReport {
        fn send(&mut self, report: &KeyboardReport) {
            self.0 = Some(*report);
            self.1 += 1;
        }
    }

    #[test]
    fn test_report_contents() {
        let mut buffer = ReportBuffer::new();
        buffer.add_mods(Mods::LSHIFT);
        buffer.add_weak_mods(Mods::RALT);
        buffer.add_key(Keycode::A);
        buffer.add_key(Keycode::B);
        buffer.add_key(Keycode::A);

        let report = buffer.report();
        assert_eq!(report.modifiers, 0x42);
        assert_eq!(report.keys, [0x04, 0x05, 0, 0, 0, 0]);
        assert_eq!(report.to_bytes(), [0x42, 0, 0x04, 0x05, 0, 0, 0, 0]);
    }

    #[test]
    fn test_del_key_keeps_order() {
        let mut buffer = ReportBuffer::new();
        buffer.add_key(Keycode::A);
        buffer.add_key(Keycode::B);
        buffer.add_key(Keycode::C);
        buffer.del_key(Keycode::B);
        assert_eq!(buffer.report().keys, [0x04, 0x06, 0, 0, 0, 0]);
    }

    #[test]
    fn test_seventh_key_dropped() {
        let mut buffer = ReportBuffer::new();
        for key in [Keycode::A, Keycode::B, Keycode::C, Keycode::D, Keycode::E, Keycode::F, Keycode::G] {
            buffer.add_key(key);
        }
        assert_eq!(buffer.report().keys, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn test_weak_mods_independent_of_real_mods() {
        let mut buffer = ReportBuffer::new();
        buffer.add_mods(Mods::LALT);
        buffer.add_weak_mods(Mods::LALT);
        buffer.del_weak_mods(Mods::LALT);
        assert_eq!(buffer.report().modifiers, Mods::LALT.bits());
    }

    #[test]
    fn test_weak_mods_counted_per_holder() {
        let mut buffer = ReportBuffer::new();
        buffer.add_weak_mods(Mods::LGUI);
        buffer.add_weak_mods(Mods::LGUI | Mods::LALT);
        buffer.del_weak_mods(Mods::LGUI | Mods::LALT);
        assert_eq!(buffer.weak_mods(), Mods::LGUI);

        buffer.del_weak_mods(Mods::LGUI);
        assert_eq!(buffer.weak_mods(), Mods::NONE);
        // Unbalanced release stays at zero.
        buffer.del_weak_mods(Mods::LGUI);
        buffer.add_weak_mods(Mods::LGUI);
        assert_eq!(buffer.report().modifiers, Mods::LGUI.bits());
    }

    #[test]
    fn test_report_host_sends_to_sink() {
        let mut host = ReportHost::new(LastReport(None, 0));
        host.add_key(Keycode::Q);
        host.send_report();
        host.del_key(Keycode::Q);
        host.send_report();

        assert_eq!(host.sink().1, 2);
        assert_eq!(host.sink().0, Some(KeyboardReport::empty()));
    }
}
