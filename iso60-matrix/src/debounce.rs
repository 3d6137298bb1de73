//! Whole-matrix debounce logic.
//!
//! A single counter guards the entire matrix. Any row whose raw reading
//! differs from the last reading restarts it at [`DEBOUNCE`]; the counter
//! then drops by one per scan pass, and only when it reaches zero is the
//! in-flight state copied to the stable state. A key that keeps bouncing
//! therefore also delays every other key's change until it settles.

use log::debug;

use crate::{RowBits, BOUNCE_WAIT_MS, DEBOUNCE};

/// Result of one scan pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    /// Nothing in flight, stable state untouched.
    Idle,
    /// A change is still waiting out the debounce window.
    Debouncing,
    /// The in-flight state was copied to the stable state on this pass.
    Committed,
}

impl ScanStatus {
    /// Extra wait the scanner adds at the end of a pass with this status.
    pub fn wait_ms(self) -> u32 {
        match self {
            ScanStatus::Debouncing => BOUNCE_WAIT_MS,
            ScanStatus::Idle | ScanStatus::Committed => 0,
        }
    }
}

pub struct Debouncer<const ROWS: usize> {
    /// Externally visible state, 1 = pressed.
    stable: [RowBits; ROWS],
    /// Last raw reading of every row.
    debouncing: [RowBits; ROWS],
    /// Passes left until `debouncing` is committed. Zero when idle.
    counter: u8,
}

impl<const ROWS: usize> Debouncer<ROWS> {
    pub const fn new() -> Self {
        Self {
            stable: [0; ROWS],
            debouncing: [0; ROWS],
            counter: DEBOUNCE,
        }
    }

    /// Record the raw reading of one row. Returns true if it differs from the
    /// previous reading, which restarts the debounce window.
    pub fn observe(&mut self, row: usize, bits: RowBits) -> bool {
        if self.debouncing[row] == bits {
            return false;
        }

        self.debouncing[row] = bits;
        if self.counter != 0 {
            debug!("bounce!: {:02X}", self.counter);
        }
        self.counter = DEBOUNCE;
        true
    }

    /// Finish a scan pass: count the window down and commit when it runs out.
    pub fn settle(&mut self) -> ScanStatus {
        if self.counter == 0 {
            return ScanStatus::Idle;
        }

        self.counter -= 1;
        if self.counter != 0 {
            return ScanStatus::Debouncing;
        }

        self.stable = self.debouncing;
        debug!("matrix committed");
        ScanStatus::Committed
    }

    pub fn stable(&self) -> &[RowBits; ROWS] {
        &self.stable
    }

    pub fn is_on(&self, row: usize, col: usize) -> bool {
        self.stable[row] & (1 << col) != 0
    }

    pub fn row(&self, row: usize) -> RowBits {
        self.stable[row]
    }

    /// Remaining passes in the current debounce window.
    pub fn counter(&self) -> u8 {
        self.counter
    }
}

impl<const ROWS: usize> Default for Debouncer<ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed the same reading of every row for one pass.
    fn pass<const ROWS: usize>(d: &mut Debouncer<ROWS>, rows: [RowBits; ROWS]) -> ScanStatus {
        for (i, bits) in rows.iter().enumerate() {
            d.observe(i, *bits);
        }
        d.settle()
    }

    #[test]
    fn test_initial_window_commits_zero_state() {
        let mut d = Debouncer::<2>::new();
        for _ in 0..DEBOUNCE - 1 {
            assert_eq!(pass(&mut d, [0, 0]), ScanStatus::Debouncing);
        }
        assert_eq!(pass(&mut d, [0, 0]), ScanStatus::Committed);
        assert_eq!(pass(&mut d, [0, 0]), ScanStatus::Idle);
        assert_eq!(d.stable(), &[0, 0]);
    }

    #[test]
    fn test_change_needs_full_window() {
        let mut d = Debouncer::<2>::new();
        for _ in 0..DEBOUNCE {
            pass(&mut d, [0, 0]);
        }

        for _ in 0..DEBOUNCE - 1 {
            assert_eq!(pass(&mut d, [0b101, 0]), ScanStatus::Debouncing);
            assert_eq!(d.row(0), 0);
        }
        assert_eq!(pass(&mut d, [0b101, 0]), ScanStatus::Committed);
        assert_eq!(d.row(0), 0b101);
        assert!(d.is_on(0, 0));
        assert!(!d.is_on(0, 1));
        assert!(d.is_on(0, 2));
    }

    #[test]
    fn test_wait_only_while_debouncing() {
        assert_eq!(ScanStatus::Debouncing.wait_ms(), BOUNCE_WAIT_MS);
        assert_eq!(ScanStatus::Idle.wait_ms(), 0);
        assert_eq!(ScanStatus::Committed.wait_ms(), 0);
    }

    #[test]
    fn test_observe_restarts_window() {
        let mut d = Debouncer::<1>::new();
        d.settle();
        d.settle();
        assert_eq!(d.counter(), DEBOUNCE - 2);

        assert!(d.observe(0, 1));
        assert_eq!(d.counter(), DEBOUNCE);
        assert!(!d.observe(0, 1));
        assert_eq!(d.counter(), DEBOUNCE);
    }

    #[test]
    fn test_bounce_on_one_row_delays_other_row() {
        let mut d = Debouncer::<2>::new();
        for _ in 0..DEBOUNCE {
            pass(&mut d, [0, 0]);
        }

        // Row 1 settles immediately, row 0 keeps flipping.
        for i in 0..10 {
            let noisy = if i % 2 == 0 { 1 } else { 0 };
            assert_eq!(pass(&mut d, [noisy, 0b10]), ScanStatus::Debouncing);
            assert_eq!(d.row(1), 0);
        }
        for _ in 0..DEBOUNCE - 1 {
            pass(&mut d, [0, 0b10]);
        }
        assert_eq!(d.row(1), 0b10);
        assert_eq!(d.row(0), 0);
    }
}
