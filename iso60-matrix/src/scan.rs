//! Row-by-row matrix scanning.
//!
//! Rows are selected one at a time by driving them low; unselected rows are
//! left floating as plain inputs so only one row can ever pull a column down.
//! Columns are inputs with pull-ups, so a pressed switch on the selected row
//! reads low. The order of the column lines is the column numbering: bit `n`
//! of a row is `cols[n]`.

use embedded_hal::delay::DelayNs;

use crate::debounce::{Debouncer, ScanStatus};
use crate::dump::Dump;
use crate::line::{Direction, Level, Line};
use crate::{RowBits, SETTLE_US};

pub struct Matrix<R, C, D, const ROWS: usize, const COLS: usize> {
    rows: [R; ROWS],
    cols: [C; COLS],
    delay: D,
    debouncer: Debouncer<ROWS>,
}

impl<R, C, D, const ROWS: usize, const COLS: usize> Matrix<R, C, D, ROWS, COLS>
where
    R: Line,
    C: Line,
    D: DelayNs,
{
    const COLS_FIT: () = assert!(COLS <= RowBits::BITS as usize, "too many columns for RowBits");

    /// Take ownership of the lines and configure them for scanning.
    pub fn new(rows: [R; ROWS], cols: [C; COLS], delay: D) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::COLS_FIT;

        let mut matrix = Self {
            rows,
            cols,
            delay,
            debouncer: Debouncer::new(),
        };
        matrix.init();
        matrix
    }

    /// Put every line in its idle configuration and forget all key state.
    pub fn init(&mut self) {
        self.unselect_rows();
        for col in self.cols.iter_mut() {
            col.set_direction(Direction::InputPullUp);
        }
        self.debouncer = Debouncer::new();
    }

    /// Run one full pass over all rows.
    pub fn scan(&mut self) -> ScanStatus {
        for row in 0..ROWS {
            self.select_row(row);
            self.delay.delay_us(SETTLE_US);
            let bits = self.read_cols();
            self.debouncer.observe(row, bits);
            self.unselect_rows();
        }

        let status = self.debouncer.settle();
        let wait = status.wait_ms();
        if wait != 0 {
            self.delay.delay_ms(wait);
        }
        status
    }

    pub fn is_on(&self, row: usize, col: usize) -> bool {
        self.debouncer.is_on(row, col)
    }

    pub fn row(&self, row: usize) -> RowBits {
        self.debouncer.row(row)
    }

    /// The whole stable matrix.
    pub fn rows(&self) -> &[RowBits; ROWS] {
        self.debouncer.stable()
    }

    /// Number of keys currently pressed in the stable matrix.
    pub fn key_count(&self) -> u32 {
        self.rows().iter().map(|bits| bits.count_ones()).sum()
    }

    pub fn dump(&self) -> Dump<'_, ROWS> {
        Dump(self.debouncer.stable())
    }

    fn select_row(&mut self, row: usize) {
        let line = &mut self.rows[row];
        line.set_level(Level::Low);
        line.set_direction(Direction::Output);
    }

    fn unselect_rows(&mut self) {
        for line in self.rows.iter_mut() {
            line.set_direction(Direction::Input);
        }
    }

    /// Sample every column, 1 = pulled low by a pressed switch.
    fn read_cols(&mut self) -> RowBits {
        self.cols
            .iter_mut()
            .enumerate()
            .fold(0, |bits, (col, line)| {
                if line.read_level().is_low() {
                    bits | (1 << col)
                } else {
                    bits
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBoard, SimDelay};
    use crate::{BOUNCE_WAIT_MS, DEBOUNCE};

    fn settle<R: Line, C: Line, D: DelayNs, const ROWS: usize, const COLS: usize>(
        matrix: &mut Matrix<R, C, D, ROWS, COLS>,
    ) {
        for _ in 0..DEBOUNCE {
            matrix.scan();
        }
    }

    #[test]
    fn test_init_configures_lines() {
        let board = SimBoard::<3, 4>::new();
        let _matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());

        for row in 0..3 {
            assert_eq!(board.row_direction(row), Direction::Input);
        }
        for col in 0..4 {
            assert_eq!(board.col_direction(col), Direction::InputPullUp);
        }
    }

    #[test]
    fn test_held_keys_become_stable() {
        let board = SimBoard::<7, 18>::new();
        let mut matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());
        settle(&mut matrix);

        board.set_row(0, 0b101);
        for _ in 0..DEBOUNCE - 1 {
            assert_eq!(matrix.scan(), ScanStatus::Debouncing);
            assert_eq!(matrix.row(0), 0);
        }
        assert_eq!(matrix.scan(), ScanStatus::Committed);

        assert!(matrix.is_on(0, 0));
        assert!(!matrix.is_on(0, 1));
        assert!(matrix.is_on(0, 2));
        assert_eq!(matrix.row(0), 0b101);
        assert_eq!(matrix.row(1), 0);
        assert_eq!(matrix.key_count(), 2);
    }

    #[test]
    fn test_unchanged_input_is_idempotent() {
        let board = SimBoard::<2, 3>::new();
        board.press(1, 2);
        let mut matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());
        settle(&mut matrix);
        assert_eq!(matrix.rows(), &[0, 0b100]);

        for _ in 0..20 {
            assert_eq!(matrix.scan(), ScanStatus::Idle);
            assert_eq!(matrix.rows(), &[0, 0b100]);
        }
    }

    #[test]
    fn test_short_bounce_is_rejected() {
        let board = SimBoard::<2, 3>::new();
        let mut matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());
        settle(&mut matrix);

        board.press(0, 1);
        matrix.scan();
        matrix.scan();
        board.release(0, 1);
        for _ in 0..2 * DEBOUNCE {
            matrix.scan();
            assert_eq!(matrix.row(0), 0);
        }
    }

    #[test]
    fn test_columns_only_see_the_selected_row() {
        let board = SimBoard::<3, 3>::new();
        board.press(0, 0);
        board.press(2, 1);
        let mut matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());
        settle(&mut matrix);

        assert_eq!(matrix.rows(), &[0b001, 0, 0b010]);
        assert_eq!(board.max_selected(), 1);
        for row in 0..3 {
            assert_eq!(board.row_direction(row), Direction::Input);
        }
    }

    #[test]
    fn test_scan_waits_for_settling() {
        let board = SimBoard::<7, 18>::new();
        let delay = SimDelay::new();
        let mut matrix = Matrix::new(board.rows(), board.cols(), &delay);

        // First pass is still inside the startup window.
        matrix.scan();
        let settle_ns = 7 * SETTLE_US as u64 * 1_000;
        assert_eq!(delay.waited_ns(), settle_ns + BOUNCE_WAIT_MS as u64 * 1_000_000);

        settle(&mut matrix);
        let before = delay.waited_ns();
        assert_eq!(matrix.scan(), ScanStatus::Idle);
        assert_eq!(delay.waited_ns() - before, settle_ns);
    }

    #[test]
    fn test_init_forgets_state() {
        let board = SimBoard::<1, 2>::new();
        board.press(0, 1);
        let mut matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());
        settle(&mut matrix);
        assert_eq!(matrix.row(0), 0b10);

        matrix.init();
        assert_eq!(matrix.row(0), 0);
    }
}
