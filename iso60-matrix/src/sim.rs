//! In-memory switch matrix for tests and the host-side replay tool.
//!
//! A [`SimBoard`] holds which switches are closed and hands out row and
//! column [`Line`]s that share it. A column reads low only while a row that
//! is driven low has a closed switch on that column, so the scanner sees
//! exactly what real diodeless wiring would show it.

use core::cell::{Cell, RefCell};

use embedded_hal::delay::DelayNs;

use crate::line::{Direction, Level, Line};
use crate::RowBits;

struct State<const ROWS: usize, const COLS: usize> {
    pressed: [RowBits; ROWS],
    row_direction: [Direction; ROWS],
    row_level: [Level; ROWS],
    col_direction: [Direction; COLS],
    max_selected: usize,
}

impl<const ROWS: usize, const COLS: usize> State<ROWS, COLS> {
    fn is_selected(&self, row: usize) -> bool {
        self.row_direction[row] == Direction::Output && self.row_level[row] == Level::Low
    }

    fn track_selection(&mut self) {
        let selected = (0..ROWS).filter(|&row| self.is_selected(row)).count();
        self.max_selected = self.max_selected.max(selected);
    }

    fn col_level(&self, col: usize) -> Level {
        let pulled_down = (0..ROWS).any(|row| self.is_selected(row) && self.pressed[row] & (1 << col) != 0);
        if pulled_down {
            return Level::Low;
        }
        match self.col_direction[col] {
            Direction::InputPullUp => Level::High,
            // A floating input reads as noise; report it as pressed so a
            // missing pull-up is obvious.
            Direction::Input | Direction::Output => Level::Low,
        }
    }
}

pub struct SimBoard<const ROWS: usize, const COLS: usize> {
    state: RefCell<State<ROWS, COLS>>,
}

impl<const ROWS: usize, const COLS: usize> SimBoard<ROWS, COLS> {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                pressed: [0; ROWS],
                row_direction: [Direction::Input; ROWS],
                row_level: [Level::High; ROWS],
                col_direction: [Direction::Input; COLS],
                max_selected: 0,
            }),
        }
    }

    /// Row lines, in row order.
    pub fn rows(&self) -> [SimRow<'_, ROWS, COLS>; ROWS] {
        core::array::from_fn(|index| SimRow { board: self, index })
    }

    /// Column lines, in column order.
    pub fn cols(&self) -> [SimCol<'_, ROWS, COLS>; COLS] {
        core::array::from_fn(|index| SimCol { board: self, index })
    }

    /// Replace the closed switches of one row.
    pub fn set_row(&self, row: usize, bits: RowBits) {
        self.state.borrow_mut().pressed[row] = bits;
    }

    pub fn set_rows(&self, rows: &[RowBits; ROWS]) {
        self.state.borrow_mut().pressed = *rows;
    }

    pub fn press(&self, row: usize, col: usize) {
        self.state.borrow_mut().pressed[row] |= 1 << col;
    }

    pub fn release(&self, row: usize, col: usize) {
        self.state.borrow_mut().pressed[row] &= !(1 << col);
    }

    pub fn row_direction(&self, row: usize) -> Direction {
        self.state.borrow().row_direction[row]
    }

    pub fn col_direction(&self, col: usize) -> Direction {
        self.state.borrow().col_direction[col]
    }

    /// Largest number of rows that were driven low at the same time.
    pub fn max_selected(&self) -> usize {
        self.state.borrow().max_selected
    }
}

impl<const ROWS: usize, const COLS: usize> Default for SimBoard<ROWS, COLS> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimRow<'a, const ROWS: usize, const COLS: usize> {
    board: &'a SimBoard<ROWS, COLS>,
    index: usize,
}

impl<const ROWS: usize, const COLS: usize> Line for SimRow<'_, ROWS, COLS> {
    fn set_direction(&mut self, direction: Direction) {
        let mut state = self.board.state.borrow_mut();
        state.row_direction[self.index] = direction;
        state.track_selection();
    }

    fn set_level(&mut self, level: Level) {
        let mut state = self.board.state.borrow_mut();
        state.row_level[self.index] = level;
        state.track_selection();
    }

    fn read_level(&mut self) -> Level {
        let state = self.board.state.borrow();
        match state.row_direction[self.index] {
            Direction::Output => state.row_level[self.index],
            Direction::Input | Direction::InputPullUp => Level::High,
        }
    }
}

pub struct SimCol<'a, const ROWS: usize, const COLS: usize> {
    board: &'a SimBoard<ROWS, COLS>,
    index: usize,
}

impl<const ROWS: usize, const COLS: usize> Line for SimCol<'_, ROWS, COLS> {
    fn set_direction(&mut self, direction: Direction) {
        self.board.state.borrow_mut().col_direction[self.index] = direction;
    }

    fn set_level(&mut self, _level: Level) {}

    fn read_level(&mut self) -> Level {
        self.board.state.borrow().col_level(self.index)
    }
}

/// A delay that returns immediately and keeps count of the time asked for.
#[derive(Default)]
pub struct SimDelay {
    waited_ns: Cell<u64>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waited_ns(&self) -> u64 {
        self.waited_ns.get()
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns.set(self.waited_ns.get() + ns as u64);
    }
}

impl DelayNs for &SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns.set(self.waited_ns.get() + ns as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_reads_low_only_through_selected_row() {
        let board = SimBoard::<2, 2>::new();
        board.press(1, 0);
        let [mut r0, mut r1] = board.rows();
        let [mut c0, mut c1] = board.cols();
        c0.set_direction(Direction::InputPullUp);
        c1.set_direction(Direction::InputPullUp);

        assert_eq!(c0.read_level(), Level::High);

        r0.set_level(Level::Low);
        r0.set_direction(Direction::Output);
        assert_eq!(c0.read_level(), Level::High);
        r0.set_direction(Direction::Input);

        r1.set_level(Level::Low);
        r1.set_direction(Direction::Output);
        assert_eq!(c0.read_level(), Level::Low);
        assert_eq!(c1.read_level(), Level::High);
        assert_eq!(board.max_selected(), 1);
    }

    #[test]
    fn test_floating_column_reads_low() {
        let board = SimBoard::<1, 1>::new();
        let [mut c0] = board.cols();
        assert_eq!(c0.read_level(), Level::Low);
    }

    #[test]
    fn test_delay_accumulates() {
        let mut delay = SimDelay::new();
        delay.delay_us(30);
        delay.delay_ms(1);
        assert_eq!(delay.waited_ns(), 30_000 + 1_000_000);
    }
}
