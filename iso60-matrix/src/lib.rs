//! Debounced key matrix scanning for the ISO60 keyboard.
//!
//! This crate is `no_std` so it can be used by both the AVR firmware and the
//! native CLI tool. It knows nothing about keycodes: it samples a row/column
//! switch grid through [`Line`]s and exposes a stable bit matrix where bit
//! `col` of row `row` is set while that switch is pressed.

#![no_std]

mod debounce;
mod dump;
mod line;
mod scan;
pub mod sim;

pub use debounce::{Debouncer, ScanStatus};
pub use dump::Dump;
pub use line::{pulse, Direction, Level, Line};
pub use scan::Matrix;

/// One row of the matrix, bit `n` = column `n`.
pub type RowBits = u32;

/// Number of consecutive quiet scan passes before a change is committed.
pub const DEBOUNCE: u8 = 4;

/// Settle time after selecting a row, before the columns are sampled.
/// Without it the column reads are unstable.
pub const SETTLE_US: u32 = 30;

/// Extra wait at the end of a pass while the debounce counter is running.
pub const BOUNCE_WAIT_MS: u32 = 1;
