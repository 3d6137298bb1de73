//! A single digital I/O line.
//!
//! Rows and columns are both plain GPIO lines; the scanner only needs to
//! switch their direction, drive a level and sample a level. The firmware
//! implements this on the ATmega32U4 port registers, [`crate::sim`] in memory.

use embedded_hal::delay::DelayNs;

/// Electrical configuration of a line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// High-impedance input, no bias.
    Input,
    /// Input with the internal pull-up enabled.
    InputPullUp,
    /// Push-pull output.
    Output,
}

/// Logic level of a line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

pub trait Line {
    fn set_direction(&mut self, direction: Direction);

    /// Set the output latch. Takes effect on the pin while it is an output.
    fn set_level(&mut self, level: Level);

    fn read_level(&mut self) -> Level;
}

impl<T: Line + ?Sized> Line for &mut T {
    fn set_direction(&mut self, direction: Direction) {
        (**self).set_direction(direction)
    }

    fn set_level(&mut self, level: Level) {
        (**self).set_level(level)
    }

    fn read_level(&mut self) -> Level {
        (**self).read_level()
    }
}

/// Drive an output line high for `ms` milliseconds, then low. Used for the
/// startup blink of an indicator LED.
pub fn pulse<L: Line + ?Sized, D: DelayNs>(line: &mut L, delay: &mut D, ms: u32) {
    line.set_level(Level::Low);
    line.set_direction(Direction::Output);
    line.set_level(Level::High);
    delay.delay_ms(ms);
    line.set_level(Level::Low);
}
