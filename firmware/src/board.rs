//! Teensy 2.0 (ATmega32U4) wiring of the ISO60 matrix.
//!
//! Pin mapping:
//!   Rows (driven low one at a time): PF0, PF1, PF4, PF5, PF6, PF7, PC7
//!   Columns (inputs w/ pull-up):     PB0-PB7, PD0-PD5, PD7, PC6, PE6, PE2
//!   On-board LED:                    PD6

use avr_device::atmega32u4::Peripherals;
use embedded_hal::delay::DelayNs;
use iso60_matrix::{Direction, Level, Line};

/// Number of rows in the matrix.
pub const ROWS: usize = 7;
/// Number of columns in the matrix.
pub const COLS: usize = 18;

#[derive(Copy, Clone)]
pub enum Port {
    B,
    C,
    D,
    E,
    F,
}

/// Row lines, in row order.
const ROW_PINS: [(Port, u8); ROWS] = [
    (Port::F, 0),
    (Port::F, 1),
    (Port::F, 4),
    (Port::F, 5),
    (Port::F, 6),
    (Port::F, 7),
    (Port::C, 7),
];

/// Column lines, in column order.
const COL_PINS: [(Port, u8); COLS] = [
    (Port::B, 0),
    (Port::B, 1),
    (Port::B, 2),
    (Port::B, 3),
    (Port::B, 4),
    (Port::B, 5),
    (Port::B, 6),
    (Port::B, 7),
    (Port::D, 0),
    (Port::D, 1),
    (Port::D, 2),
    (Port::D, 3),
    (Port::D, 4),
    (Port::D, 5),
    (Port::D, 7),
    (Port::C, 6),
    (Port::E, 6),
    (Port::E, 2),
];

/// Bind the DDR, PORT and PIN registers of `$port` and evaluate `$body`.
/// The register types differ per port, so the body is expanded once per arm.
macro_rules! with_port {
    ($dp:expr, $port:expr, |$ddr:ident, $out:ident, $inp:ident| $body:expr) => {
        match $port {
            Port::B => {
                let ($ddr, $out, $inp) = (&$dp.PORTB.ddrb, &$dp.PORTB.portb, &$dp.PORTB.pinb);
                $body
            }
            Port::C => {
                let ($ddr, $out, $inp) = (&$dp.PORTC.ddrc, &$dp.PORTC.portc, &$dp.PORTC.pinc);
                $body
            }
            Port::D => {
                let ($ddr, $out, $inp) = (&$dp.PORTD.ddrd, &$dp.PORTD.portd, &$dp.PORTD.pind);
                $body
            }
            Port::E => {
                let ($ddr, $out, $inp) = (&$dp.PORTE.ddre, &$dp.PORTE.porte, &$dp.PORTE.pine);
                $body
            }
            Port::F => {
                let ($ddr, $out, $inp) = (&$dp.PORTF.ddrf, &$dp.PORTF.portf, &$dp.PORTF.pinf);
                $body
            }
        }
    };
}

/// One GPIO pin, driven through its port registers.
pub struct Pin<'a> {
    dp: &'a Peripherals,
    port: Port,
    mask: u8,
}

impl<'a> Pin<'a> {
    pub fn new(dp: &'a Peripherals, port: Port, bit: u8) -> Self {
        Self {
            dp,
            port,
            mask: 1 << bit,
        }
    }
}

impl Line for Pin<'_> {
    fn set_direction(&mut self, direction: Direction) {
        let mask = self.mask;
        with_port!(self.dp, self.port, |ddr, out, _inp| match direction {
            Direction::Input => {
                ddr.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
                out.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
            }
            Direction::InputPullUp => {
                ddr.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
                out.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
            }
            Direction::Output => {
                ddr.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
            }
        })
    }

    fn set_level(&mut self, level: Level) {
        let mask = self.mask;
        with_port!(self.dp, self.port, |_ddr, out, _inp| match level {
            Level::Low => out.modify(|r, w| unsafe { w.bits(r.bits() & !mask) }),
            Level::High => out.modify(|r, w| unsafe { w.bits(r.bits() | mask) }),
        })
    }

    fn read_level(&mut self) -> Level {
        let mask = self.mask;
        let bits = with_port!(self.dp, self.port, |_ddr, _out, inp| inp.read().bits());
        if bits & mask == 0 {
            Level::Low
        } else {
            Level::High
        }
    }
}

pub fn rows(dp: &Peripherals) -> [Pin<'_>; ROWS] {
    ROW_PINS.map(|(port, bit)| Pin::new(dp, port, bit))
}

pub fn cols(dp: &Peripherals) -> [Pin<'_>; COLS] {
    COL_PINS.map(|(port, bit)| Pin::new(dp, port, bit))
}

/// On-board LED, active high.
pub fn led(dp: &Peripherals) -> Pin<'_> {
    Pin::new(dp, Port::D, 6)
}

/// How long the LED stays lit at startup.
pub const STARTUP_BLINK_MS: u32 = 500;

/// Busy-wait delay, calibrated for 16 MHz.
pub struct BusyDelay;

impl DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        // ~4 loop iterations of 4 cycles each per microsecond.
        let us = ns.div_ceil(1000);
        for _ in 0..us {
            for _ in 0..4u8 {
                unsafe { core::arch::asm!("nop") };
            }
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            // ~1ms at 16MHz: 16000 cycles / 4 cycles per loop iteration
            for _ in 0..4000u16 {
                unsafe { core::arch::asm!("nop") };
            }
        }
    }
}
