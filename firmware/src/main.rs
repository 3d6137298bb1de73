//! ISO60 keyboard firmware for ATmega32U4 (Teensy 2.0).
//!
//! - 7×18 matrix scanned row by row with a shared debounce window
//! - Three-layer Finnish ISO keymap with overlay layers and Fn actions
//! - USB HID boot keyboard reports (6KRO)

#![no_std]
#![no_main]
#![feature(asm_experimental_arch)]

mod board;
mod usb;

use avr_device::atmega32u4::Peripherals;
use embedded_hal::delay::DelayNs;
use iso60_keymap::dispatch::Keyboard;
use iso60_keymap::host::ReportHost;
use iso60_keymap::KEYMAP;
use iso60_matrix::{pulse, Matrix, ScanStatus};

use board::BusyDelay;
use usb::UsbKeyboard;

const _: () = assert!(board::ROWS == iso60_keymap::ROWS && board::COLS == iso60_keymap::COLS);

/// Panic handler, on AVR we just loop forever.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Clock prescaler off: run at the full 16MHz
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) });

    let mut matrix = Matrix::new(board::rows(&dp), board::cols(&dp), BusyDelay);

    let mut delay = BusyDelay;

    // Sign of life, before USB attaches: nothing polls the bus meanwhile.
    pulse(&mut board::led(&dp), &mut delay, board::STARTUP_BLINK_MS);

    let mut usb = UsbKeyboard::new(&dp);
    usb.init();
    let mut host = ReportHost::new(usb);
    let mut keyboard = Keyboard::new(&KEYMAP);

    // Milliseconds: the 1ms loop delay plus the scanner's bounce wait. Row
    // settle time (7 x 30us) is not counted.
    let mut now: u16 = 0;

    loop {
        host.sink_mut().poll();

        let status = matrix.scan();
        if status == ScanStatus::Committed {
            keyboard.task(matrix.rows(), now, &mut host);
        }

        delay.delay_ms(1);
        now = now.wrapping_add(1 + status.wait_ms() as u16);
    }
}
