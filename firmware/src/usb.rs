//! USB HID boot keyboard on the ATmega32U4's built-in USB controller.
//!
//! Polled, no interrupts: the main loop calls [`UsbKeyboard::poll`] once per
//! pass to answer control requests, and reports go out on the interrupt IN
//! endpoint through the [`ReportSink`] impl.

use avr_device::atmega32u4::Peripherals;
use iso60_keymap::host::{KeyboardReport, ReportSink};

const EP0_SIZE: u8 = 64; // Control endpoint size
const EP1_SIZE: u8 = 8; // Interrupt IN endpoint size (keyboard reports)

/// Bounded wait for a free IN bank before a report is dropped.
const SEND_TIMEOUT: u16 = 0xFFFF;

/// HID report descriptor for a boot keyboard: modifier byte, reserved byte,
/// five LED bits out, six key slots.
static HID_REPORT_DESCRIPTOR: [u8; 64] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - LCtrl
    0x29, 0xE7, //   Usage Maximum (231) - RGui
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

static DEVICE_DESCRIPTOR: [u8; 18] = [
    18,   // bLength
    1,    // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.0)
    0,    // bDeviceClass (defined at interface level)
    0,    // bDeviceSubClass
    0,    // bDeviceProtocol
    EP0_SIZE, // bMaxPacketSize0
    0xED, 0xFE, // idVendor (0xFEED)
    0x60, 0x00, // idProduct (0x0060)
    0x01, 0x00, // bcdDevice (1.0)
    1,    // iManufacturer
    2,    // iProduct
    0,    // iSerialNumber
    1,    // bNumConfigurations
];

static CONFIG_DESCRIPTOR: [u8; 34] = [
    // Configuration
    9, 2, 34, 0, // bLength, bDescriptorType, wTotalLength
    1,    // bNumInterfaces
    1,    // bConfigurationValue
    0,    // iConfiguration
    0x80, // bmAttributes (bus powered)
    50,   // bMaxPower (100mA)
    // Interface
    9, 4, // bLength, bDescriptorType
    0,    // bInterfaceNumber
    0,    // bAlternateSetting
    1,    // bNumEndpoints
    3,    // bInterfaceClass (HID)
    1,    // bInterfaceSubClass (Boot)
    1,    // bInterfaceProtocol (Keyboard)
    0,    // iInterface
    // HID
    9, 0x21, // bLength, bDescriptorType
    0x11, 0x01, // bcdHID (1.11)
    0,    // bCountryCode
    1,    // bNumDescriptors
    0x22, // bDescriptorType (Report)
    HID_REPORT_DESCRIPTOR.len() as u8, 0, // wDescriptorLength
    // Endpoint 1 IN, interrupt
    7, 5, // bLength, bDescriptorType
    0x81, // bEndpointAddress
    0x03, // bmAttributes (Interrupt)
    EP1_SIZE, 0, // wMaxPacketSize
    10,   // bInterval (10ms polling)
];

static STRING_LANGUAGE: [u8; 4] = [4, 3, 0x09, 0x04]; // English (US)

static STRING_MANUFACTURER: [u8; 12] = [
    12, 3, b'I', 0, b'S', 0, b'O', 0, b'6', 0, b'0', 0,
];

static STRING_PRODUCT: [u8; 18] = [
    18, 3, b'K', 0, b'e', 0, b'y', 0, b'b', 0, b'o', 0, b'a', 0, b'r', 0, b'd', 0,
];

const GET_STATUS: u8 = 0x00;
const SET_ADDRESS: u8 = 0x05;
const GET_DESCRIPTOR: u8 = 0x06;
const GET_CONFIGURATION: u8 = 0x08;
const SET_CONFIGURATION: u8 = 0x09;
const HID_SET_IDLE: u8 = 0x0A;
const HID_SET_PROTOCOL: u8 = 0x0B;

const DESC_DEVICE: u8 = 1;
const DESC_CONFIGURATION: u8 = 2;
const DESC_STRING: u8 = 3;
const DESC_HID_REPORT: u8 = 0x22;

/// The eight bytes of a control SETUP stage.
struct SetupPacket {
    request_type: u8,
    request: u8,
    value: u16,
    length: u16,
}

impl SetupPacket {
    fn read(dp: &Peripherals) -> Self {
        let mut bytes = [0u8; 8];
        for byte in bytes.iter_mut() {
            *byte = dp.USB_DEVICE.uedatx.read().bits();
        }
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    fn descriptor_type(&self) -> u8 {
        (self.value >> 8) as u8
    }

    fn descriptor_index(&self) -> u8 {
        self.value as u8
    }
}

/// USB device state.
pub struct UsbKeyboard<'a> {
    dp: &'a Peripherals,
    configured: bool,
    last_report: KeyboardReport,
}

impl<'a> UsbKeyboard<'a> {
    pub fn new(dp: &'a Peripherals) -> Self {
        Self {
            dp,
            configured: false,
            last_report: KeyboardReport::empty(),
        }
    }

    /// Start the USB controller and attach to the bus.
    pub fn init(&mut self) {
        let usb = &self.dp.USB_DEVICE;

        // Enable USB pad regulator
        usb.uhwcon.write(|w| w.uvrege().set_bit());
        usb.usbcon.write(|w| w.usbe().set_bit().otgpade().set_bit());

        // 16MHz crystal -> 96MHz PLL -> 48MHz USB clock
        self.dp.PLL.pllcsr.write(|w| w.pindiv().set_bit().plle().set_bit());
        while self.dp.PLL.pllcsr.read().plock().bit_is_clear() {}

        usb.usbcon.modify(|_, w| w.frzclk().clear_bit());
        usb.udcon.modify(|_, w| w.detach().clear_bit());
        usb.udien.write(|w| w.eorste().set_bit());

        self.configured = false;
    }

    /// Handle bus reset and pending control requests. Call once per pass.
    pub fn poll(&mut self) {
        let usb = &self.dp.USB_DEVICE;

        if usb.udint.read().eorsti().bit_is_set() {
            usb.udint.modify(|_, w| w.eorsti().clear_bit());
            self.configure_ep0();
            self.configured = false;
        }

        self.select_endpoint(0);
        if usb.ueintx.read().rxstpi().bit_is_set() {
            self.handle_setup();
        }
    }

    fn configure_ep0(&self) {
        let usb = &self.dp.USB_DEVICE;
        self.select_endpoint(0);
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x.write(|w| w.eptype().bits(0b00));
        usb.uecfg1x.write(|w| w.epsize().bits(0b011).alloc().set_bit());
    }

    fn configure_ep1(&self) {
        let usb = &self.dp.USB_DEVICE;
        self.select_endpoint(1);
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x.write(|w| w.eptype().bits(0b11).epdir().set_bit());
        usb.uecfg1x.write(|w| w.epsize().bits(0b000).alloc().set_bit());
    }

    fn select_endpoint(&self, ep: u8) {
        self.dp.USB_DEVICE.uenum.write(|w| w.bits(ep & 0x07));
    }

    fn handle_setup(&mut self) {
        let usb = &self.dp.USB_DEVICE;
        let setup = SetupPacket::read(self.dp);
        usb.ueintx.modify(|_, w| w.rxstpi().clear_bit());

        match (setup.request_type, setup.request) {
            (0x80, GET_DESCRIPTOR) => {
                let descriptor: Option<&[u8]> = match setup.descriptor_type() {
                    DESC_DEVICE => Some(&DEVICE_DESCRIPTOR[..]),
                    DESC_CONFIGURATION => Some(&CONFIG_DESCRIPTOR[..]),
                    DESC_STRING => match setup.descriptor_index() {
                        0 => Some(&STRING_LANGUAGE[..]),
                        1 => Some(&STRING_MANUFACTURER[..]),
                        2 => Some(&STRING_PRODUCT[..]),
                        _ => None,
                    },
                    _ => None,
                };
                match descriptor {
                    Some(desc) => self.send_control(desc, setup.length),
                    None => self.stall(),
                }
            }
            (0x81, GET_DESCRIPTOR) if setup.descriptor_type() == DESC_HID_REPORT => {
                self.send_control(&HID_REPORT_DESCRIPTOR, setup.length);
            }
            (0x00, SET_ADDRESS) => {
                // Status stage goes out on the old address.
                self.send_zlp();
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.udaddr
                    .write(|w| w.uadd().bits(setup.value as u8 & 0x7F).adden().set_bit());
            }
            (0x00, SET_CONFIGURATION) => {
                self.send_zlp();
                self.configure_ep1();
                self.configured = setup.value != 0;
            }
            (0x80, GET_CONFIGURATION) => {
                self.send_control(&[self.configured as u8], setup.length);
            }
            (0x80, GET_STATUS) => {
                self.send_control(&[0, 0], setup.length);
            }
            (0x21, HID_SET_IDLE) | (0x21, HID_SET_PROTOCOL) => self.send_zlp(),
            _ => self.stall(),
        }
    }

    /// Send a control IN data stage in EP0-sized chunks, then wait for the
    /// host's status stage.
    fn send_control(&self, data: &[u8], max_length: u16) {
        let usb = &self.dp.USB_DEVICE;
        let len = core::cmp::min(data.len(), max_length as usize);
        let mut sent = 0;

        while sent < len {
            while usb.ueintx.read().txini().bit_is_clear() {}

            let chunk_end = core::cmp::min(sent + EP0_SIZE as usize, len);
            for &byte in &data[sent..chunk_end] {
                usb.uedatx.write(|w| w.bits(byte));
            }

            usb.ueintx.modify(|_, w| w.txini().clear_bit());
            sent = chunk_end;
        }

        while usb.ueintx.read().rxouti().bit_is_clear() {}
        usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
    }

    fn send_zlp(&self) {
        self.dp.USB_DEVICE.ueintx.modify(|_, w| w.txini().clear_bit());
    }

    fn stall(&self) {
        self.dp.USB_DEVICE.ueconx.modify(|_, w| w.stallrq().set_bit());
    }
}

impl ReportSink for UsbKeyboard<'_> {
    /// Queue a report on endpoint 1. Unchanged reports and reports sent
    /// before enumeration finishes are skipped.
    fn send(&mut self, report: &KeyboardReport) {
        if !self.configured || *report == self.last_report {
            return;
        }

        let usb = &self.dp.USB_DEVICE;
        self.select_endpoint(1);

        // RWAL set means the bank can take data.
        let mut timeout = SEND_TIMEOUT;
        while usb.ueintx.read().rwal().bit_is_clear() {
            timeout -= 1;
            if timeout == 0 {
                return;
            }
        }

        for byte in report.to_bytes() {
            usb.uedatx.write(|w| w.bits(byte));
        }
        usb.ueintx.modify(|_, w| w.fifocon().clear_bit().txini().clear_bit());

        self.last_report = *report;
    }
}
