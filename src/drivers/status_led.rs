//! Single-colour status LED.
//!
//! The on-board LED is wired active-low: [`StatusLed::set_high`] turns it
//! off, [`StatusLed::set_low`] lights it.
//!
//! | Phase                 | Level        |
//! |-----------------------|--------------|
//! | boot                  | high         |
//! | joining WiFi          | toggling     |
//! | MQTT connected        | low          |
//! | MQTT connect failed   | high         |
//!
//! Write errors are logged and otherwise ignored: the LED is advisory.

use embedded_hal::digital::{OutputPin, PinState};
use log::debug;

pub struct StatusLed<P> {
    pin: P,
    high: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take the pin and drive it high.
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, high: true };
        led.write(true);
        led
    }

    pub fn set_high(&mut self) {
        self.write(true);
    }

    pub fn set_low(&mut self) {
        self.write(false);
    }

    pub fn toggle(&mut self) {
        self.write(!self.high);
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }

    fn write(&mut self, high: bool) {
        if self.pin.set_state(PinState::from(high)).is_err() {
            debug!("status LED: write failed");
        }
        self.high = high;
    }
}
