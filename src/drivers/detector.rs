//! Tone-detector input line.
//!
//! The external detector board pulls its output LOW while it hears the
//! dishwasher's beep frequency.  A failed read counts as "no tone" so a
//! flaky line can only delay detection, never fake it.

use embedded_hal::digital::InputPin;
use log::debug;

pub struct DetectorLine<P> {
    pin: P,
    read_errors: u32,
}

impl<P: InputPin> DetectorLine<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            read_errors: 0,
        }
    }

    /// `true` while a tone is present.
    pub fn is_active(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                self.read_errors = self.read_errors.wrapping_add(1);
                debug!("detector: read failed ({} total)", self.read_errors);
                false
            }
        }
    }

    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}
