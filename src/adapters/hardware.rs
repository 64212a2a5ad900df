//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the detector line and the actuator driver, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  Generic over `embedded-hal`
//! pins: `esp_idf_hal::gpio::PinDriver` on the device, mocks in tests.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::actuator::LinearActuator;
use crate::drivers::detector::DetectorLine;
use crate::fsm::context::DriveCommand;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D, EN, A, B> {
    detector: DetectorLine<D>,
    actuator: LinearActuator<EN, A, B>,
    /// Last command the domain asked for.
    wanted: DriveCommand,
}

impl<D, EN, A, B> HardwareAdapter<D, EN, A, B>
where
    D: InputPin,
    EN: OutputPin,
    A: OutputPin,
    B: OutputPin,
{
    pub fn new(detector: DetectorLine<D>, actuator: LinearActuator<EN, A, B>) -> Self {
        Self {
            detector,
            actuator,
            wanted: DriveCommand::Idle,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D, EN, A, B> SensorPort for HardwareAdapter<D, EN, A, B>
where
    D: InputPin,
{
    fn detector_active(&mut self) -> bool {
        self.detector.is_active()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<D, EN, A, B> ActuatorPort for HardwareAdapter<D, EN, A, B>
where
    EN: OutputPin,
    A: OutputPin,
    B: OutputPin,
{
    fn drive(&mut self, command: DriveCommand) {
        self.wanted = command;
        // Logged by the driver; `reassert` retries.
        let _ = self.actuator.apply(command);
    }

    fn reassert(&mut self) {
        if self.actuator.current() != self.wanted {
            let _ = self.actuator.apply(self.wanted);
        }
    }
}
