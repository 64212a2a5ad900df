//! H-bridge driver for the dispenser's linear actuator.
//!
//! Three digital lines: a bridge enable and two direction inputs.
//!
//! | Command   | EN   | A    | B    |
//! |-----------|------|------|------|
//! | `Idle`    | low  | low  | low  |
//! | `Open`    | high | low  | high |
//! | `Retract` | high | high | low  |
//!
//! When energising, the direction lines settle before the bridge is
//! enabled; when de-energising, the bridge is disabled first.

use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, warn};

use crate::error::ActuatorError;
use crate::fsm::context::DriveCommand;

pub struct LinearActuator<EN, A, B> {
    enable: EN,
    dir_a: A,
    dir_b: B,
    current: DriveCommand,
}

impl<EN, A, B> LinearActuator<EN, A, B>
where
    EN: OutputPin,
    A: OutputPin,
    B: OutputPin,
{
    /// Take ownership of the three lines.  They are not touched until the
    /// first [`apply`](Self::apply).
    pub fn new(enable: EN, dir_a: A, dir_b: B) -> Self {
        Self {
            enable,
            dir_a,
            dir_b,
            current: DriveCommand::Idle,
        }
    }

    /// Set all three lines for `cmd`.
    pub fn apply(&mut self, cmd: DriveCommand) -> Result<(), ActuatorError> {
        let lines = cmd.lines();
        if lines.enable {
            self.set_direction(lines.dir_a, lines.dir_b)?;
            write_line(&mut self.enable, lines.enable, "EN")?;
        } else {
            write_line(&mut self.enable, lines.enable, "EN")?;
            self.set_direction(lines.dir_a, lines.dir_b)?;
        }
        self.current = cmd;
        debug!("actuator: {:?}", cmd);
        Ok(())
    }

    /// Last command that was fully applied.
    pub fn current(&self) -> DriveCommand {
        self.current
    }

    fn set_direction(&mut self, a: bool, b: bool) -> Result<(), ActuatorError> {
        write_line(&mut self.dir_a, a, "A")?;
        write_line(&mut self.dir_b, b, "B")
    }
}

fn write_line<P: OutputPin>(pin: &mut P, high: bool, name: &str) -> Result<(), ActuatorError> {
    pin.set_state(PinState::from(high)).map_err(|_| {
        warn!("actuator: write to line {name} failed");
        ActuatorError::GpioWriteFailed
    })
}
