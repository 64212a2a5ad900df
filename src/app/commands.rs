//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the MQTT
//! command topics) that the [`AppService`](super::service::AppService)
//! turns into state-machine triggers.

use crate::fsm::Trigger;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Force the dispenser open (`cmd.open`).
    Open,
    /// Abort an opening and retract immediately (`cmd.retract`).
    Retract,
}

impl AppCommand {
    pub fn trigger(self) -> Trigger {
        match self {
            Self::Open => Trigger::OpenCommand,
            Self::Retract => Trigger::RetractCommand,
        }
    }
}
