//! Shared mutable context threaded through every FSM entry action.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the controller configuration, the actuator drive request
//! and the timing of the current state.  The control loop owns it and
//! passes it by reference; nothing here is global.

use crate::config::ControllerConfig;

// ---------------------------------------------------------------------------
// Actuator drive request (written by entry actions; consumed by the service)
// ---------------------------------------------------------------------------

/// What the actuator should be doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriveCommand {
    /// Driver disabled, both direction lines low.
    #[default]
    Idle,
    /// Driver enabled, pushing the dispenser door open.
    Open,
    /// Driver enabled, pulling the actuator back.
    Retract,
}

/// Logic levels for the three driver lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveLines {
    pub enable: bool,
    pub dir_a: bool,
    pub dir_b: bool,
}

impl DriveCommand {
    /// Pin levels that realise this command on the H-bridge.
    pub const fn lines(self) -> DriveLines {
        match self {
            Self::Idle => DriveLines {
                enable: false,
                dir_a: false,
                dir_b: false,
            },
            Self::Open => DriveLines {
                enable: true,
                dir_a: false,
                dir_b: true,
            },
            Self::Retract => DriveLines {
                enable: true,
                dir_a: true,
                dir_b: false,
            },
        }
    }

    pub const fn is_energised(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Milliseconds elapsed in the current state at the last evaluation.
    pub ms_in_state: u64,
    /// Clock value of the last evaluation (ms since boot).
    pub now_ms: u64,

    // -- Actuator output --
    /// Drive request to be applied to the actuator after the FSM step.
    pub drive: DriveCommand,

    // -- Configuration --
    pub config: ControllerConfig,
}

impl FsmContext {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            ms_in_state: 0,
            now_ms: 0,
            drive: DriveCommand::Idle,
            config,
        }
    }
}
