//! Concrete state entry actions, the table builder and the pure
//! transition function.
//!
//! ```text
//!  LISTENING ──[cycle finished | cmd.open]──▶ OPENING
//!      ▲                                        │
//!      │                      [open elapsed]  [cmd.retract, 3-state]
//!      │                          ▼               │
//!      │                      DEAD TIME (4-state) │
//!      │                          │ [dead time]   │
//!      │                          ▼               │
//!      └──────[retract elapsed]── RETRACTING ◀────┘
//!
//!  DEAD TIME | RETRACTING ──[cmd.open]──▶ OPENING
//! ```
//!
//! [`next_state`] is a total function of (state, trigger, time in state):
//! it has no side effects, so the whole table can be tested without I/O.

use log::info;

use super::context::{DriveCommand, FsmContext};
use super::{ActuatorState, StateDescriptor, Trigger};
use crate::config::ControllerConfig;

// ═══════════════════════════════════════════════════════════════════════════
//  Transition function
// ═══════════════════════════════════════════════════════════════════════════

/// Where `trigger` takes the machine from `state` after `elapsed_ms` in it.
/// `None` means stay (and leave the entry timestamp untouched).
pub fn next_state(
    config: &ControllerConfig,
    state: ActuatorState,
    trigger: Trigger,
    elapsed_ms: u64,
) -> Option<ActuatorState> {
    use ActuatorState::{DeadTime, Listening, Opening, Retracting};

    match (state, trigger) {
        // Already moving open: repeated requests change nothing.
        (Opening, Trigger::CycleFinished | Trigger::OpenCommand) => None,
        (Listening | DeadTime | Retracting, Trigger::CycleFinished | Trigger::OpenCommand) => {
            Some(Opening)
        }

        (Opening, Trigger::RetractCommand) if config.remote_retract => Some(Retracting),
        (_, Trigger::RetractCommand) => None,

        (Listening, Trigger::Tick) => None,
        (Opening, Trigger::Tick) => (elapsed_ms > config.open_duration_ms).then_some(
            if config.dead_time_ms.is_some() {
                DeadTime
            } else {
                Retracting
            },
        ),
        // Without a configured dead time the state is never entered; if it
        // is forced there anyway, move on immediately.
        (DeadTime, Trigger::Tick) => match config.dead_time_ms {
            Some(dead_ms) => (elapsed_ms > dead_ms).then_some(Retracting),
            None => Some(Retracting),
        },
        (Retracting, Trigger::Tick) => {
            (elapsed_ms > config.retract_duration_ms).then_some(Listening)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; ActuatorState::COUNT] {
    [
        // Index 0: Listening
        StateDescriptor {
            id: ActuatorState::Listening,
            name: "Listening",
            on_enter: listening_enter,
        },
        // Index 1: Opening
        StateDescriptor {
            id: ActuatorState::Opening,
            name: "Opening",
            on_enter: opening_enter,
        },
        // Index 2: DeadTime
        StateDescriptor {
            id: ActuatorState::DeadTime,
            name: "DeadTime",
            on_enter: dead_time_enter,
        },
        // Index 3: Retracting
        StateDescriptor {
            id: ActuatorState::Retracting,
            name: "Retracting",
            on_enter: retracting_enter,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Entry actions
// ═══════════════════════════════════════════════════════════════════════════

fn listening_enter(ctx: &mut FsmContext) {
    ctx.drive = DriveCommand::Idle;
    info!("LISTENING: actuator off, detector armed");
}

fn opening_enter(ctx: &mut FsmContext) {
    ctx.drive = DriveCommand::Open;
    info!("OPENING: driving open for {} ms", ctx.config.open_duration_ms);
}

fn dead_time_enter(ctx: &mut FsmContext) {
    ctx.drive = DriveCommand::Idle;
    info!(
        "DEAD TIME: actuator off for {} ms before reversing",
        ctx.config.dead_time_ms.unwrap_or_default()
    );
}

fn retracting_enter(ctx: &mut FsmContext) {
    ctx.drive = DriveCommand::Retract;
    info!(
        "RETRACTING: driving back for {} ms",
        ctx.config.retract_duration_ms
    );
}
