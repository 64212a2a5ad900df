//! Table-driven finite state machine for the dispenser actuator.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  StateTable                                  │
//! │  ┌────────────┬──────────────┬────────────┐  │
//! │  │ State      │ name         │ on_enter   │  │
//! │  ├────────────┼──────────────┼────────────┤  │
//! │  │ Listening  │ "Listening"  │ fn(ctx)    │  │
//! │  │ Opening    │ "Opening"    │ fn(ctx)    │  │
//! │  │ DeadTime   │ "DeadTime"   │ fn(ctx)    │  │
//! │  │ Retracting │ "Retracting" │ fn(ctx)    │  │
//! │  └────────────┴──────────────┴────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Every trigger (a tick, a recognised beep pattern, a remote command) is
//! handed to [`states::next_state`].  If it names a new state the engine
//! records the entry time and runs that state's `on_enter`, which writes
//! the actuator drive request into the [`FsmContext`].

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all actuator states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ActuatorState {
    Listening = 0,
    Opening = 1,
    DeadTime = 2,
    Retracting = 3,
}

impl ActuatorState {
    /// Total number of states: used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `ActuatorState`.  Out-of-range indices
    /// fall back to `Listening`, the de-energised state.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Listening,
            1 => Self::Opening,
            2 => Self::DeadTime,
            3 => Self::Retracting,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Listening
            }
        }
    }
}

/// What asked the machine to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Periodic guard evaluation.
    Tick,
    /// The beep pattern matcher recognised the end of the wash.
    CycleFinished,
    /// Remote `cmd.open`.
    OpenCommand,
    /// Remote `cmd.retract`.
    RetractCommand,
}

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.  These run exactly once per entry.
pub type StateActionFn = fn(&mut FsmContext);

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: ActuatorState,
    pub name: &'static str,
    pub on_enter: StateActionFn,
}

/// A state change that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ActuatorState,
    pub to: ActuatorState,
    pub trigger: Trigger,
    pub at_ms: u64,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table and the entry timestamp of the current state.
/// All outputs go through the [`FsmContext`] handed to each call.
pub struct Fsm {
    /// Fixed-size table indexed by `ActuatorState as usize`.
    table: [StateDescriptor; ActuatorState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Clock value at which the current state was entered.
    state_entry_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; ActuatorState::COUNT], initial: ActuatorState) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first trigger.
    pub fn start(&mut self, now_ms: u64, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.state_entry_ms = now_ms;
        ctx.now_ms = now_ms;
        ctx.ms_in_state = 0;
        (self.table[self.current].on_enter)(ctx);
    }

    /// Offer `trigger` to the machine at `now_ms`.
    ///
    /// Returns the applied transition, or `None` if the machine stayed put
    /// (in which case no entry action runs and the entry time is kept).
    pub fn apply(
        &mut self,
        trigger: Trigger,
        now_ms: u64,
        ctx: &mut FsmContext,
    ) -> Option<Transition> {
        let elapsed = now_ms.saturating_sub(self.state_entry_ms);
        ctx.now_ms = now_ms;
        ctx.ms_in_state = elapsed;

        let next = states::next_state(&ctx.config, self.current_state(), trigger, elapsed)?;
        Some(self.transition(next, trigger, now_ms, ctx))
    }

    /// The current state's identity.
    pub fn current_state(&self) -> ActuatorState {
        ActuatorState::from_index(self.current)
    }

    /// Clock value at which the current state was entered.
    pub fn state_entry_ms(&self) -> u64 {
        self.state_entry_ms
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(
        &mut self,
        next: ActuatorState,
        trigger: Trigger,
        now_ms: u64,
        ctx: &mut FsmContext,
    ) -> Transition {
        let from = self.current_state();
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {} ({:?})",
            self.table[self.current].name, self.table[next_idx].name, trigger
        );

        self.current = next_idx;
        self.state_entry_ms = now_ms;
        ctx.ms_in_state = 0;

        (self.table[next_idx].on_enter)(ctx);

        Transition {
            from,
            to: next,
            trigger,
            at_ms: now_ms,
        }
    }
}
