//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, publish over MQTT.

use crate::detection::debounce::BeepEvent;
use crate::detection::pattern::CycleFinishedSignal;
use crate::fsm::ActuatorState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(ActuatorState),

    /// The FSM transitioned between states.
    StateChanged {
        from: ActuatorState,
        to: ActuatorState,
        at_ms: u64,
    },

    /// The detector recognised a beep.
    Beeped { beep: BeepEvent, strike: bool },

    /// The end-of-cycle beep pattern was recognised.  Emitted once per match.
    CycleFinished(CycleFinishedSignal),
}
