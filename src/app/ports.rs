//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (detector line, actuator driver, event sinks, MQTT
//! transport, clock) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::error::CommsError;
use crate::fsm::context::DriveCommand;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain samples the tone detector through this.
pub trait SensorPort {
    /// `true` while the detector reports a tone.  Read errors read as
    /// inactive.
    fn detector_active(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain commands the dispenser actuator.
pub trait ActuatorPort {
    /// Drive the actuator as requested.  No feedback is read back.
    fn drive(&mut self, command: DriveCommand);

    /// Called once per tick.  Re-drives the last command if it did not
    /// take, so a failed write is not left standing until the next
    /// transition.
    fn reassert(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / remote events)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &super::events::AppEvent) {
        (**self).emit(event);
    }
}

/// Fan an event out to two sinks, first then second.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Message transport (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Maximum length of a topic string carried through the transport.
pub const TOPIC_CAP: usize = 64;

/// Publish/subscribe transport.  Connection management may block; it is
/// only ever driven from the control loop's reconnect step.
pub trait MessageTransport {
    /// Whether the session is up and its subscriptions are active.
    fn is_connected(&self) -> bool;

    /// One connection attempt.
    fn try_connect(&mut self) -> Result<(), CommsError>;

    /// Subscribe to a command topic on the current session.
    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Called once every command topic is subscribed.
    fn on_session_ready(&mut self) {}

    /// Publish a notification.  Payloads are short and opaque.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;

    /// Next inbound topic, in delivery order.
    fn take_inbound(&mut self) -> Option<heapless::String<TOPIC_CAP>>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock, read once per control-loop iteration.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}
