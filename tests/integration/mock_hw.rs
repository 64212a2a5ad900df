//! Mock adapters for integration tests.
//!
//! `MockHardware` plays back a scripted detector timeline and records
//! every actuator drive, so tests can assert on the full command history
//! without touching real GPIO.

use core::convert::Infallible;
use core::ops::Range;

use dishopener::app::events::AppEvent;
use dishopener::app::ports::{ActuatorPort, EventSink, SensorPort};
use dishopener::fsm::context::DriveCommand;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Current simulated time; set by the test before each tick.
    pub now: u64,
    /// Intervals during which the detector reports a tone.
    pub tones: Vec<Range<u64>>,
    pub drives: Vec<DriveCommand>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            now: 0,
            tones: Vec::new(),
            drives: Vec::new(),
        }
    }

    /// Add a tone of `len` ticks starting at `start`.
    pub fn tone(&mut self, start: u64, len: u64) -> &mut Self {
        self.tones.push(start..start + len);
        self
    }

    pub fn last_drive(&self) -> Option<DriveCommand> {
        self.drives.last().copied()
    }
}

impl SensorPort for MockHardware {
    fn detector_active(&mut self) -> bool {
        self.tones.iter().any(|r| r.contains(&self.now))
    }
}

impl ActuatorPort for MockHardware {
    fn drive(&mut self, command: DriveCommand) {
        self.drives.push(command);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn finished_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::CycleFinished(_)))
            .count()
    }

    pub fn beep_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Beeped { .. }))
            .count()
    }

    /// `(to, at_ms)` for every state change, in order.
    pub fn timeline(&self) -> Vec<(dishopener::fsm::ActuatorState, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { to, at_ms, .. } => Some((*to, *at_ms)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── LED pin / delay ───────────────────────────────────────────

/// Output pin that remembers every level written.
#[derive(Default)]
pub struct MockPin {
    pub levels: Vec<bool>,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.push(false);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.push(true);
        Ok(())
    }
}

/// Delay that returns immediately and tallies the requested time.
#[derive(Default)]
pub struct MockDelay {
    pub total_ms: u64,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns) / 1_000_000;
    }
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}
