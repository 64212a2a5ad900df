//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM, the beep detector and the shared context.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService         │
//! ActuatorPort ◀──│  Detector · FSM           │ ◀── AppCommand
//!                 └──────────────────────────┘
//! ```

use log::{debug, info};

use crate::config::{ControllerConfig, FinishedNotify};
use crate::detection::BeepDetector;
use crate::fsm::context::{DriveCommand, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{ActuatorState, Fsm, Transition, Trigger};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    detector: BeepDetector,
    finished_notify: FinishedNotify,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig) -> Self {
        let detector = BeepDetector::new(&config);
        let finished_notify = config.finished_notify;
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), ActuatorState::Listening);

        Self {
            fsm,
            ctx,
            detector,
            finished_notify,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Listening` with the actuator de-energised.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.fsm.start(now_ms, &mut self.ctx);
        hw.drive(self.ctx.drive);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control iteration at `now_ms`: sample the detector, apply
    /// the commands received since the last iteration, evaluate the
    /// timing guards, then give the hardware a chance to retry a drive
    /// that failed.
    ///
    /// `hw` satisfies **both** [`SensorPort`] and [`ActuatorPort`]; this
    /// avoids a double mutable borrow while keeping the port boundary
    /// explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        commands: &[AppCommand],
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        self.poll_sensor(now_ms, hw, sink);
        for &cmd in commands {
            self.handle_command(cmd, now_ms, hw, sink);
        }
        self.advance(now_ms, hw, sink);
        hw.reassert();
    }

    /// Sample the detector.  Only runs while `Listening`; the line is
    /// ignored while the actuator is moving.
    pub fn poll_sensor(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        if self.fsm.current_state() != ActuatorState::Listening {
            return;
        }

        let outcome = self.detector.sample(hw.detector_active(), now_ms);

        if let Some(beep) = outcome.beep {
            sink.emit(&AppEvent::Beeped {
                beep,
                strike: outcome.strike,
            });
        }

        let Some(signal) = outcome.finished else {
            return;
        };
        if self.finished_notify == FinishedNotify::AtMatch {
            sink.emit(&AppEvent::CycleFinished(signal));
        }
        let moved = self.fire(Trigger::CycleFinished, now_ms, hw, sink);
        if moved && self.finished_notify == FinishedNotify::AtTransition {
            sink.emit(&AppEvent::CycleFinished(signal));
        }
    }

    /// Process a remote command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if !self.fire(cmd.trigger(), now_ms, hw, sink) {
            debug!("{:?} ignored in {:?}", cmd, self.fsm.current_state());
        }
    }

    /// Evaluate the timing guards of the current state.
    pub fn advance(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.fire(Trigger::Tick, now_ms, hw, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> ActuatorState {
        self.fsm.current_state()
    }

    /// Clock value at which the current state was entered.
    pub fn state_entry_ms(&self) -> u64 {
        self.fsm.state_entry_ms()
    }

    /// Drive level currently requested of the actuator.
    pub fn drive(&self) -> DriveCommand {
        self.ctx.drive
    }

    /// Current strike count of the beep pattern matcher.
    pub fn strikes(&self) -> u32 {
        self.detector.strikes()
    }

    /// Total control iterations executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Offer `trigger` to the FSM; on a transition, drive the actuator,
    /// disarm the detector if it just stopped listening, and report.
    fn fire(
        &mut self,
        trigger: Trigger,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(t) = self.fsm.apply(trigger, now_ms, &mut self.ctx) else {
            return false;
        };
        self.on_transition(t, hw, sink);
        true
    }

    fn on_transition(
        &mut self,
        t: Transition,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        hw.drive(self.ctx.drive);
        if t.from == ActuatorState::Listening {
            self.detector.discard_partial_tone();
        }
        sink.emit(&AppEvent::StateChanged {
            from: t.from,
            to: t.to,
            at_ms: t.at_ms,
        });
    }
}
