//! Beep rhythm matcher.
//!
//! A finished dishwasher repeats its end-of-cycle beep roughly every six
//! seconds.  Each beep whose spacing from the previous one falls strictly
//! inside the strike window counts as a *strike*; enough strikes mean the
//! wash cycle is over.  Strikes decay one per tick once the detector has
//! been silent for longer than the decay delay, so isolated noise never
//! accumulates.
//!
//! ```text
//!   beep ─┬─ elapsed in (min, max) ──▶ strikes += 1
//!         └─ otherwise ───────────────▶ (no change)
//!
//!   tick ─┬─ silent > decay_after ────▶ strikes -= 1 (floor 0)
//!         └─ strikes meet threshold ──▶ CycleFinishedSignal, strikes = 0
//! ```

use log::info;

use super::debounce::BeepEvent;
use crate::config::{ControllerConfig, StrikeComparison};

/// The wash cycle's end-of-cycle beep pattern was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleFinishedSignal {
    /// Tick at which the threshold was met.
    pub at_ms: u64,
    /// Strike count at the moment of the match.
    pub strikes: u32,
}

#[derive(Debug, Clone)]
pub struct BeepPatternMatcher {
    window_min_ms: u64,
    window_max_ms: u64,
    decay_after_ms: u64,
    threshold: u32,
    comparison: StrikeComparison,
    strikes: u32,
    last_beep_ms: u64,
}

impl BeepPatternMatcher {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            window_min_ms: config.strike_window_min_ms,
            window_max_ms: config.strike_window_max_ms,
            decay_after_ms: config.strike_decay_after_ms,
            threshold: config.strike_threshold,
            comparison: config.strike_comparison,
            strikes: 0,
            last_beep_ms: 0,
        }
    }

    /// Record a recognised beep.  Returns `true` if it counted as a strike.
    pub fn on_beep(&mut self, event: BeepEvent) -> bool {
        self.last_beep_ms = event.at_ms;

        let in_window =
            event.elapsed_ms > self.window_min_ms && event.elapsed_ms < self.window_max_ms;
        if in_window {
            self.strikes += 1;
            info!("    strike {} ({} ms spacing)", self.strikes, event.elapsed_ms);
        }
        in_window
    }

    /// Apply decay and check the trigger.  Call once per control tick
    /// while listening, after any [`on_beep`](Self::on_beep) for the tick.
    pub fn on_tick(&mut self, now_ms: u64) -> Option<CycleFinishedSignal> {
        if now_ms.saturating_sub(self.last_beep_ms) > self.decay_after_ms {
            self.strikes = self.strikes.saturating_sub(1);
        }

        if !self.comparison.is_met(self.strikes, self.threshold) {
            return None;
        }

        let signal = CycleFinishedSignal {
            at_ms: now_ms,
            strikes: self.strikes,
        };
        info!("beep pattern matched after {} strikes", self.strikes);
        self.strikes = 0;
        Some(signal)
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }
}
