//! Acoustic cycle-finished detection.
//!
//! The [`BeepDetector`] owns both detection stages and runs them in order
//! on every sample taken while the machine is listening:
//!
//! ```text
//!  detector line ──▶ DebouncedEdgeCounter ──BeepEvent──▶ BeepPatternMatcher
//!                                                          │
//!                                        CycleFinishedSignal ◀┘
//! ```

pub mod debounce;
pub mod pattern;

use crate::config::ControllerConfig;
use debounce::{BeepEvent, DebouncedEdgeCounter};
use pattern::{BeepPatternMatcher, CycleFinishedSignal};

/// Everything one detector sample produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionOutcome {
    /// A debounced beep was recognised on this sample.
    pub beep: Option<BeepEvent>,
    /// That beep counted as a strike.
    pub strike: bool,
    /// The beep pattern matched on this sample.
    pub finished: Option<CycleFinishedSignal>,
}

/// Aggregates the debounce and rhythm stages.
#[derive(Debug, Clone)]
pub struct BeepDetector {
    edges: DebouncedEdgeCounter,
    pattern: BeepPatternMatcher,
}

impl BeepDetector {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            edges: DebouncedEdgeCounter::new(config.debounce_threshold_ticks),
            pattern: BeepPatternMatcher::new(config),
        }
    }

    /// Feed one detector sample taken at `now_ms`.
    pub fn sample(&mut self, active: bool, now_ms: u64) -> DetectionOutcome {
        let beep = self.edges.sample(active, now_ms);
        let strike = beep.is_some_and(|event| self.pattern.on_beep(event));
        let finished = self.pattern.on_tick(now_ms);
        DetectionOutcome {
            beep,
            strike,
            finished,
        }
    }

    /// Drop a half-integrated tone when the machine stops listening.
    /// Strikes are kept; they decay once listening resumes.
    pub fn discard_partial_tone(&mut self) {
        self.edges.reset();
    }

    pub fn strikes(&self) -> u32 {
        self.pattern.strikes()
    }

    pub fn debounce_count(&self) -> u32 {
        self.edges.count()
    }
}
