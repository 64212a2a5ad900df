//! Fixed-rate integrator debounce for the tone-detector line.
//!
//! The detector board pulls its output low while it hears the
//! dishwasher's tone, but the line chatters.  Rather than reacting to
//! edges, the counter integrates: +1 for every active sample, −1 for
//! every inactive one (never below zero).  Once the net count exceeds the
//! threshold a single [`BeepEvent`] is produced and integration restarts.
//!
//! ```text
//!  line   ▔▔▁▁▁▁▁▔▁▁▁▁▁▁▁▁▁ … ▁▁▁▔▔▔▔
//!  count  0 0 1 2 3 4 3 4 5 6 … 501 → BeepEvent, count = 0
//! ```
//!
//! Samples are paced by the control loop (nominally 1 ms apart), so the
//! default threshold of 500 corresponds to roughly half a second of tone.

use log::debug;

/// A recognised, debounced beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepEvent {
    /// Time the beep was recognised (ms since boot).
    pub at_ms: u64,
    /// Time since the previous recognised beep (ms).
    pub elapsed_ms: u64,
}

/// Turns raw detector samples into [`BeepEvent`]s.
#[derive(Debug, Clone)]
pub struct DebouncedEdgeCounter {
    threshold: u32,
    count: u32,
    last_event_ms: u64,
}

impl DebouncedEdgeCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            count: 0,
            last_event_ms: 0,
        }
    }

    /// Feed one sample.  Returns a beep when the integrator crosses the
    /// threshold.
    pub fn sample(&mut self, active: bool, now_ms: u64) -> Option<BeepEvent> {
        if !active {
            self.count = self.count.saturating_sub(1);
            return None;
        }

        self.count += 1;
        if self.count <= self.threshold {
            return None;
        }

        let event = BeepEvent {
            at_ms: now_ms,
            elapsed_ms: now_ms.saturating_sub(self.last_event_ms),
        };
        debug!("detected: {} ms since previous beep", event.elapsed_ms);
        self.count = 0;
        self.last_event_ms = now_ms;
        Some(event)
    }

    /// Current integrator value.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Time of the last emitted beep (0 until the first one).
    pub fn last_event_ms(&self) -> u64 {
        self.last_event_ms
    }

    /// Drop any partially integrated beep.  The previous-beep time is kept
    /// so spacing is still measured from the last real beep.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}
