//! [`EventSink`] that renders each [`AppEvent`] as one `log` line with a
//! fixed-width tag (`START`, `STATE`, `BEEP`, `DONE`).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | resting in {:?}", state);
            }
            AppEvent::StateChanged { from, to, at_ms } => {
                info!("STATE | {:?} -> {:?} @ {} ms", from, to, at_ms);
            }
            AppEvent::Beeped { beep, strike } => {
                info!(
                    "BEEP  | @ {} ms, +{} ms since last{}",
                    beep.at_ms,
                    beep.elapsed_ms,
                    if *strike { " (strike)" } else { "" }
                );
            }
            AppEvent::CycleFinished(signal) => {
                info!(
                    "DONE  | wash cycle finished @ {} ms ({} strikes)",
                    signal.at_ms, signal.strikes
                );
            }
        }
    }
}
