//! System configuration parameters
//!
//! All tunable parameters for the dishwasher opener.  Two profiles exist:
//! the four-state machine shipped on the first board revision (with a dead-time
//! pause between opening and retracting) and a three-state machine that
//! accepts a remote retract command.  Both run on the same state machine;
//! only the numbers and switches below differ.
//!
//! Everything is compile-time: there is no persistence layer.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Detection / state-machine profile
// ---------------------------------------------------------------------------

/// How the strike count is compared against [`ControllerConfig::strike_threshold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeComparison {
    /// Fire when `strikes >= threshold`.
    AtLeast,
    /// Fire when `strikes > threshold` (one extra strike needed).
    MoreThan,
}

impl StrikeComparison {
    pub fn is_met(self, strikes: u32, threshold: u32) -> bool {
        match self {
            Self::AtLeast => strikes >= threshold,
            Self::MoreThan => strikes > threshold,
        }
    }
}

/// When the "finished" notification is published for a pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishedNotify {
    /// As soon as the beep pattern matcher fires.
    AtMatch,
    /// When the resulting `Listening -> Opening` transition is applied.
    AtTransition,
}

/// Core controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Debounce ---
    /// Net active ticks the detector line must exceed to count as a beep.
    pub debounce_threshold_ticks: u32,

    // --- Beep pattern ---
    /// Lower bound (exclusive) of the beep spacing that counts as a strike.
    pub strike_window_min_ms: u64,
    /// Upper bound (exclusive) of the beep spacing that counts as a strike.
    pub strike_window_max_ms: u64,
    /// Silence after which strikes start to decay, one per tick.
    pub strike_decay_after_ms: u64,
    /// Number of strikes that means "wash cycle finished".
    pub strike_threshold: u32,
    /// How `strike_threshold` is compared.
    pub strike_comparison: StrikeComparison,

    // --- Actuator timing ---
    /// Time spent driving the actuator open.
    pub open_duration_ms: u64,
    /// De-energised pause between opening and retracting.
    /// `None` selects the three-state machine.
    pub dead_time_ms: Option<u64>,
    /// Time spent driving the actuator back.
    pub retract_duration_ms: u64,

    // --- Remote behaviour ---
    /// Honour `cmd.retract` while opening.
    pub remote_retract: bool,
    /// Publish a `beeped` notification for every recognised beep.
    pub publish_beeps: bool,
    /// Causal point of the `finished` notification.
    pub finished_notify: FinishedNotify,

    // --- Loop timing ---
    /// Delay at the top of each control-loop iteration (milliseconds).
    pub loop_interval_ms: u32,
    /// Fixed wait between MQTT reconnect attempts (milliseconds).
    pub reconnect_backoff_ms: u32,
    /// Poll interval while joining the WiFi network (milliseconds).
    pub wifi_poll_interval_ms: u32,
}

impl ControllerConfig {
    /// The profile running on the first board revision: open, dead time, retract.
    pub fn four_state() -> Self {
        Self {
            debounce_threshold_ticks: 500,

            strike_window_min_ms: 5_000,
            strike_window_max_ms: 7_000,
            strike_decay_after_ms: 10_000,
            strike_threshold: 3,
            strike_comparison: StrikeComparison::AtLeast,

            open_duration_ms: 8_500,
            dead_time_ms: Some(1_000),
            retract_duration_ms: 12_000,

            remote_retract: false,
            publish_beeps: true,
            finished_notify: FinishedNotify::AtMatch,

            loop_interval_ms: 1,
            reconnect_backoff_ms: 1_000,
            wifi_poll_interval_ms: 100,
        }
    }

    /// Shorter open/retract, no dead time, remote retract override.
    pub fn three_state() -> Self {
        Self {
            strike_comparison: StrikeComparison::MoreThan,
            open_duration_ms: 5_000,
            dead_time_ms: None,
            retract_duration_ms: 10_000,
            remote_retract: true,
            publish_beeps: false,
            finished_notify: FinishedNotify::AtTransition,
            ..Self::four_state()
        }
    }

    /// Reject profiles the state machine cannot run sensibly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_threshold_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "debounce_threshold_ticks must be > 0",
            ));
        }
        if self.strike_window_min_ms + 1 >= self.strike_window_max_ms {
            return Err(ConfigError::ValidationFailed(
                "strike window is empty (min must be below max - 1)",
            ));
        }
        if self.strike_decay_after_ms <= self.strike_window_max_ms {
            return Err(ConfigError::ValidationFailed(
                "strike decay must start after the strike window closes",
            ));
        }
        if self.strike_threshold == 0 {
            return Err(ConfigError::ValidationFailed("strike_threshold must be > 0"));
        }
        if self.open_duration_ms == 0 || self.retract_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "open and retract durations must be > 0",
            ));
        }
        if self.dead_time_ms == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "dead_time_ms must be > 0 when present",
            ));
        }
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms must be > 0"));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::four_state()
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

pub const WIFI_SSID: &str = "yourwifi";
pub const WIFI_PASSWORD: &str = "password";
pub const MQTT_BROKER_URL: &str = "mqtt://192.168.82.10:1883";
pub const MQTT_CLIENT_ID: &str = "dishwasher";
pub const MQTT_USER: &str = "guest";
pub const MQTT_PASSWORD: &str = "guest";

/// MQTT topic names.  Inbound command topics are matched exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub open: heapless::String<64>,
    pub retract: heapless::String<64>,
    pub finished: heapless::String<64>,
    pub beeped: heapless::String<64>,
    pub state: heapless::String<64>,
}

impl TopicConfig {
    /// Build the topic set under a common prefix (e.g. `home.dishwasher`).
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            open: topic(prefix, "cmd.open"),
            retract: topic(prefix, "cmd.retract"),
            finished: topic(prefix, "finished"),
            beeped: topic(prefix, "beeped"),
            state: topic(prefix, "state"),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self::with_prefix("home.dishwasher")
    }
}

fn topic(prefix: &str, leaf: &str) -> heapless::String<64> {
    let mut s = heapless::String::new();
    // Prefixes are compile-time constants; an overlong one is truncated
    // rather than failing boot.
    for part in [prefix, "/", leaf] {
        for c in part.chars() {
            if s.push(c).is_err() {
                return s;
            }
        }
    }
    s
}

/// Connection parameters for the WiFi station and MQTT broker.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    pub broker_url: &'static str,
    pub client_id: &'static str,
    pub username: &'static str,
    pub password: &'static str,
    pub topics: TopicConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: WIFI_SSID,
            wifi_password: WIFI_PASSWORD,
            broker_url: MQTT_BROKER_URL,
            client_id: MQTT_CLIENT_ID,
            username: MQTT_USER,
            password: MQTT_PASSWORD,
            topics: TopicConfig::default(),
        }
    }
}
