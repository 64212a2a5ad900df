//! GPIO pin assignments for the opener board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  On the device these numbers select the
//! `esp_idf_hal` GPIO peripherals in `main.rs`.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED.  Blinks while joining WiFi, LOW once MQTT is connected.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Tone detector
// ---------------------------------------------------------------------------

/// Output of the external tone-detector board.  LOW while a beep is heard.
pub const DETECTOR_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Linear actuator motor driver (H-bridge)
// ---------------------------------------------------------------------------

/// Direction line A: LOW while opening, HIGH while retracting.
pub const ACTUATOR_A_GPIO: i32 = 14;
/// Direction line B: HIGH while opening, LOW while retracting.
pub const ACTUATOR_B_GPIO: i32 = 12;
/// Driver enable: HIGH while the actuator is moving.
pub const ACTUATOR_EN_GPIO: i32 = 13;
