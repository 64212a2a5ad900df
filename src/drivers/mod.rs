//! Peripheral drivers, generic over `embedded-hal` digital pins.

pub mod actuator;
pub mod detector;
pub mod status_led;
