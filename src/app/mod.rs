//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the dishwasher opener:
//! detector sampling, FSM orchestration and the translation between MQTT
//! topics and domain commands/events.  All interaction with hardware and
//! the network happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod translate;
