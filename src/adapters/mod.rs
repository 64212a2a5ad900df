//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `hardware` | SensorPort         | Tone detector GPIO       |
//! |            | ActuatorPort       | H-bridge GPIO            |
//! | `log_sink` | EventSink          | Serial log output        |
//! | `mqtt`     | MessageTransport   | ESP-IDF MQTT client      |
//! | `time`     | Clock              | ESP32 system timer       |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
