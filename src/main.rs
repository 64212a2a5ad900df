//! Dishwasher Opener Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   MqttAdapter   MonotonicClock │
//! │  (Sensor+Actuator) (EventSink)    (Transport)   (Clock)        │
//! │  WifiAdapter                                                   │
//! │  (Connectivity)                                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  CommandTranslator ──▶ AppService ──▶ EventPublisher           │
//! │                    Detector · FSM                              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-threaded super-loop: reconnect if needed, wait one loop
//! interval, read the clock once, then run one [`AppService::tick`]
//! with the commands received since the last iteration.

#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use embedded_hal::delay::DelayNs;
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;
    use log::{debug, info};

    use dishopener::adapters::hardware::HardwareAdapter;
    use dishopener::adapters::log_sink::LogEventSink;
    use dishopener::adapters::mqtt::{MqttAdapter, ensure_connected};
    use dishopener::adapters::time::MonotonicClock;
    use dishopener::adapters::wifi::{ConnectivityPort, WifiAdapter, join_blocking};
    use dishopener::app::commands::AppCommand;
    use dishopener::app::ports::{Clock, MessageTransport};
    use dishopener::app::service::AppService;
    use dishopener::app::translate::{CommandTranslator, EventPublisher, RemoteEventSink};
    use dishopener::config::{ControllerConfig, NetworkConfig};
    use dishopener::drivers::actuator::LinearActuator;
    use dishopener::drivers::detector::DetectorLine;
    use dishopener::drivers::status_led::StatusLed;
    use dishopener::error::Error;
    use dishopener::pins;

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Dishwasher Opener v{}            ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = ControllerConfig::default();
    config.validate().map_err(Error::from)?;
    let network = NetworkConfig::default();

    // ── 3. GPIO ───────────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each pin number from `pins` is claimed exactly once, here.
    let (led_pin, detector_pin, en_pin, a_pin, b_pin) = unsafe {
        (
            AnyOutputPin::new(pins::LED_GPIO),
            AnyInputPin::new(pins::DETECTOR_GPIO),
            AnyOutputPin::new(pins::ACTUATOR_EN_GPIO),
            AnyOutputPin::new(pins::ACTUATOR_A_GPIO),
            AnyOutputPin::new(pins::ACTUATOR_B_GPIO),
        )
    };

    let mut led = StatusLed::new(PinDriver::output(led_pin).context("LED pin")?);
    let detector = PinDriver::input(detector_pin).context("detector pin")?;
    let actuator = LinearActuator::new(
        PinDriver::output(en_pin).context("actuator EN pin")?,
        PinDriver::output(a_pin).context("actuator A pin")?,
        PinDriver::output(b_pin).context("actuator B pin")?,
    );
    let mut hw = HardwareAdapter::new(DetectorLine::new(detector), actuator);

    // ── 4. Application core (actuator de-energised before networking) ──
    let clock = MonotonicClock::new();
    let mut log_sink = LogEventSink::new();
    let mut app = AppService::new(config.clone());
    app.start(clock.now_ms(), &mut hw, &mut log_sink);

    // ── 5. WiFi ───────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, Some(nvs))?);
    wifi.set_credentials(network.wifi_ssid, network.wifi_password)?;
    let mut delay = FreeRtos;
    join_blocking(&mut wifi, &mut led, &mut delay, config.wifi_poll_interval_ms)?;

    // ── 6. MQTT ───────────────────────────────────────────────
    let translator = CommandTranslator::new(&network.topics, &config);
    let publisher = EventPublisher::new(network.topics.clone(), &config);
    let mut mqtt = MqttAdapter::new(&network);

    info!("Entering control loop");

    // ── 7. Control loop ───────────────────────────────────────
    let mut commands: heapless::Vec<AppCommand, 8> = heapless::Vec::new();
    loop {
        ensure_connected(
            &mut mqtt,
            &translator,
            &mut led,
            &mut delay,
            config.reconnect_backoff_ms,
        );

        delay.delay_ms(config.loop_interval_ms);
        let now = clock.now_ms();

        commands.clear();
        while let Some(topic) = mqtt.take_inbound() {
            let Some(cmd) = translator.translate(&topic) else {
                continue;
            };
            if commands.push(cmd).is_err() {
                debug!("command burst overflow, dropping {:?}", cmd);
            }
        }

        let mut sink = (&mut log_sink, RemoteEventSink::new(&publisher, &mut mqtt));
        app.tick(now, &mut hw, &commands, &mut sink);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "dishopener {}: device firmware, build for an ESP-IDF target",
        env!("CARGO_PKG_VERSION")
    );
}
