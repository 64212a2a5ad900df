//! End-to-end MQTT flows: broker topic → translator → AppService →
//! publisher → broker, over the host MQTT simulation.

use dishopener::adapters::mqtt::{MqttAdapter, ensure_connected};
use dishopener::app::commands::AppCommand;
use dishopener::app::events::AppEvent;
use dishopener::app::ports::MessageTransport;
use dishopener::app::service::AppService;
use dishopener::app::translate::{CommandTranslator, EventPublisher, RemoteEventSink};
use dishopener::config::{ControllerConfig, NetworkConfig};
use dishopener::drivers::status_led::StatusLed;
use dishopener::fsm::ActuatorState;

use crate::mock_hw::{MockDelay, MockHardware, MockPin, RecordingSink};

const OPEN: &str = "home.dishwasher/cmd.open";
const RETRACT: &str = "home.dishwasher/cmd.retract";

/// The control loop from `main`, wired to mocks.
struct Device {
    app: AppService,
    hw: MockHardware,
    log: RecordingSink,
    mqtt: MqttAdapter,
    translator: CommandTranslator,
    publisher: EventPublisher,
    led: StatusLed<MockPin>,
    delay: MockDelay,
    backoff_ms: u32,
}

impl Device {
    fn new(config: ControllerConfig) -> Self {
        let network = NetworkConfig::default();
        let mut app = AppService::new(config.clone());
        let mut hw = MockHardware::new();
        let mut log = RecordingSink::default();
        app.start(0, &mut hw, &mut log);
        Self {
            app,
            hw,
            log,
            mqtt: MqttAdapter::new(&network),
            translator: CommandTranslator::new(&network.topics, &config),
            publisher: EventPublisher::new(network.topics.clone(), &config),
            led: StatusLed::new(MockPin::default()),
            delay: MockDelay::default(),
            backoff_ms: config.reconnect_backoff_ms,
        }
    }

    fn step(&mut self, now: u64) {
        ensure_connected(
            &mut self.mqtt,
            &self.translator,
            &mut self.led,
            &mut self.delay,
            self.backoff_ms,
        );
        self.hw.now = now;

        let mut commands: Vec<AppCommand> = Vec::new();
        while let Some(topic) = self.mqtt.take_inbound() {
            commands.extend(self.translator.translate(&topic));
        }

        let mut sink = (
            &mut self.log,
            RemoteEventSink::new(&self.publisher, &mut self.mqtt),
        );
        self.app.tick(now, &mut self.hw, &commands, &mut sink);
    }

    fn run(&mut self, range: core::ops::RangeInclusive<u64>) {
        for t in range {
            self.step(t);
        }
    }

    /// Payloads published on `home.dishwasher/<leaf>`, oldest first.
    fn published(&self, leaf: &str) -> Vec<String> {
        let topic = format!("home.dishwasher/{leaf}");
        self.mqtt
            .published()
            .iter()
            .filter(|(t, _)| t.as_str() == topic)
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

#[test]
fn open_command_over_mqtt_opens_without_finished() {
    let mut dev = Device::new(ControllerConfig::four_state());
    dev.step(0);
    assert!(dev.mqtt.inject(OPEN));
    dev.step(1);

    assert_eq!(dev.app.state(), ActuatorState::Opening);
    assert!(dev.published("finished").is_empty());
    let states = dev.published("state");
    assert_eq!(states.len(), 1);
    let v: serde_json::Value = serde_json::from_str(&states[0]).unwrap();
    assert_eq!(v["from"], "listening");
    assert_eq!(v["to"], "opening");
    assert_eq!(v["at_ms"], 1);
}

#[test]
fn beep_pattern_publishes_each_beep_and_one_finished() {
    let mut dev = Device::new(ControllerConfig::four_state());
    for start in [1_000, 7_000, 13_000, 19_000] {
        dev.hw.tone(start, 501);
    }
    dev.run(0..=20_000);

    assert_eq!(dev.published("beeped"), vec!["beep"; 4]);
    assert_eq!(dev.published("finished"), vec!["finished"]);
    assert_eq!(dev.app.state(), ActuatorState::Opening);
}

#[test]
fn three_state_publishes_no_beeps_and_honours_retract() {
    let mut dev = Device::new(ControllerConfig::three_state());
    for start in [1_000, 7_000, 13_000, 19_000, 25_000] {
        dev.hw.tone(start, 501);
    }
    dev.run(0..=26_000);
    assert!(dev.published("beeped").is_empty());
    assert_eq!(dev.published("finished"), vec!["finished"]);
    assert_eq!(dev.app.state(), ActuatorState::Opening);

    assert!(dev.mqtt.inject(RETRACT));
    dev.step(26_001);
    assert_eq!(dev.app.state(), ActuatorState::Retracting);
}

#[test]
fn four_state_does_not_subscribe_to_retract() {
    let mut dev = Device::new(ControllerConfig::four_state());
    dev.step(0);
    assert!(!dev.mqtt.inject(RETRACT));
    assert_eq!(dev.mqtt.subscriptions().collect::<Vec<_>>(), vec![OPEN]);
}

#[test]
fn reconnect_blocks_then_resubscribes() {
    let mut dev = Device::new(ControllerConfig::four_state());
    dev.step(0);
    dev.mqtt.drop_connection();
    dev.mqtt.fail_next_connects(2);

    dev.step(1);

    assert!(dev.mqtt.is_connected());
    assert_eq!(dev.delay.total_ms, 2_000);
    assert_eq!(dev.led.release().levels.last(), Some(&false));
    assert_eq!(dev.mqtt.subscriptions().collect::<Vec<_>>(), vec![OPEN]);
}

#[test]
fn commands_queued_before_a_drop_still_apply() {
    let mut dev = Device::new(ControllerConfig::four_state());
    dev.step(0);
    assert!(dev.mqtt.inject(OPEN));
    dev.mqtt.drop_connection();
    dev.step(1);
    assert_eq!(dev.app.state(), ActuatorState::Opening);
}

#[test]
fn unknown_topics_produce_no_command() {
    let translator = CommandTranslator::new(
        &NetworkConfig::default().topics,
        &ControllerConfig::three_state(),
    );
    for topic in ["home.dishwasher/cmd.close", "home.dishwasher/finished", "#"] {
        assert_eq!(translator.translate(topic), None);
    }
}

#[test]
fn offline_notifications_are_dropped() {
    let config = ControllerConfig::four_state();
    let network = NetworkConfig::default();
    let publisher = EventPublisher::new(network.topics.clone(), &config);
    let mut mqtt = MqttAdapter::simulated(0);

    publisher.publish(
        &AppEvent::StateChanged {
            from: ActuatorState::Listening,
            to: ActuatorState::Opening,
            at_ms: 5,
        },
        &mut mqtt,
    );
    assert!(mqtt.published().is_empty());
}
