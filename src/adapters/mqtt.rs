//! MQTT transport adapter.
//!
//! Implements [`MessageTransport`] (publish/subscribe against the home
//! broker) and provides [`ensure_connected`], the blocking reconnect
//! step that runs at the top of every control-loop iteration.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   Its event callback runs on the MQTT task; it only flips the shared
//!   connection flags and queues inbound topics for the control loop.
//! - **all other targets**: an in-memory broker simulation for host tests.
//!
//! ## Reconnection policy
//!
//! Fixed backoff: while the session is down the control loop blocks,
//! retrying once per `reconnect_backoff_ms` with the status LED high.
//! Command topics are re-subscribed on every new session.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::{MessageTransport, TOPIC_CAP};
use crate::app::translate::CommandTranslator;
use crate::drivers::status_led::StatusLed;
use crate::error::CommsError;

/// Inbound topics buffered between control-loop iterations.
pub const INBOUND_CAP: usize = 8;

// ───────────────────────────────────────────────────────────────
// Blocking reconnect
// ───────────────────────────────────────────────────────────────

/// Block until `transport` holds a session subscribed to every command
/// topic.  Returns the number of attempts made (0 if already connected).
pub fn ensure_connected<T, P, D>(
    transport: &mut T,
    translator: &CommandTranslator,
    led: &mut StatusLed<P>,
    delay: &mut D,
    backoff_ms: u32,
) -> u32
where
    T: MessageTransport + ?Sized,
    P: OutputPin,
    D: DelayNs,
{
    if transport.is_connected() {
        return 0;
    }

    let mut attempts = 0u32;
    loop {
        attempts = attempts.wrapping_add(1);
        info!("MQTT: connecting (attempt {})", attempts);
        match open_session(transport, translator) {
            Ok(()) => {
                transport.on_session_ready();
                led.set_low();
                info!("MQTT: connected");
                return attempts;
            }
            Err(e) => {
                led.set_high();
                warn!("MQTT: {}, retrying in {} ms", e, backoff_ms);
                delay.delay_ms(backoff_ms);
            }
        }
    }
}

fn open_session<T: MessageTransport + ?Sized>(
    transport: &mut T,
    translator: &CommandTranslator,
) -> Result<(), CommsError> {
    transport.try_connect()?;
    for topic in translator.subscriptions() {
        transport.subscribe(topic)?;
        info!("MQTT: subscribed to {}", topic);
    }
    Ok(())
}

/// Copy `topic` into a bounded string; `None` if it cannot be a command.
fn bounded_topic(topic: &str) -> Option<heapless::String<TOPIC_CAP>> {
    let mut s = heapless::String::new();
    s.push_str(topic).ok()?;
    Some(s)
}

// ───────────────────────────────────────────────────────────────
// Device adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod device {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use log::{debug, error, warn};

    use super::{INBOUND_CAP, bounded_topic};
    use crate::app::ports::{MessageTransport, TOPIC_CAP};
    use crate::config::NetworkConfig;
    use crate::error::CommsError;

    /// State shared with the MQTT task's event callback.
    #[derive(Default)]
    struct Shared {
        connected: AtomicBool,
        /// Bumped on every `Connected` event.
        session: AtomicU32,
        inbound: Mutex<heapless::Deque<heapless::String<TOPIC_CAP>, INBOUND_CAP>>,
    }

    pub struct MqttAdapter {
        url: &'static str,
        client_id: &'static str,
        username: &'static str,
        password: &'static str,
        client: Option<EspMqttClient<'static>>,
        shared: Arc<Shared>,
        /// Session whose subscriptions are in place.
        ready_session: Option<u32>,
        pending_session: u32,
    }

    impl MqttAdapter {
        pub fn new(network: &NetworkConfig) -> Self {
            Self {
                url: network.broker_url,
                client_id: network.client_id,
                username: network.username,
                password: network.password,
                client: None,
                shared: Arc::new(Shared::default()),
                ready_session: None,
                pending_session: 0,
            }
        }

        fn start_client(&mut self) -> Result<(), CommsError> {
            let conf = MqttClientConfiguration {
                client_id: Some(self.client_id),
                username: Some(self.username),
                password: Some(self.password),
                ..Default::default()
            };
            let shared = Arc::clone(&self.shared);
            let client = EspMqttClient::new_cb(self.url, &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        shared.session.fetch_add(1, Ordering::AcqRel);
                        shared.connected.store(true, Ordering::Release);
                    }
                    EventPayload::Disconnected => {
                        shared.connected.store(false, Ordering::Release);
                    }
                    EventPayload::Received {
                        topic: Some(topic), ..
                    } => {
                        let Some(topic) = bounded_topic(topic) else {
                            debug!("MQTT: dropping overlong topic");
                            return;
                        };
                        if let Ok(mut queue) = shared.inbound.lock() {
                            if queue.push_back(topic).is_err() {
                                warn!("MQTT: inbound queue full, dropping message");
                            }
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|e| {
                error!("MQTT: client start failed: {e}");
                CommsError::MqttConnectFailed
            })?;
            self.client = Some(client);
            Ok(())
        }
    }

    impl MessageTransport for MqttAdapter {
        fn is_connected(&self) -> bool {
            self.shared.connected.load(Ordering::Acquire)
                && self.ready_session == Some(self.shared.session.load(Ordering::Acquire))
        }

        fn try_connect(&mut self) -> Result<(), CommsError> {
            if self.client.is_none() {
                self.start_client()?;
            }
            // The client reconnects on its own; an attempt just checks in.
            self.pending_session = self.shared.session.load(Ordering::Acquire);
            if self.shared.connected.load(Ordering::Acquire) {
                Ok(())
            } else {
                Err(CommsError::MqttConnectFailed)
            }
        }

        fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
            let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
            client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|e| {
                    error!("MQTT: subscribe {topic} failed: {e}");
                    CommsError::MqttSubscribeFailed
                })
        }

        fn on_session_ready(&mut self) {
            self.ready_session = Some(self.pending_session);
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
            if !self.shared.connected.load(Ordering::Acquire) {
                return Err(CommsError::NotConnected);
            }
            let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|e| {
                    debug!("MQTT: publish error {e}");
                    CommsError::MqttPublishFailed
                })
        }

        fn take_inbound(&mut self) -> Option<heapless::String<TOPIC_CAP>> {
            self.shared.inbound.lock().ok()?.pop_front()
        }
    }
}

#[cfg(target_os = "espidf")]
pub use device::MqttAdapter;

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// In-memory broker session for host builds and tests.
#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    connected: bool,
    session_ready: bool,
    failures_left: u32,
    subscriptions: Vec<heapless::String<TOPIC_CAP>>,
    inbound: heapless::Deque<heapless::String<TOPIC_CAP>, INBOUND_CAP>,
    published: Vec<(heapless::String<TOPIC_CAP>, Vec<u8>)>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(_network: &crate::config::NetworkConfig) -> Self {
        Self::simulated(0)
    }

    /// Session whose first `failures` connection attempts are refused.
    pub fn simulated(failures: u32) -> Self {
        Self {
            connected: false,
            session_ready: false,
            failures_left: failures,
            subscriptions: Vec::new(),
            inbound: heapless::Deque::new(),
            published: Vec::new(),
        }
    }

    /// Deliver a message on `topic`, as the broker would.  Only
    /// subscribed topics arrive; returns whether it was queued.
    pub fn inject(&mut self, topic: &str) -> bool {
        if !self.is_connected() || !self.subscriptions.iter().any(|s| s.as_str() == topic) {
            return false;
        }
        bounded_topic(topic).is_some_and(|t| self.inbound.push_back(t).is_ok())
    }

    /// Drop the session, as a broker restart would.
    pub fn drop_connection(&mut self) {
        info!("MQTT(sim): connection dropped");
        self.connected = false;
        self.session_ready = false;
    }

    /// Refuse the next `n` connection attempts.
    pub fn fail_next_connects(&mut self, n: u32) {
        self.failures_left = n;
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(|s| s.as_str())
    }

    /// Everything published so far, oldest first.
    pub fn published(&self) -> &[(heapless::String<TOPIC_CAP>, Vec<u8>)] {
        &self.published
    }
}

#[cfg(not(target_os = "espidf"))]
impl MessageTransport for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.connected && self.session_ready
    }

    fn try_connect(&mut self) -> Result<(), CommsError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(CommsError::MqttConnectFailed);
        }
        self.connected = true;
        self.session_ready = false;
        self.subscriptions.clear();
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        let topic = bounded_topic(topic).ok_or(CommsError::MqttSubscribeFailed)?;
        self.subscriptions.push(topic);
        Ok(())
    }

    fn on_session_ready(&mut self) {
        self.session_ready = true;
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        let topic = bounded_topic(topic).ok_or(CommsError::MqttPublishFailed)?;
        self.published.push((topic, payload.to_vec()));
        Ok(())
    }

    fn take_inbound(&mut self) -> Option<heapless::String<TOPIC_CAP>> {
        self.inbound.pop_front()
    }
}
