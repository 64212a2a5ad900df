//! Boundary translation between MQTT topics and the application core.
//!
//! ```text
//!  inbound topic ──▶ CommandTranslator ──▶ AppCommand ──▶ AppService
//!  AppService ──▶ AppEvent ──▶ EventPublisher ──▶ Notification ──▶ broker
//! ```
//!
//! Inbound messages are identified by topic alone; payloads are ignored.

use log::{debug, warn};
use serde::Serialize;

use crate::config::{ControllerConfig, TopicConfig};
use crate::fsm::ActuatorState;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, MessageTransport};

/// Payload of the `finished` notification.
pub const FINISHED_PAYLOAD: &[u8] = b"finished";
/// Payload of the `beeped` notification.
pub const BEEP_PAYLOAD: &[u8] = b"beep";

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// Maps inbound command topics onto [`AppCommand`]s by exact match.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    open: heapless::String<64>,
    /// `None` when remote retract is disabled: the topic is neither
    /// subscribed nor recognised.
    retract: Option<heapless::String<64>>,
}

impl CommandTranslator {
    pub fn new(topics: &TopicConfig, config: &ControllerConfig) -> Self {
        Self {
            open: topics.open.clone(),
            retract: config.remote_retract.then(|| topics.retract.clone()),
        }
    }

    /// The command for `topic`, or `None` for anything unrecognised.
    pub fn translate(&self, topic: &str) -> Option<AppCommand> {
        if topic == self.open.as_str() {
            return Some(AppCommand::Open);
        }
        if self.retract.as_ref().is_some_and(|r| topic == r.as_str()) {
            return Some(AppCommand::Retract);
        }
        debug!("ignoring message on unrecognised topic {topic}");
        None
    }

    /// Topics the transport must subscribe to after every (re)connect.
    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        core::iter::once(self.open.as_str()).chain(self.retract.as_deref())
    }
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification<'a> {
    pub topic: &'a str,
    pub payload: Vec<u8>,
}

#[derive(Serialize)]
struct StatePayload {
    from: ActuatorState,
    to: ActuatorState,
    at_ms: u64,
}

/// Maps [`AppEvent`]s onto outbound notifications.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    topics: TopicConfig,
    publish_beeps: bool,
}

impl EventPublisher {
    pub fn new(topics: TopicConfig, config: &ControllerConfig) -> Self {
        Self {
            topics,
            publish_beeps: config.publish_beeps,
        }
    }

    /// The notification for `event`, if it has one.
    pub fn notification(&self, event: &AppEvent) -> Option<Notification<'_>> {
        match event {
            AppEvent::CycleFinished(_) => Some(Notification {
                topic: self.topics.finished.as_str(),
                payload: FINISHED_PAYLOAD.to_vec(),
            }),
            AppEvent::Beeped { .. } if self.publish_beeps => Some(Notification {
                topic: self.topics.beeped.as_str(),
                payload: BEEP_PAYLOAD.to_vec(),
            }),
            AppEvent::StateChanged { from, to, at_ms } => {
                let body = StatePayload {
                    from: *from,
                    to: *to,
                    at_ms: *at_ms,
                };
                match serde_json::to_vec(&body) {
                    Ok(payload) => Some(Notification {
                        topic: self.topics.state.as_str(),
                        payload,
                    }),
                    Err(e) => {
                        warn!("state payload encode failed: {e}");
                        None
                    }
                }
            }
            AppEvent::Beeped { .. } | AppEvent::Started(_) => None,
        }
    }

    /// Publish the notification for `event`, if any.  Offline or failed
    /// publishes are dropped with a warning; nothing is queued.
    pub fn publish<T: MessageTransport + ?Sized>(&self, event: &AppEvent, transport: &mut T) {
        let Some(note) = self.notification(event) else {
            return;
        };
        if !transport.is_connected() {
            warn!("offline, dropping notification on {}", note.topic);
            return;
        }
        if let Err(e) = transport.publish(note.topic, &note.payload) {
            warn!("publish to {} failed: {e}", note.topic);
        }
    }
}

/// [`EventSink`] that forwards events to a transport through an
/// [`EventPublisher`].
pub struct RemoteEventSink<'a, T: MessageTransport + ?Sized> {
    publisher: &'a EventPublisher,
    transport: &'a mut T,
}

impl<'a, T: MessageTransport + ?Sized> RemoteEventSink<'a, T> {
    pub fn new(publisher: &'a EventPublisher, transport: &'a mut T) -> Self {
        Self {
            publisher,
            transport,
        }
    }
}

impl<T: MessageTransport + ?Sized> EventSink for RemoteEventSink<'_, T> {
    fn emit(&mut self, event: &AppEvent) {
        self.publisher.publish(event, self.transport);
    }
}
