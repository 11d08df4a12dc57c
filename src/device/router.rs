use std::collections::HashMap;
use tracing::{debug, warn};

use super::state::{DeviceField, DeviceState};
use crate::mqtt::message_manager::MQTTMessage;
use crate::mqtt::topics::{TopicKind, TopicSet};

pub const ONLINE: &str = "online";

/// Display classification of a status payload.
///
/// Only the exact payload `"online"` counts as connected. Anything else, including
/// payloads that are neither online nor offline, is shown as disconnected while the
/// raw payload is still stored in the device state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

impl LinkState {
    pub fn classify(payload: &str) -> Self {
        if payload == ONLINE {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }
}

/// What the router did with one inbound message.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteOutcome {
    /// Payload was not text; nothing changed
    Dropped { topic: String },
    Status {
        message: MQTTMessage,
        link: LinkState,
        snapshot: DeviceState,
    },
    Ack { message: MQTTMessage },
    StateUpdate {
        message: MQTTMessage,
        field: DeviceField,
        snapshot: DeviceState,
    },
    /// Our own commands or topics we do not know
    Ignored { message: MQTTMessage },
}

impl RouteOutcome {
    pub fn snapshot(&self) -> Option<&DeviceState> {
        match self {
            RouteOutcome::Status { snapshot, .. } | RouteOutcome::StateUpdate { snapshot, .. } => {
                Some(snapshot)
            }
            _ => None,
        }
    }

    /// Console lines for this outcome, in print order. The echo and the state block
    /// are preceded by a blank line, the status and ack lines follow the echo directly.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self {
            RouteOutcome::Dropped { .. } => {}
            RouteOutcome::Status { message, link, .. } => {
                lines.push(format!("\n{}", message));
                lines.push(match link {
                    LinkState::Connected => "DEVICE CONNECTED".to_string(),
                    LinkState::Disconnected => "DEVICE DISCONNECTED (LWT)".to_string(),
                });
            }
            RouteOutcome::Ack { message } => {
                lines.push(format!("\n{}", message));
                lines.push(format!("Device acknowledged: {}", message.content));
            }
            RouteOutcome::StateUpdate { message, .. } | RouteOutcome::Ignored { message } => {
                lines.push(format!("\n{}", message));
            }
        }
        if let Some(snapshot) = self.snapshot() {
            lines.push(format!("\n{}", snapshot));
        }
        lines
    }
}

/// Owns the device state and applies inbound messages to it.
pub struct Router {
    routes: HashMap<String, TopicKind>,
    state: DeviceState,
}

impl Router {
    pub fn new(topics: &TopicSet) -> Self {
        Router {
            routes: topics.routes(),
            state: DeviceState::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn route(&mut self, topic: &str, payload: &[u8]) -> RouteOutcome {
        let message = match MQTTMessage::decode(topic, payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping message on {}: payload is not UTF-8: {}", topic, e);
                return RouteOutcome::Dropped {
                    topic: topic.to_string(),
                };
            }
        };

        let field = match self.routes.get(topic) {
            Some(TopicKind::Status) => {
                let link = LinkState::classify(&message.content);
                self.state
                    .update(DeviceField::ConnectionStatus, message.content.as_str());
                return RouteOutcome::Status {
                    message,
                    link,
                    snapshot: self.state.snapshot(),
                };
            }
            Some(TopicKind::Ack) => return RouteOutcome::Ack { message },
            Some(TopicKind::Level) => DeviceField::Level,
            Some(TopicKind::Pump) => DeviceField::PumpState,
            Some(TopicKind::Alarm) => DeviceField::AlarmState,
            Some(TopicKind::DateTime) => DeviceField::LastTimestamp,
            Some(TopicKind::Command) | None => {
                debug!("No handler for topic {}", topic);
                return RouteOutcome::Ignored { message };
            }
        };

        self.state.update(field, message.content.as_str());
        RouteOutcome::StateUpdate {
            message,
            field,
            snapshot: self.state.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> (Router, TopicSet) {
        let topics = TopicSet::new("UNRaf", "D8BC38E423D0");
        (Router::new(&topics), topics)
    }

    #[test]
    fn last_write_wins_per_field() {
        let (mut router, topics) = router();
        let sequence = [
            (&topics.level, "10"),
            (&topics.pump, "ON"),
            (&topics.level, "20"),
            (&topics.alarm, "HIGH"),
            (&topics.datetime, "2025-10-01 12:00:00"),
            (&topics.pump, "OFF"),
            (&topics.status, "online"),
            (&topics.alarm, "NONE"),
        ];
        for (topic, payload) in sequence {
            router.route(topic, payload.as_bytes());
        }

        let state = router.state();
        assert_eq!(state.connection_status, "online");
        assert_eq!(state.level, "20");
        assert_eq!(state.pump_state, "OFF");
        assert_eq!(state.alarm_state, "NONE");
        assert_eq!(state.last_timestamp, "2025-10-01 12:00:00");
    }

    #[test]
    fn status_classification_is_one_sided() {
        let (mut router, topics) = router();

        match router.route(&topics.status, b"online") {
            RouteOutcome::Status { link, .. } => assert_eq!(link, LinkState::Connected),
            other => panic!("unexpected outcome {:?}", other),
        }
        match router.route(&topics.status, b"offline") {
            RouteOutcome::Status { link, snapshot, .. } => {
                assert_eq!(link, LinkState::Disconnected);
                assert_eq!(snapshot.connection_status, "offline");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        match router.route(&topics.status, b"Online") {
            RouteOutcome::Status { link, .. } => assert_eq!(link, LinkState::Disconnected),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(router.state().connection_status, "Online");
    }

    #[test]
    fn ack_leaves_state_alone_and_prints_no_snapshot() {
        let (mut router, topics) = router();
        router.route(&topics.level, b"55");
        let before = router.state().clone();

        let outcome = router.route(&topics.ack, b"OK");
        assert!(matches!(outcome, RouteOutcome::Ack { .. }));
        assert!(outcome.snapshot().is_none());
        assert_eq!(
            outcome.render(),
            vec![
                "\n[UNRaf/D8BC38E423D0/ack] → OK".to_string(),
                "Device acknowledged: OK".to_string(),
            ]
        );
        assert_eq!(router.state(), &before);
    }

    #[test]
    fn state_topics_render_echo_then_snapshot() {
        let (mut router, topics) = router();
        let lines = router.route(&topics.level, b"80").render();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "\n[UNRaf/D8BC38E423D0/nivel] → 80");
        assert!(lines[1].contains("Level:      80"));

        let lines = router.route(&topics.status, b"offline").render();
        assert_eq!(lines[1], "DEVICE DISCONNECTED (LWT)");
        assert!(lines[2].contains("Connection: offline"));
    }

    #[test]
    fn blank_lines_only_before_echo_and_state_block() {
        let (mut router, topics) = router();
        let lines = router.route(&topics.status, b"online").render();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "\n[UNRaf/D8BC38E423D0/status] → online");
        assert_eq!(lines[1], "DEVICE CONNECTED");
        assert!(lines[2].starts_with("\n===== DEVICE STATE ====="));
    }

    #[test]
    fn command_echo_and_foreign_topics_are_ignored() {
        let (mut router, topics) = router();
        let outcome = router.route(&topics.cmd, br#"{"command": "set_max", "tiempo": 5}"#);
        assert!(matches!(outcome, RouteOutcome::Ignored { .. }));

        let outcome = router.route("UNRaf/D8BC38E423D0/firmware", b"1.2.0");
        assert!(matches!(outcome, RouteOutcome::Ignored { .. }));
        assert_eq!(outcome.render().len(), 1);
        assert_eq!(router.state(), &DeviceState::default());
    }

    #[test]
    fn undecodable_payload_is_dropped() {
        let (mut router, topics) = router();
        let outcome = router.route(&topics.level, &[0xc3, 0x28]);
        assert_eq!(
            outcome,
            RouteOutcome::Dropped {
                topic: topics.level.clone()
            }
        );
        assert!(outcome.render().is_empty());
        assert_eq!(router.state(), &DeviceState::default());

        router.route(&topics.level, b"12");
        assert_eq!(router.state().level, "12");
    }

    #[test]
    fn redelivery_is_idempotent() {
        let (mut router, topics) = router();
        router.route(&topics.alarm, b"LOW");
        let first = router.state().clone();
        router.route(&topics.alarm, b"LOW");
        assert_eq!(router.state(), &first);
    }
}
