use std::collections::HashMap;

/// What a topic under the device namespace means to us.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Online / offline, the device publishes "offline" as its LWT
    Status,
    Ack,
    Command,
    Level,
    Pump,
    Alarm,
    DateTime,
}

impl TopicKind {
    pub const ALL: [TopicKind; 7] = [
        TopicKind::Status,
        TopicKind::Ack,
        TopicKind::Command,
        TopicKind::Level,
        TopicKind::Pump,
        TopicKind::Alarm,
        TopicKind::DateTime,
    ];

    /// Last path segment the device firmware uses for this topic.
    pub fn suffix(self) -> &'static str {
        match self {
            TopicKind::Status => "status",
            TopicKind::Ack => "ack",
            TopicKind::Command => "cmd",
            TopicKind::Level => "nivel",
            TopicKind::Pump => "bomba",
            TopicKind::Alarm => "alarma",
            TopicKind::DateTime => "datetime",
        }
    }
}

/// All topics of one device, built once from `{tenant}/{device}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSet {
    base: String,
    pub status: String,
    pub ack: String,
    pub cmd: String,
    pub level: String,
    pub pump: String,
    pub alarm: String,
    pub datetime: String,
}

impl TopicSet {
    pub fn new(tenant: &str, device_id: &str) -> Self {
        let base = format!("{}/{}", tenant, device_id);
        let topic = |kind: TopicKind| format!("{}/{}", base, kind.suffix());

        TopicSet {
            status: topic(TopicKind::Status),
            ack: topic(TopicKind::Ack),
            cmd: topic(TopicKind::Command),
            level: topic(TopicKind::Level),
            pump: topic(TopicKind::Pump),
            alarm: topic(TopicKind::Alarm),
            datetime: topic(TopicKind::DateTime),
            base,
        }
    }

    /// Wildcard filter covering every topic of the device.
    pub fn subscription(&self) -> String {
        format!("{}/#", self.base)
    }

    pub fn get(&self, kind: TopicKind) -> &str {
        match kind {
            TopicKind::Status => &self.status,
            TopicKind::Ack => &self.ack,
            TopicKind::Command => &self.cmd,
            TopicKind::Level => &self.level,
            TopicKind::Pump => &self.pump,
            TopicKind::Alarm => &self.alarm,
            TopicKind::DateTime => &self.datetime,
        }
    }

    /// Exact-match dispatch table from full topic string to its kind.
    pub fn routes(&self) -> HashMap<String, TopicKind> {
        TopicKind::ALL
            .iter()
            .map(|&kind| (self.get(kind).to_string(), kind))
            .collect()
    }
}
