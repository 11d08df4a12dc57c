use chrono::NaiveDateTime;
use std::fmt;
use std::str::Utf8Error;

/// A decoded inbound publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MQTTMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for MQTTMessage {
    /// Console echo line, `[topic] → payload`
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] → {}", self.topic, self.content)
    }
}

impl MQTTMessage {
    pub fn from_topic(topic: String, content: String) -> Self {
        MQTTMessage {
            topic,
            content,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    /// Payloads are expected to be UTF-8 text.
    pub fn decode(topic: &str, payload: &[u8]) -> Result<Self, Utf8Error> {
        let content = std::str::from_utf8(payload)?;
        Ok(Self::from_topic(topic.to_string(), content.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_line_shows_topic_and_payload() {
        let msg = MQTTMessage::decode("UNRaf/D8BC38E423D0/nivel", b"73").unwrap();
        assert_eq!(msg.to_string(), "[UNRaf/D8BC38E423D0/nivel] → 73");
    }

    #[test]
    fn non_text_payload_is_rejected() {
        assert!(MQTTMessage::decode("a/b/nivel", &[0xff, 0xfe, 0x00]).is_err());
    }
}
