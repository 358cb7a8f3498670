//! Envelope definitions
//!
//! The envelope is the uniform message shape exchanged with the
//! coordinator: id, type tag, source, target, best-effort timestamp and a
//! typed payload.

use crate::{MessageType, Payload};

/// A single protocol message
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Unique-per-message token (`msgID`)
    pub id: String,
    /// Type tag (`msgType`)
    pub message_type: MessageType,
    /// Sender identifier (`msgSource`)
    pub source: String,
    /// Recipient identifier (`msgTarget`)
    pub target: String,
    /// Wall-clock timestamp, empty when no time source is available
    pub timestamp: String,
    /// Type-specific fields (`msgPayload`)
    pub payload: Payload,
}

impl Envelope {
    /// Create an envelope with an empty timestamp and payload
    pub fn new(
        id: impl Into<String>,
        message_type: MessageType,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Envelope {
            id: id.into(),
            message_type,
            source: source.into(),
            target: target.into(),
            timestamp: String::new(),
            payload: Payload::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_builder() {
        let env = Envelope::new("id-1", MessageType::Verification, "rover-x", "server-main")
            .with_payload(Payload::new().with("clientType", "rover"));

        assert_eq!(env.id, "id-1");
        assert_eq!(env.message_type, MessageType::Verification);
        assert!(env.timestamp.is_empty());
        assert_eq!(env.payload.get_str("clientType"), Some("rover"));
    }
}
