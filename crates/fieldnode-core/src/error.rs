//! Error types for the field node runtime

use thiserror::Error;

use crate::MessageType;

/// Envelope decoding errors
///
/// An unrecognized `msgType` is not an error: it decodes to
/// [`MessageType::Unknown`] and is discarded at dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Core node errors
#[derive(Error, Debug)]
pub enum NodeError {
    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Wire errors
    #[error(transparent)]
    Decode(#[from] DecodeError),

    // Protocol errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Send rejected in phase {phase}: {message_type:?}")]
    SendRejected {
        phase: &'static str,
        message_type: MessageType,
    },

    // Command errors
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Effector '{command}' failed: {reason}")]
    Effector { command: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl NodeError {
    /// Short label used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            NodeError::Transport(_) => "transport",
            NodeError::Decode(_) => "decode",
            NodeError::Protocol(_) => "protocol",
            NodeError::SendRejected { .. } => "send_rejected",
            NodeError::UnknownCommand(_) => "unknown_command",
            NodeError::Effector { .. } => "effector",
            NodeError::Config(_) => "config",
        }
    }
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts_into_node_error() {
        fn parse() -> NodeResult<()> {
            Err(DecodeError::MissingField("msgType"))?;
            Ok(())
        }

        let err = parse().unwrap_err();
        assert_eq!(err.kind(), "decode");
        assert_eq!(err.to_string(), "Missing field: msgType");
    }

    #[test]
    fn test_send_rejected_display() {
        let err = NodeError::SendRejected {
            phase: "Verifying",
            message_type: MessageType::Telemetry,
        };
        assert_eq!(err.to_string(), "Send rejected in phase Verifying: Telemetry");
    }
}
