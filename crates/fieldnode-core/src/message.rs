//! Message type tags
//!
//! The coordinator protocol tags every envelope with a `msgType` string.
//! The tag is resolved once, at decode time, into [`MessageType`]:
//! - Verification: node → coordinator handshake request
//! - AssignedId: coordinator → node identity assignment
//! - Telemetry: node → coordinator sensor report
//! - Command: coordinator → node effector request
//! - Unknown: anything else, kept verbatim for forward compatibility

use std::fmt;

/// Wire tag of the verification request
pub const TAG_VERIFICATION: &str = "verification";
/// Wire tag of the identity assignment
pub const TAG_ASSIGNED_ID: &str = "assignedID";
/// Wire tag of a telemetry report
pub const TAG_TELEMETRY: &str = "TELEMETRY";
/// Wire tag of a command
pub const TAG_COMMAND: &str = "COMMAND";

/// Enumerated envelope type
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Verification,
    AssignedId,
    Telemetry,
    Command,
    /// Unrecognized tag, preserved exactly as received
    Unknown(String),
}

impl MessageType {
    /// Resolve a wire tag. Matching is exact (case-sensitive).
    pub fn from_wire(tag: &str) -> Self {
        match tag {
            TAG_VERIFICATION => MessageType::Verification,
            TAG_ASSIGNED_ID => MessageType::AssignedId,
            TAG_TELEMETRY => MessageType::Telemetry,
            TAG_COMMAND => MessageType::Command,
            other => MessageType::Unknown(other.to_string()),
        }
    }

    /// Wire tag for this type
    pub fn as_wire(&self) -> &str {
        match self {
            MessageType::Verification => TAG_VERIFICATION,
            MessageType::AssignedId => TAG_ASSIGNED_ID,
            MessageType::Telemetry => TAG_TELEMETRY,
            MessageType::Command => TAG_COMMAND,
            MessageType::Unknown(tag) => tag,
        }
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, MessageType::Unknown(_))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags() {
        assert_eq!(MessageType::from_wire("verification"), MessageType::Verification);
        assert_eq!(MessageType::from_wire("assignedID"), MessageType::AssignedId);
        assert_eq!(MessageType::from_wire("TELEMETRY"), MessageType::Telemetry);
        assert_eq!(MessageType::from_wire("COMMAND"), MessageType::Command);
    }

    #[test]
    fn test_unknown_tag_preserved() {
        let ty = MessageType::from_wire("clientConnected");
        assert_eq!(ty, MessageType::Unknown("clientConnected".into()));
        assert_eq!(ty.as_wire(), "clientConnected");
        assert!(ty.is_unknown());
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!(MessageType::from_wire("telemetry").is_unknown());
        assert!(MessageType::from_wire("AssignedID").is_unknown());
    }
}
