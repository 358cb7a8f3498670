//! Connection state machine
//!
//! Tracks transport connectivity and the verification handshake:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Verifying -> Verified
//!       ^                                                    |
//!       +---------------------- disconnect ------------------+
//! ```
//!
//! On connect a verification request is emitted immediately and the
//! session waits in `Verifying` for an `assignedID` reply. The assigned
//! identity survives reconnects; the coordinator re-issues the same one.

use std::fmt;
use std::time::Duration;

use fieldnode_core::{
    Envelope, MessageIdGenerator, MessageType, MonotonicTime, NodeError, NodeResult, Payload,
};
use fieldnode_time::is_due;
use fieldnode_transport::Transport;
use fieldnode_wire::encode;

/// Verification payload field carrying the node class
pub const CLIENT_TYPE_FIELD: &str = "clientType";

/// Assignment payload field carrying the node identity
pub const ASSIGNED_ID_FIELD: &str = "assignedID";

/// Session phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected,
    Verifying,
    Verified,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Disconnected => "Disconnected",
            Phase::Connecting => "Connecting",
            Phase::Connected => "Connected",
            Phase::Verifying => "Verifying",
            Phase::Verified => "Verified",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The node's single session record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionState {
    pub phase: Phase,
    /// Identity issued by the coordinator, empty until assigned
    pub assigned_id: String,
    /// When the outstanding verification request was sent
    pub last_verification_sent_at: Option<MonotonicTime>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState {
            phase: Phase::Disconnected,
            assigned_id: String::new(),
            last_verification_sent_at: None,
        }
    }
}

/// Fixed identity fields of outbound envelopes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeIdentity {
    /// `clientType` of the verification request
    pub node_class: String,
    /// `msgSource` until an identity is assigned
    pub unverified_source: String,
    /// `msgTarget` of every outbound envelope
    pub coordinator_id: String,
}

/// Outcome of routing one inbound envelope
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Identity assigned, session is now verified
    Verified(String),
    /// Command accepted for dispatch
    Command(Envelope),
    /// Known type not acceptable in the current phase
    Ignored {
        message_type: MessageType,
        phase: Phase,
    },
    /// Unrecognized type tag, discarded in every phase
    Unknown(String),
}

/// Owner of the [`ConnectionState`]
pub struct ConnectionStateMachine {
    state: ConnectionState,
    identity: NodeIdentity,
    ids: MessageIdGenerator,
    verification_resend: Option<Duration>,
}

impl ConnectionStateMachine {
    pub fn new(identity: NodeIdentity, ids: MessageIdGenerator) -> Self {
        ConnectionStateMachine {
            state: ConnectionState::default(),
            identity,
            ids,
            verification_resend: None,
        }
    }

    /// Re-send verification when unanswered for `interval` (off by default)
    pub fn with_verification_resend(mut self, interval: Option<Duration>) -> Self {
        self.verification_resend = interval;
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn assigned_id(&self) -> &str {
        &self.state.assigned_id
    }

    pub fn is_verified(&self) -> bool {
        self.state.phase == Phase::Verified
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Transport started a connection attempt
    pub fn on_connecting(&mut self) {
        if self.state.phase == Phase::Disconnected {
            self.transition(Phase::Connecting);
        } else {
            tracing::debug!(phase = %self.state.phase, "connecting event ignored");
        }
    }

    /// Transport is up: emit a verification request
    ///
    /// Returns the request to send, or `None` if a session is already
    /// established (at most one request is ever outstanding).
    pub fn on_connected(&mut self, now: MonotonicTime) -> Option<Envelope> {
        match self.state.phase {
            Phase::Disconnected | Phase::Connecting => {
                self.transition(Phase::Connected);
                let request = self.verification_request(now);
                self.transition(Phase::Verifying);
                Some(request)
            }
            phase => {
                tracing::warn!(phase = %phase, "connected event while session active");
                None
            }
        }
    }

    /// Transport went down. The assigned identity is kept.
    pub fn on_disconnected(&mut self) {
        if self.state.phase != Phase::Disconnected {
            self.transition(Phase::Disconnected);
        }
        self.state.last_verification_sent_at = None;
    }

    /// Replace an unanswered verification request once the re-send
    /// interval has elapsed
    pub fn poll_resend(&mut self, now: MonotonicTime) -> Option<Envelope> {
        let interval = self.verification_resend?;
        if self.state.phase != Phase::Verifying {
            return None;
        }
        let sent_at = self.state.last_verification_sent_at?;
        if !is_due(now, sent_at, interval) {
            return None;
        }
        tracing::info!(
            waited_ms = now.saturating_duration_since(sent_at).as_millis() as u64,
            "verification unanswered, re-sending"
        );
        Some(self.verification_request(now))
    }

    /// Route an inbound envelope
    ///
    /// A malformed assignment is a protocol error: the state is left
    /// unchanged and no retry is scheduled.
    pub fn handle_inbound(&mut self, envelope: Envelope) -> NodeResult<Inbound> {
        let phase = self.state.phase;
        match envelope.message_type.clone() {
            MessageType::AssignedId if phase == Phase::Verifying => {
                let assigned = match envelope.payload.get(ASSIGNED_ID_FIELD) {
                    Some(value) => match value.as_str() {
                        Some(id) if !id.is_empty() => id.to_string(),
                        Some(_) => {
                            return Err(NodeError::Protocol(format!(
                                "empty '{}' in assignment",
                                ASSIGNED_ID_FIELD
                            )))
                        }
                        None => {
                            return Err(NodeError::Protocol(format!(
                                "'{}' is {}, expected string",
                                ASSIGNED_ID_FIELD,
                                value.type_name()
                            )))
                        }
                    },
                    None => {
                        return Err(NodeError::Protocol(format!(
                            "assignment without '{}'",
                            ASSIGNED_ID_FIELD
                        )))
                    }
                };

                if !self.state.assigned_id.is_empty() && self.state.assigned_id != assigned {
                    tracing::info!(
                        previous = %self.state.assigned_id,
                        assigned = %assigned,
                        "coordinator issued a new identity"
                    );
                }
                self.state.assigned_id = assigned.clone();
                self.state.last_verification_sent_at = None;
                self.transition(Phase::Verified);
                tracing::info!(assigned_id = %assigned, "identity assigned");
                Ok(Inbound::Verified(assigned))
            }
            MessageType::Command if phase == Phase::Verified => Ok(Inbound::Command(envelope)),
            MessageType::Unknown(tag) => Ok(Inbound::Unknown(tag)),
            other => Ok(Inbound::Ignored {
                message_type: other,
                phase,
            }),
        }
    }

    /// Can an envelope of this type be sent in the current phase?
    pub fn admits(&self, message_type: &MessageType) -> bool {
        match message_type {
            MessageType::Verification => {
                matches!(self.state.phase, Phase::Connected | Phase::Verifying)
            }
            _ => self.state.phase == Phase::Verified,
        }
    }

    /// Encode and forward an envelope, if the phase allows it
    pub fn send<T: Transport + ?Sized>(
        &self,
        envelope: &Envelope,
        transport: &mut T,
    ) -> NodeResult<()> {
        if !self.admits(&envelope.message_type) {
            return Err(NodeError::SendRejected {
                phase: self.state.phase.name(),
                message_type: envelope.message_type.clone(),
            });
        }
        let frame = encode(envelope);
        transport.send_frame(&frame)?;
        tracing::debug!(
            msg_id = %envelope.id,
            msg_type = %envelope.message_type,
            bytes = frame.len(),
            "frame sent"
        );
        Ok(())
    }

    /// Build a telemetry envelope under the assigned identity
    pub fn telemetry_envelope(&mut self, payload: Payload, timestamp: &str) -> Envelope {
        Envelope::new(
            self.ids.next_id(),
            MessageType::Telemetry,
            self.state.assigned_id.clone(),
            self.identity.coordinator_id.clone(),
        )
        .with_timestamp(timestamp)
        .with_payload(payload)
    }

    fn verification_request(&mut self, now: MonotonicTime) -> Envelope {
        self.state.last_verification_sent_at = Some(now);
        Envelope::new(
            self.ids.next_id(),
            MessageType::Verification,
            self.identity.unverified_source.clone(),
            self.identity.coordinator_id.clone(),
        )
        .with_payload(Payload::new().with(CLIENT_TYPE_FIELD, self.identity.node_class.as_str()))
    }

    fn transition(&mut self, to: Phase) {
        tracing::info!(from = %self.state.phase, to = %to, "phase");
        self.state.phase = to;
    }
}

impl fmt::Debug for ConnectionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionStateMachine")
            .field("state", &self.state)
            .field("identity", &self.identity)
            .field("verification_resend", &self.verification_resend)
            .finish()
    }
}
