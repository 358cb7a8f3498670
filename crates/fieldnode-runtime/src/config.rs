//! Node configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Durations are human-readable strings ("250ms", "5s").

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fieldnode_core::{NodeError, NodeResult};
use fieldnode_wire::DEFAULT_MAX_FRAME_SIZE;

/// Field node configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// `clientType` announced in the verification request
    pub node_class: String,
    /// `msgSource` used before an identity is assigned
    pub unverified_source: String,
    /// `msgTarget` of every outbound envelope
    pub coordinator_id: String,
    /// Coordinator address for the TCP link. The link exchanges
    /// newline-delimited JSON envelopes over plain TCP; a WebSocket
    /// endpoint will not answer the handshake.
    pub coordinator_addr: String,
    /// Delay between connection attempts
    #[serde(with = "duration_str")]
    pub reconnect_interval: Duration,
    /// Cadence of the ingest-sensor tasks
    #[serde(with = "duration_str")]
    pub ingest_interval: Duration,
    /// Cadence of the sample-and-store tasks
    #[serde(with = "duration_str")]
    pub sample_interval: Duration,
    /// Cadence of the transmit-telemetry task
    #[serde(with = "duration_str")]
    pub transmit_interval: Duration,
    /// Largest frame (complete or partial) kept in the inbound buffer
    pub max_frame_size: usize,
    /// Re-send a verification request unanswered for this long.
    /// `None` waits until the transport reconnects.
    #[serde(with = "opt_duration_str")]
    pub verification_resend: Option<Duration>,
    /// Number of recent command ids remembered for de-duplication (0 = off)
    pub command_dedup_window: usize,
    /// Logging
    pub log: LogConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            node_class: "rover".into(),
            unverified_source: "rover-placeholder-source-id".into(),
            coordinator_id: "server-main".into(),
            coordinator_addr: "127.0.0.1:7400".into(),
            reconnect_interval: Duration::from_secs(5),
            ingest_interval: Duration::from_millis(50),
            sample_interval: Duration::from_millis(250),
            transmit_interval: Duration::from_millis(500),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            verification_resend: None,
            command_dedup_window: 0,
            log: LogConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> NodeResult<Self> {
        let config: NodeConfig =
            serde_json::from_str(json).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> NodeResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> NodeResult<()> {
        let intervals = [
            ("reconnect_interval", Some(self.reconnect_interval)),
            ("ingest_interval", Some(self.ingest_interval)),
            ("sample_interval", Some(self.sample_interval)),
            ("transmit_interval", Some(self.transmit_interval)),
            ("verification_resend", self.verification_resend),
        ];
        for (name, interval) in intervals {
            if interval == Some(Duration::ZERO) {
                return Err(NodeError::Config(format!("{} must be non-zero", name)));
            }
        }
        if self.max_frame_size == 0 {
            return Err(NodeError::Config("max_frame_size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".into(),
            json: false,
        }
    }
}

mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

mod opt_duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
