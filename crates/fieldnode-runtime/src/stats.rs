//! Runtime counters

/// Counters maintained by the scheduler
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub ticks: u64,
    pub frames_in: u64,
    pub frames_out: u64,
    pub decode_errors: u64,
    pub protocol_errors: u64,
    pub unknown_messages: u64,
    /// Inbound envelopes not accepted in the current phase
    pub ignored_messages: u64,
    pub commands_dispatched: u64,
    pub commands_rejected: u64,
    /// Commands dropped as duplicates
    pub commands_duplicate: u64,
    pub telemetry_sent: u64,
    /// Transmit task fired while not verified
    pub telemetry_skipped: u64,
    pub verifications_sent: u64,
    pub tasks_fired: u64,
    pub transport_errors: u64,
    /// Transport connect events
    pub connects: u64,
}
