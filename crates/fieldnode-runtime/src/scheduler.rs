//! Cooperative multi-rate scheduler
//!
//! `tick` is called repeatedly by the host's control loop. It never loops
//! internally, never sleeps and never propagates an error: everything that
//! goes wrong is logged, counted in [`RuntimeStats`], and the tick goes on.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use fieldnode_core::{DecodeError, Envelope, MessageIdGenerator, MonotonicTime, NodeError};
use fieldnode_sensors::{SensorAggregator, SensorSet};
use fieldnode_time::Clock;
use fieldnode_transport::{Transport, TransportEvent};
use fieldnode_wire::{decode, FrameAssembler};

use crate::{
    telemetry_payload, CommandDispatcher, Inbound, NodeConfig, NodeContext, Phase, RecentIds,
    RuntimeStats, TaskAction,
};

/// The node's single control context
pub struct Scheduler<T: Transport, C: Clock> {
    context: NodeContext,
    transport: T,
    clock: C,
    frames: FrameAssembler,
    recent_commands: RecentIds,
    stats: RuntimeStats,
}

impl<T: Transport, C: Clock> Scheduler<T, C> {
    /// Create a scheduler over an existing context
    pub fn new(config: &NodeConfig, context: NodeContext, transport: T, clock: C) -> Self {
        Scheduler {
            context,
            transport,
            clock,
            frames: FrameAssembler::new(config.max_frame_size),
            recent_commands: RecentIds::new(config.command_dedup_window),
            stats: RuntimeStats::default(),
        }
    }

    /// Create a scheduler with the standard task list, starting now
    pub fn build(
        config: &NodeConfig,
        sensors: SensorAggregator,
        dispatcher: CommandDispatcher,
        transport: T,
        clock: C,
    ) -> Self {
        let now = clock.now();
        let context = NodeContext::new(config, sensors, dispatcher, MessageIdGenerator::new(), now);
        Self::new(config, context, transport, clock)
    }

    pub fn context(&self) -> &NodeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut NodeContext {
        &mut self.context
    }

    pub fn phase(&self) -> Phase {
        self.context.session.phase()
    }

    pub fn samples(&self) -> &SensorSet {
        &self.context.samples
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one scheduler pass
    ///
    /// Inbound processing always precedes task execution, so an identity
    /// or command arriving in this tick is applied before the transmit
    /// decision.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.stats.ticks += 1;

        // Stage 1: Transport events and inbound frames
        self.drain_transport(now);

        // Stage 2: Unanswered verification
        if let Some(request) = self.context.session.poll_resend(now) {
            self.send_verification(request);
        }

        // Stage 3: Due tasks, in list order
        self.run_due_tasks(now);

        tracing::trace!(tick = self.stats.ticks, phase = %self.phase(), "tick");
    }

    /// Drive `tick` every `period` until `shutdown` completes
    ///
    /// A late tick is not caught up; the next one follows a full period
    /// later.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, period: Duration, shutdown: F) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => self.tick(),
            }
        }
        tracing::info!(ticks = self.stats.ticks, "scheduler stopped");
    }

    fn drain_transport(&mut self, now: MonotonicTime) {
        while let Some(event) = self.transport.poll_event() {
            tracing::trace!(event = event.name(), "transport event");

            match event {
                TransportEvent::Connecting => self.context.session.on_connecting(),
                TransportEvent::Connected => {
                    self.stats.connects += 1;
                    self.frames.clear();
                    if let Some(request) = self.context.session.on_connected(now) {
                        self.send_verification(request);
                    }
                }
                TransportEvent::Disconnected => {
                    self.frames.clear();
                    self.context.session.on_disconnected();
                }
                TransportEvent::Message(bytes) => {
                    self.frames.push(&bytes);
                    self.drain_frames();
                    if let Some(err) = self.frames.end_of_message() {
                        self.record_decode_error(err);
                    }
                }
                TransportEvent::Data(bytes) => {
                    self.frames.push(&bytes);
                    self.drain_frames();
                }
            }
        }
    }

    fn drain_frames(&mut self) {
        while let Some(frame) = self.frames.next_frame() {
            match frame {
                Ok(bytes) => {
                    self.stats.frames_in += 1;
                    match decode(&bytes) {
                        Ok(envelope) => self.route(envelope),
                        Err(err) => self.record_decode_error(err),
                    }
                }
                Err(err) => self.record_decode_error(err),
            }
        }
    }

    fn route(&mut self, envelope: Envelope) {
        let msg_id = envelope.id.clone();
        tracing::debug!(msg_id = %msg_id, msg_type = %envelope.message_type, "frame received");

        match self.context.session.handle_inbound(envelope) {
            Ok(Inbound::Verified(_)) => {}
            Ok(Inbound::Command(command)) => self.dispatch_command(command),
            Ok(Inbound::Ignored {
                message_type,
                phase,
            }) => {
                self.stats.ignored_messages += 1;
                tracing::warn!(
                    msg_id = %msg_id,
                    msg_type = %message_type,
                    phase = %phase,
                    "message not accepted in this phase"
                );
            }
            Ok(Inbound::Unknown(tag)) => {
                self.stats.unknown_messages += 1;
                tracing::info!(msg_id = %msg_id, msg_type = %tag, "unknown message type discarded");
            }
            Err(err) => {
                self.stats.protocol_errors += 1;
                tracing::warn!(msg_id = %msg_id, error = %err, "protocol error");
            }
        }
    }

    fn dispatch_command(&mut self, envelope: Envelope) {
        if !envelope.id.is_empty() && !self.recent_commands.accept(&envelope.id) {
            self.stats.commands_duplicate += 1;
            tracing::warn!(msg_id = %envelope.id, "duplicate command dropped");
            return;
        }

        match self.context.dispatcher.dispatch(&envelope.payload) {
            Ok(command) => {
                self.stats.commands_dispatched += 1;
                tracing::info!(msg_id = %envelope.id, command = %command, "command dispatched");
            }
            Err(err) => {
                self.stats.commands_rejected += 1;
                tracing::warn!(
                    msg_id = %envelope.id,
                    kind = err.kind(),
                    error = %err,
                    "command rejected"
                );
            }
        }
    }

    fn run_due_tasks(&mut self, now: MonotonicTime) {
        for index in 0..self.context.tasks.len() {
            let task = &mut self.context.tasks[index];
            if !task.is_due(now) {
                continue;
            }
            let action = task.action;
            task.mark_run(now);
            self.stats.tasks_fired += 1;
            tracing::trace!(task = %task.name, runs = task.runs, "task fired");

            self.run_action(action, now);
        }
    }

    fn run_action(&mut self, action: TaskAction, now: MonotonicTime) {
        match action {
            TaskAction::Ingest(source) => {
                let consumed = self.context.sensors.ingest(source);
                if consumed > 0 {
                    tracing::trace!(source = source.name(), consumed, "ingested");
                }
            }
            TaskAction::Sample(source) => {
                if let Some(sample) = self.context.sensors.sample_if_updated(source, now) {
                    tracing::debug!(source = source.name(), "sample stored");
                    self.context.samples.store(sample);
                }
            }
            TaskAction::Transmit => self.transmit(),
        }
    }

    fn transmit(&mut self) {
        if !self.context.session.is_verified() {
            self.stats.telemetry_skipped += 1;
            tracing::trace!(phase = %self.phase(), "telemetry skipped");
            return;
        }

        let payload = telemetry_payload(&self.context.samples);
        let timestamp = self.context.samples.latest_utc().unwrap_or_default().to_string();
        let envelope = self.context.session.telemetry_envelope(payload, &timestamp);

        match self.context.session.send(&envelope, &mut self.transport) {
            Ok(()) => {
                self.stats.frames_out += 1;
                self.stats.telemetry_sent += 1;
            }
            Err(err) => self.record_send_error(&envelope, err),
        }
    }

    fn send_verification(&mut self, request: Envelope) {
        match self.context.session.send(&request, &mut self.transport) {
            Ok(()) => {
                self.stats.frames_out += 1;
                self.stats.verifications_sent += 1;
                tracing::info!(msg_id = %request.id, "verification sent");
            }
            Err(err) => self.record_send_error(&request, err),
        }
    }

    fn record_send_error(&mut self, envelope: &Envelope, err: NodeError) {
        if matches!(err, NodeError::Transport(_)) {
            self.stats.transport_errors += 1;
        }
        tracing::warn!(
            msg_id = %envelope.id,
            msg_type = %envelope.message_type,
            kind = err.kind(),
            error = %err,
            "send failed"
        );
    }

    fn record_decode_error(&mut self, err: DecodeError) {
        self.stats.decode_errors += 1;
        tracing::warn!(error = %err, "inbound frame discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use fieldnode_core::{MessageType, NodeResult, Payload};
    use fieldnode_sensors::{QueuedDriver, Reading, ReadingSender, SourceTag, LATITUDE};
    use fieldnode_time::SimulatedClock;
    use fieldnode_wire::encode;

    #[derive(Default)]
    struct Loopback {
        inbound: VecDeque<TransportEvent>,
        sent: Vec<Envelope>,
        fail_sends: bool,
    }

    impl Transport for Loopback {
        fn poll_event(&mut self) -> Option<TransportEvent> {
            self.inbound.pop_front()
        }

        fn send_frame(&mut self, frame: &[u8]) -> NodeResult<()> {
            if self.fail_sends {
                return Err(NodeError::Transport("link down".into()));
            }
            self.sent.push(decode(frame)?);
            Ok(())
        }
    }

    fn message(envelope: &Envelope) -> TransportEvent {
        TransportEvent::Message(encode(envelope))
    }

    fn assignment(id: &str) -> Envelope {
        Envelope::new("a-1", MessageType::AssignedId, "server-main", "")
            .with_payload(Payload::new().with("assignedID", id))
    }

    fn scheduler(config: NodeConfig) -> (Scheduler<Loopback, SimulatedClock>, ReadingSender, SimulatedClock) {
        let (driver, tx) = QueuedDriver::new(SourceTag::Position);
        let mut sensors = SensorAggregator::new();
        sensors.register(Box::new(driver));

        let clock = SimulatedClock::new();
        let context = NodeContext::new(
            &config,
            sensors,
            CommandDispatcher::new(),
            MessageIdGenerator::with_seed(3),
            clock.now(),
        );
        let sched = Scheduler::new(&config, context, Loopback::default(), clock.clone());
        (sched, tx, clock)
    }

    #[test]
    fn test_inbound_before_transmit_in_same_tick() {
        let (mut sched, _tx, clock) = scheduler(NodeConfig::default());
        sched.transport_mut().inbound.push_back(TransportEvent::Connected);
        sched.tick();
        assert_eq!(sched.phase(), Phase::Verifying);

        // Assignment arrives in the tick where transmit is due
        clock.advance(Duration::from_millis(500));
        sched.transport_mut().inbound.push_back(message(&assignment("node-7")));
        sched.tick();

        let sent = &sched.transport().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].message_type, MessageType::Verification);
        assert_eq!(sent[1].message_type, MessageType::Telemetry);
        assert_eq!(sent[1].source, "node-7");
    }

    #[test]
    fn test_transmit_skipped_until_verified() {
        let (mut sched, _tx, clock) = scheduler(NodeConfig::default());
        for _ in 0..20 {
            clock.advance(Duration::from_millis(50));
            sched.tick();
        }
        assert!(sched.transport().sent.is_empty());
        assert_eq!(sched.stats().telemetry_skipped, 2);
    }

    #[test]
    fn test_assignment_behind_many_chunks_applies_this_tick() {
        let (mut sched, _tx, clock) = scheduler(NodeConfig::default());
        sched.transport_mut().inbound.push_back(TransportEvent::Connected);
        sched.tick();

        clock.advance(Duration::from_millis(500));
        for _ in 0..200 {
            sched.transport_mut().inbound.push_back(TransportEvent::Data(b" ".to_vec()));
        }
        sched.transport_mut().inbound.push_back(message(&assignment("node-7")));
        sched.tick();

        assert!(sched.transport().inbound.is_empty());
        assert_eq!(sched.phase(), Phase::Verified);
        assert_eq!(sched.stats().telemetry_sent, 1);
        assert_eq!(sched.transport().sent.last().unwrap().message_type, MessageType::Telemetry);
    }

    #[test]
    fn test_sample_stored_from_ingested_reading() {
        let (mut sched, tx, clock) = scheduler(NodeConfig::default());
        tx.report(Reading::new().with(LATITUDE, 12.5));

        clock.advance(Duration::from_millis(250));
        sched.tick();

        let sample = sched.samples().get(SourceTag::Position).unwrap();
        assert!(sample.valid);
        assert_eq!(sample.field(LATITUDE), Some(12.5));
        assert_eq!(sample.updated_at, Some(MonotonicTime::from_millis(250)));
    }

    #[test]
    fn test_duplicate_commands_dropped_with_window() {
        let config = NodeConfig {
            command_dedup_window: 8,
            ..NodeConfig::default()
        };
        let (mut sched, _tx, _clock) = scheduler(config);
        sched.context_mut().dispatcher.register("stop", |_: &Payload| Ok(()));

        let command = Envelope::new("c-9", MessageType::Command, "server-main", "node-7")
            .with_payload(Payload::new().with("command", "stop"));
        let inbound = &mut sched.transport_mut().inbound;
        inbound.push_back(TransportEvent::Connected);
        inbound.push_back(message(&assignment("node-7")));
        inbound.push_back(message(&command));
        inbound.push_back(message(&command));
        sched.tick();

        assert_eq!(sched.stats().commands_dispatched, 1);
        assert_eq!(sched.stats().commands_duplicate, 1);
    }

    #[test]
    fn test_send_failure_is_counted_not_fatal() {
        let (mut sched, _tx, _clock) = scheduler(NodeConfig::default());
        sched.transport_mut().fail_sends = true;
        sched.transport_mut().inbound.push_back(TransportEvent::Connected);
        sched.tick();

        assert_eq!(sched.phase(), Phase::Verifying);
        assert_eq!(sched.stats().transport_errors, 1);
        assert_eq!(sched.stats().verifications_sent, 0);
    }

    #[test]
    fn test_truncated_message_discarded() {
        let (mut sched, _tx, _clock) = scheduler(NodeConfig::default());
        sched
            .transport_mut()
            .inbound
            .push_back(TransportEvent::Message(br#"{"msgType":"assi"#.to_vec()));
        sched.tick();

        assert_eq!(sched.stats().decode_errors, 1);
        assert_eq!(sched.phase(), Phase::Disconnected);
    }

    #[tokio::test]
    async fn test_run_until_ticks() {
        let config = NodeConfig::default();
        let context = NodeContext::new(
            &config,
            SensorAggregator::new(),
            CommandDispatcher::new(),
            MessageIdGenerator::with_seed(1),
            MonotonicTime::ZERO,
        );
        let mut sched = Scheduler::new(
            &config,
            context,
            Loopback::default(),
            fieldnode_time::MonotonicClock::new(),
        );

        sched
            .run_until(
                Duration::from_millis(1),
                tokio::time::sleep(Duration::from_millis(20)),
            )
            .await;
        assert!(sched.stats().ticks > 0);
    }
}
