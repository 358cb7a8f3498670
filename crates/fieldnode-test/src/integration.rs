//! End-to-end Integration Test Suite
//!
//! Drives a real scheduler against scripted collaborators on a simulated
//! clock:
//! - Verification handshake and reconnects
//! - Multi-rate scheduling
//! - Telemetry staleness
//! - Malformed input safety
//! - Command dispatch and duplicate delivery

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fieldnode_core::{Envelope, MessageIdGenerator, MessageType, Payload};
use fieldnode_runtime::{
    CommandDispatcher, NodeConfig, NodeContext, Phase, Scheduler, ASSIGNED_ID_FIELD,
};
use fieldnode_sensors::{SensorAggregator, SourceTag};
use fieldnode_time::{Clock, SimulatedClock};

use crate::simulator::{scripted_driver, scripted_link, DriverHandle, LinkHandle, ScriptedTransport};

// ============================================================================
// HARNESS
// ============================================================================

/// A node wired to scripted collaborators
pub struct NodeHarness {
    pub scheduler: Scheduler<ScriptedTransport, SimulatedClock>,
    pub clock: SimulatedClock,
    pub link: LinkHandle,
    pub position: DriverHandle,
    pub atmosphere: DriverHandle,
    commands: Rc<RefCell<Vec<Payload>>>,
}

impl NodeHarness {
    /// Harness with the default configuration
    pub fn new() -> Self {
        Self::with_config(NodeConfig::default())
    }

    /// Harness with both sensor sources registered, clock at t=0
    pub fn with_config(config: NodeConfig) -> Self {
        let (position_driver, position) = scripted_driver(SourceTag::Position);
        let (atmosphere_driver, atmosphere) = scripted_driver(SourceTag::Atmosphere);
        let mut sensors = SensorAggregator::new();
        sensors.register(Box::new(position_driver));
        sensors.register(Box::new(atmosphere_driver));

        let (transport, link) = scripted_link();
        let clock = SimulatedClock::new();
        let context = NodeContext::new(
            &config,
            sensors,
            CommandDispatcher::new(),
            MessageIdGenerator::with_seed(0x5eed),
            clock.now(),
        );
        let scheduler = Scheduler::new(&config, context, transport, clock.clone());

        NodeHarness {
            scheduler,
            clock,
            link,
            position,
            atmosphere,
            commands: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register an effector that records each invocation's payload
    pub fn record_command(&mut self, name: &str) {
        let calls = Rc::clone(&self.commands);
        self.scheduler
            .context_mut()
            .dispatcher
            .register(name, move |args: &Payload| {
                calls.borrow_mut().push(args.clone());
                Ok(())
            });
    }

    /// Payloads received by recording effectors, in order
    pub fn recorded_commands(&self) -> Vec<Payload> {
        self.commands.borrow().clone()
    }

    /// Tick without advancing the clock
    pub fn tick(&mut self) {
        self.scheduler.tick();
    }

    /// Advance the clock by `dt`, then tick
    pub fn step(&mut self, dt: Duration) {
        self.clock.advance(dt);
        self.scheduler.tick();
    }

    /// Step repeatedly until `total` has elapsed
    pub fn run_for(&mut self, total: Duration, step: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            self.step(step);
            elapsed += step;
        }
    }

    /// Connect and complete the handshake with `assigned_id`
    pub fn verify(&mut self, assigned_id: &str) {
        self.link.connect();
        self.tick();
        self.link.deliver(&assignment(assigned_id));
        self.tick();
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn assigned_id(&self) -> String {
        self.scheduler.context().session.assigned_id().to_string()
    }

    pub fn telemetry(&self) -> Vec<Envelope> {
        self.link.sent_of_type(&MessageType::Telemetry)
    }

    pub fn verifications(&self) -> Vec<Envelope> {
        self.link.sent_of_type(&MessageType::Verification)
    }
}

impl Default for NodeHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Coordinator identity assignment
pub fn assignment(assigned_id: &str) -> Envelope {
    Envelope::new(
        format!("assign-{}", assigned_id),
        MessageType::AssignedId,
        "server-main",
        "",
    )
    .with_payload(Payload::new().with(ASSIGNED_ID_FIELD, assigned_id))
}

/// Coordinator command envelope
pub fn command(id: &str, name: &str) -> Envelope {
    Envelope::new(id, MessageType::Command, "server-main", "")
        .with_payload(Payload::new().with("command", name))
}

// ============================================================================
// TESTS
// ============================================================================
