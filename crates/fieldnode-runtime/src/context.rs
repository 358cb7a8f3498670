//! Node context - the explicitly owned runtime state

use fieldnode_core::{MessageIdGenerator, MonotonicTime};
use fieldnode_sensors::{SensorAggregator, SensorSet, SourceTag};

use crate::{
    standard_tasks, CommandDispatcher, ConnectionStateMachine, NodeConfig, NodeIdentity,
    ScheduledTask,
};

/// Everything a scheduler tick reads or mutates
///
/// One instance per node, handed to the scheduler at construction.
#[derive(Debug)]
pub struct NodeContext {
    /// Sole owner of the connection state
    pub session: ConnectionStateMachine,
    /// Registered sensor drivers
    pub sensors: SensorAggregator,
    /// Latest sample per registered source
    pub samples: SensorSet,
    /// Periodic tasks, in run order
    pub tasks: Vec<ScheduledTask>,
    pub dispatcher: CommandDispatcher,
}

impl NodeContext {
    /// Build a context with the standard task list, starting at `now`
    pub fn new(
        config: &NodeConfig,
        sensors: SensorAggregator,
        dispatcher: CommandDispatcher,
        ids: MessageIdGenerator,
        now: MonotonicTime,
    ) -> Self {
        let identity = NodeIdentity {
            node_class: config.node_class.clone(),
            unverified_source: config.unverified_source.clone(),
            coordinator_id: config.coordinator_id.clone(),
        };
        let session = ConnectionStateMachine::new(identity, ids)
            .with_verification_resend(config.verification_resend);
        let sources: Vec<SourceTag> = sensors.sources().collect();
        let samples = SensorSet::with_sources(sources.iter().copied());
        let tasks = standard_tasks(&sources, config, now);

        NodeContext {
            session,
            sensors,
            samples,
            tasks,
            dispatcher,
        }
    }

    /// Find a task by name
    pub fn task(&self, name: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Phase, TaskAction};
    use fieldnode_sensors::QueuedDriver;

    #[test]
    fn test_context_from_config() {
        let (driver, _tx) = QueuedDriver::new(SourceTag::Position);
        let mut sensors = SensorAggregator::new();
        sensors.register(Box::new(driver));

        let ctx = NodeContext::new(
            &NodeConfig::default(),
            sensors,
            CommandDispatcher::new(),
            MessageIdGenerator::with_seed(1),
            MonotonicTime::from_millis(5),
        );

        assert_eq!(ctx.session.phase(), Phase::Disconnected);
        assert_eq!(ctx.samples.len(), 1);
        assert!(!ctx.samples.get(SourceTag::Position).unwrap().valid);
        assert_eq!(ctx.tasks.len(), 3);
        let transmit = ctx.task("transmit-telemetry").unwrap();
        assert_eq!(transmit.action, TaskAction::Transmit);
        assert_eq!(transmit.last_run_at, MonotonicTime::from_millis(5));
    }

    #[test]
    fn test_tasks_cover_every_registered_source() {
        let mut sensors = SensorAggregator::new();
        sensors.register(Box::new(QueuedDriver::new(SourceTag::Atmosphere).0));
        sensors.register(Box::new(QueuedDriver::new(SourceTag::Position).0));

        let ctx = NodeContext::new(
            &NodeConfig::default(),
            sensors,
            CommandDispatcher::new(),
            MessageIdGenerator::with_seed(2),
            MonotonicTime::ZERO,
        );

        assert_eq!(ctx.samples.len(), 2);
        let actions: Vec<TaskAction> = ctx.tasks.iter().map(|t| t.action).collect();
        assert_eq!(
            actions,
            vec![
                TaskAction::Ingest(SourceTag::Position),
                TaskAction::Ingest(SourceTag::Atmosphere),
                TaskAction::Sample(SourceTag::Position),
                TaskAction::Sample(SourceTag::Atmosphere),
                TaskAction::Transmit,
            ]
        );
    }
}
