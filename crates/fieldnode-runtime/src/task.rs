//! Periodic tasks

use std::time::Duration;

use fieldnode_core::MonotonicTime;
use fieldnode_sensors::SourceTag;
use fieldnode_time::is_due;

use crate::NodeConfig;

/// What a task does when it fires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskAction {
    /// Let the source's driver pull pending raw input
    Ingest(SourceTag),
    /// Store the source's reading if valid and updated
    Sample(SourceTag),
    /// Send one telemetry envelope (verified sessions only)
    Transmit,
}

/// One periodic unit of work
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask {
    pub name: String,
    pub interval: Duration,
    pub last_run_at: MonotonicTime,
    pub action: TaskAction,
    /// Times fired
    pub runs: u64,
}

impl ScheduledTask {
    /// Create a task whose first run is one interval after `now`
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        action: TaskAction,
        now: MonotonicTime,
    ) -> Self {
        ScheduledTask {
            name: name.into(),
            interval,
            last_run_at: now,
            action,
            runs: 0,
        }
    }

    #[inline]
    pub fn is_due(&self, now: MonotonicTime) -> bool {
        is_due(now, self.last_run_at, self.interval)
    }

    pub fn mark_run(&mut self, now: MonotonicTime) {
        self.last_run_at = now;
        self.runs += 1;
    }
}

/// Standard task list: ingest per source, sample per source, transmit.
/// List order is run order within a tick.
pub fn standard_tasks(
    sources: &[SourceTag],
    config: &NodeConfig,
    now: MonotonicTime,
) -> Vec<ScheduledTask> {
    let ingest = sources.iter().map(|&source| {
        ScheduledTask::new(
            format!("ingest-{}", source.name()),
            config.ingest_interval,
            TaskAction::Ingest(source),
            now,
        )
    });
    let sample = sources.iter().map(|&source| {
        ScheduledTask::new(
            format!("sample-{}", source.name()),
            config.sample_interval,
            TaskAction::Sample(source),
            now,
        )
    });
    let transmit = ScheduledTask::new(
        "transmit-telemetry",
        config.transmit_interval,
        TaskAction::Transmit,
        now,
    );

    ingest.chain(sample).chain(std::iter::once(transmit)).collect()
}
