// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::engine::OrchestratorOptions;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [orchestrator]
/// worker_count = 4
/// operation_duration = "1s"
/// poll_interval = "5s"
/// queue_capacity = 64
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
}

/// `[orchestrator]` section, durations still unparsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorSection {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Simulated time each calculation takes, e.g. `"1s"` or `"0ms"`.
    #[serde(default = "default_operation_duration")]
    pub operation_duration: String,

    /// How often the discovery poller sweeps the store.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Capacity of the resolver and worker channels.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_worker_count() -> usize {
    4
}

fn default_operation_duration() -> String {
    "1s".to_string()
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            operation_duration: default_operation_duration(),
            poll_interval: default_poll_interval(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    worker_count: usize,
    operation_duration: Duration,
    poll_interval: Duration,
    queue_capacity: usize,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        worker_count: usize,
        operation_duration: Duration,
        poll_interval: Duration,
        queue_capacity: usize,
    ) -> Self {
        Self {
            worker_count,
            operation_duration,
            poll_interval,
            queue_capacity,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn operation_duration(&self) -> Duration {
        self.operation_duration
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Plain values handed to [`Orchestrator::start`](crate::engine::Orchestrator::start).
    pub fn options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            worker_count: self.worker_count,
            operation_duration: self.operation_duration,
            poll_interval: self.poll_interval,
            queue_capacity: self.queue_capacity,
        }
    }
}
