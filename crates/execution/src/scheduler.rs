//! Dispatch lease policy.

use std::time::Duration;

use paral_core::{LeaseConfig, Task, TaskStatus, Time};

/// How long a dispatched task stays leased to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeasePolicy {
    /// Grace period on top of the task's own operation time
    pub timeout: Duration,
    /// Interval between reaper passes
    pub reap_interval: Duration,
}

impl Default for LeasePolicy {
    fn default() -> Self {
        LeaseConfig::default().into()
    }
}

impl From<LeaseConfig> for LeasePolicy {
    fn from(config: LeaseConfig) -> Self {
        Self {
            timeout: config.timeout,
            reap_interval: config.reap_interval,
        }
    }
}

impl LeasePolicy {
    /// Create a new policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lease length.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the reaper interval.
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// When a lease granted at `now` for a task held `operation_time` runs out.
    pub fn expires_at(&self, now: Time, operation_time: Duration) -> Time {
        let held = operation_time.saturating_add(self.timeout);
        let held = chrono::Duration::from_std(held).unwrap_or_else(|_| chrono::Duration::days(365));
        now + held
    }

    /// Whether `task` holds a lease that ran out at or before `now`.
    pub fn is_expired(task: &Task, now: Time) -> bool {
        task.status == TaskStatus::Dispatched
            && task.lease_expires_at.is_some_and(|deadline| deadline <= now)
    }
}
