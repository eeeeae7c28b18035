//! Paral computing agent.
//!
//! Runs a pool of [`ExecutionEngine`] workers against a remote orchestrator
//! through [`OrchestratorClient`].
//!
//! [`ExecutionEngine`]: paral_execution::ExecutionEngine

pub mod client;

pub use client::{ClientError, OrchestratorClient, Result};

use std::sync::Arc;
use std::time::Duration;

use paral_execution::{EngineConfig, ExecutionEngine, TaskSource};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawn `workers` engines sharing one task source; each stops when `shutdown` flips.
pub fn spawn_workers<S>(
    source: Arc<S>,
    workers: usize,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<anyhow::Result<()>>>
where
    S: TaskSource + 'static,
{
    (0..workers)
        .map(|n| {
            let mut engine = ExecutionEngine::new(Arc::clone(&source))
                .with_config(EngineConfig { poll_interval, max_cycles: None })
                .with_worker_id(n);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { engine.run(shutdown).await })
        })
        .collect()
}
