//! The orchestrator service: accepts expressions, leases tasks, folds in results.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use paral_compiler::Compiler;
use paral_core::{
    Config, Expression, ExpressionId, ExpressionStatus, ExpressionView, TaskAssignment, TaskReport,
};
use paral_execution::{LeasePolicy, TaskSource};
use paral_storage::{InMemoryRepository, Repository};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{OrchestratorError, Result};

/// Coordinates the compiler, the store, and the dispatch lease policy.
pub struct Orchestrator {
    repository: Arc<dyn Repository>,
    compiler: Compiler,
    lease: LeasePolicy,
}

impl Orchestrator {
    /// Create an orchestrator over an existing repository.
    pub fn new(repository: Arc<dyn Repository>, compiler: Compiler, lease: LeasePolicy) -> Self {
        Self { repository, compiler, lease }
    }

    /// Create an orchestrator backed by an in-memory store.
    pub fn in_memory(compiler: Compiler, lease: LeasePolicy) -> Self {
        Self::new(Arc::new(InMemoryRepository::new()), compiler, lease)
    }

    /// Build from process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::in_memory(
            Compiler::new(config.operation_times),
            LeasePolicy::from(config.lease),
        )
    }

    /// Lease policy applied to dispatched tasks.
    pub fn lease(&self) -> &LeasePolicy {
        &self.lease
    }

    /// Compile and store a new expression.
    ///
    /// Nothing is stored when compilation fails.
    pub async fn add_expression(&self, text: &str) -> Result<ExpressionId> {
        let id = ExpressionId::new();
        let tasks = self.compiler.compile(text, id)?;
        let expression = Expression::new(id, text, tasks.iter().map(|t| t.id).collect());

        self.repository.put(expression, tasks).await?;
        info!(expression_id = %id, "accepted expression {:?}", text);
        Ok(id)
    }

    /// Snapshot of one expression with its tasks.
    pub async fn get_expression(&self, id: ExpressionId) -> Result<ExpressionView> {
        self.repository
            .view(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("expression {}", id)))
    }

    /// All expressions in submission order.
    pub async fn list_expressions(&self) -> Result<Vec<Expression>> {
        Ok(self.repository.list().await?)
    }

    /// Lease the next runnable task, if any.
    pub async fn get_pending_task(&self) -> Result<Option<TaskAssignment>> {
        Ok(self.repository.claim_next(&self.lease, Utc::now()).await?)
    }

    /// Apply a worker's report and return the owning expression's status.
    pub async fn submit_task_result(&self, report: TaskReport) -> Result<ExpressionStatus> {
        let outcome = report.outcome()?;
        Ok(self.repository.update_task_status(report.id, outcome).await?)
    }

    /// Return tasks whose lease has lapsed to the runnable pool.
    pub async fn reap_expired_leases(&self) -> Result<usize> {
        let reclaimed = self.repository.reap_expired_leases(Utc::now()).await?;
        Ok(reclaimed.len())
    }

    /// Run the lease reaper every `reap_interval` until `shutdown` flips.
    pub fn spawn_reaper(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        let period = self.lease.reap_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            debug!("lease reaper running every {:?}", period);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = orchestrator.reap_expired_leases().await {
                            error!("lease reaper failed: {}", e);
                        }
                    }
                }
            }
            debug!("lease reaper stopped");
        })
    }
}

/// In-process workers pull straight from the orchestrator.
#[async_trait]
impl TaskSource for Orchestrator {
    async fn fetch_task(&self) -> anyhow::Result<Option<TaskAssignment>> {
        Ok(self.get_pending_task().await?)
    }

    async fn report(&self, report: TaskReport) -> anyhow::Result<()> {
        self.submit_task_result(report).await?;
        Ok(())
    }
}
