//! In-memory repository.
//!
//! All state sits behind one `RwLock`: reads take the shared lock, every
//! mutation (including status propagation) takes the exclusive lock.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use paral_core::{
    Argument, Expression, ExpressionId, ExpressionStatus, ExpressionView, Task, TaskAssignment,
    TaskId, TaskOutcome, TaskStatus, Time,
};
use paral_execution::{
    apply_outcome, reconcile, DependencyResolver, FifoSelector, LeasePolicy, Resolution,
    TaskSelector,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{Repository, Result, StorageError};

#[derive(Default)]
struct Inner {
    expressions: HashMap<ExpressionId, Expression>,
    expression_order: Vec<ExpressionId>,
    tasks: HashMap<TaskId, Task>,
    /// Non-terminal tasks of non-failed expressions, keyed by creation sequence.
    open: BTreeMap<u64, TaskId>,
    seq: HashMap<TaskId, u64>,
    next_seq: u64,
}

impl Inner {
    /// Open tasks that are pending with every dependency completed, in creation order.
    fn eligible(&self, resolver: &DependencyResolver) -> Vec<&Task> {
        self.open
            .values()
            .filter_map(|id| self.tasks.get(id))
            .filter(|task| task.status == TaskStatus::Pending)
            .filter(|task| resolver.check(&self.tasks, task) == Resolution::Ready)
            .collect()
    }

    fn tasks_in_order(&self, expression: &Expression) -> Vec<Task> {
        expression
            .tasks
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .cloned()
            .collect()
    }

    fn close(&mut self, id: TaskId) {
        if let Some(seq) = self.seq.get(&id) {
            self.open.remove(seq);
        }
    }

    fn operand(&self, arg: &Argument) -> Result<f64> {
        match arg {
            Argument::Literal(value) => Ok(*value),
            Argument::TaskOutput(id) => self
                .tasks
                .get(id)
                .and_then(|t| t.result)
                .ok_or_else(|| StorageError::Other(format!("result of task {} is not available", id))),
        }
    }
}

/// Repository keeping every expression and task in process memory.
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
    resolver: DependencyResolver,
    selector: Box<dyn TaskSelector>,
}

impl InMemoryRepository {
    /// Create an empty repository with FIFO selection.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            resolver: DependencyResolver::new(),
            selector: Box::new(FifoSelector::new()),
        }
    }

    /// Set the task selector strategy.
    pub fn with_selector(mut self, selector: Box<dyn TaskSelector>) -> Self {
        self.selector = selector;
        self
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn put(&self, expression: Expression, tasks: Vec<Task>) -> Result<()> {
        if tasks.is_empty() {
            return Err(StorageError::Other(format!("expression {} has no tasks", expression.id)));
        }
        if !tasks.iter().map(|t| t.id).eq(expression.tasks.iter().copied()) {
            return Err(StorageError::Other(format!(
                "task list of expression {} does not match its tasks",
                expression.id
            )));
        }
        if tasks.iter().any(|t| t.expression_id != expression.id) {
            return Err(StorageError::Other(format!(
                "tasks do not belong to expression {}",
                expression.id
            )));
        }
        self.resolver.validate_batch(&tasks)?;

        let mut inner = self.inner.write().await;
        if inner.expressions.contains_key(&expression.id) {
            return Err(StorageError::Duplicate(format!("expression {}", expression.id)));
        }
        if let Some(task) = tasks.iter().find(|t| inner.tasks.contains_key(&t.id)) {
            return Err(StorageError::Duplicate(format!("task {}", task.id)));
        }

        info!(expression_id = %expression.id, tasks = tasks.len(), "adding expression: {}", expression.text);
        for task in tasks {
            debug!(task_id = %task.id, "adding task: {} {} {}", task.arg1, task.operation, task.arg2);
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.seq.insert(task.id, seq);
            inner.open.insert(seq, task.id);
            inner.tasks.insert(task.id, task);
        }
        inner.expression_order.push(expression.id);
        inner.expressions.insert(expression.id, expression);
        Ok(())
    }

    async fn get(&self, id: ExpressionId) -> Result<Option<Expression>> {
        Ok(self.inner.read().await.expressions.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Expression>> {
        let inner = self.inner.read().await;
        Ok(inner
            .expression_order
            .iter()
            .filter_map(|id| inner.expressions.get(id))
            .cloned()
            .collect())
    }

    async fn tasks_of(&self, id: ExpressionId) -> Result<Option<Vec<Task>>> {
        let inner = self.inner.read().await;
        Ok(inner.expressions.get(&id).map(|expression| inner.tasks_in_order(expression)))
    }

    async fn view(&self, id: ExpressionId) -> Result<Option<ExpressionView>> {
        let inner = self.inner.read().await;
        Ok(inner.expressions.get(&id).map(|expression| {
            ExpressionView::new(expression.clone(), inner.tasks_in_order(expression))
        }))
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn next_runnable(&self) -> Result<Option<Task>> {
        let inner = self.inner.read().await;
        let candidates = inner.eligible(&self.resolver);
        Ok(self.selector.select(&candidates).cloned())
    }

    async fn claim_next(&self, lease: &LeasePolicy, now: Time) -> Result<Option<TaskAssignment>> {
        let mut inner = self.inner.write().await;

        let assignment = {
            let candidates = inner.eligible(&self.resolver);
            let Some(task) = self.selector.select(&candidates) else {
                return Ok(None);
            };
            TaskAssignment {
                id: task.id,
                expression_id: task.expression_id,
                operation: task.operation,
                arg1: inner.operand(&task.arg1)?,
                arg2: inner.operand(&task.arg2)?,
                operation_time: task.operation_time,
            }
        };

        let expires_at = lease.expires_at(now, assignment.operation_time);
        if let Some(task) = inner.tasks.get_mut(&assignment.id) {
            task.status = TaskStatus::Dispatched;
            task.lease_expires_at = Some(expires_at);
        }
        debug!(task_id = %assignment.id, %expires_at, "task dispatched");

        Ok(Some(assignment))
    }

    async fn update_task_status(&self, id: TaskId, outcome: TaskOutcome) -> Result<ExpressionStatus> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let task = inner
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("task {}", id)))?;
        apply_outcome(task, &outcome)?;
        let updated = task.clone();
        inner.close(id);

        let expression = inner
            .expressions
            .get_mut(&updated.expression_id)
            .ok_or_else(|| StorageError::NotFound(format!("expression {}", updated.expression_id)))?;
        let before = expression.status;
        let status = reconcile(expression, &updated, &inner.tasks);

        match status {
            ExpressionStatus::Completed if before != status => {
                info!(
                    expression_id = %expression.id,
                    "expression completed with result: {:?}",
                    expression.result
                );
            }
            ExpressionStatus::Error if before != status => {
                warn!(expression_id = %expression.id, task_id = %id, "expression failed: {:?}", updated.error);
                // Halt: nothing else of a failed expression is dispatched.
                let remaining = expression.tasks.clone();
                for task_id in remaining {
                    inner.close(task_id);
                }
            }
            _ => debug!(expression_id = %updated.expression_id, %status, "expression status"),
        }

        Ok(status)
    }

    async fn reap_expired_leases(&self, now: Time) -> Result<Vec<TaskId>> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let mut reclaimed = Vec::new();
        for id in inner.open.values() {
            if let Some(task) = inner.tasks.get_mut(id) {
                if LeasePolicy::is_expired(task, now) {
                    warn!(task_id = %id, "lease expired, returning task to pending");
                    task.status = TaskStatus::Pending;
                    task.lease_expires_at = None;
                    reclaimed.push(*id);
                }
            }
        }
        Ok(reclaimed)
    }
}
