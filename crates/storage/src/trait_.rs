//! Repository trait abstraction.

use async_trait::async_trait;
use paral_core::{
    Expression, ExpressionId, ExpressionStatus, ExpressionView, Task, TaskAssignment, TaskId,
    TaskOutcome, Time,
};
use paral_execution::{DependencyError, LeasePolicy, TransitionError};

/// Error type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Item already stored
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Task batch is not a valid DAG
    #[error("Invalid task graph: {0}")]
    InvalidGraph(#[from] DependencyError),

    /// Status change rejected by the state machine
    #[error("Conflict: {0}")]
    Conflict(#[from] TransitionError),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Store of expressions and their tasks.
///
/// Implementations must make every method atomic with respect to the others:
/// a reader never sees an expression without its tasks, and a task update is
/// applied together with its expression's status change.
#[async_trait]
pub trait Repository: Send + Sync {
    // === Expression operations ===

    /// Insert an expression with its compiled tasks (in compile order).
    async fn put(&self, expression: Expression, tasks: Vec<Task>) -> Result<()>;

    /// Load an expression by ID.
    async fn get(&self, id: ExpressionId) -> Result<Option<Expression>>;

    /// List all expressions in submission order.
    async fn list(&self) -> Result<Vec<Expression>>;

    /// Tasks of an expression in compile order, or None if the expression is unknown.
    async fn tasks_of(&self, id: ExpressionId) -> Result<Option<Vec<Task>>>;

    /// An expression together with its tasks, read as one consistent snapshot.
    async fn view(&self, id: ExpressionId) -> Result<Option<ExpressionView>>;

    // === Task operations ===

    /// Load a task by ID.
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// Peek at the task that would be dispatched next, without claiming it.
    async fn next_runnable(&self) -> Result<Option<Task>>;

    /// Claim the next runnable task: mark it dispatched under a lease and
    /// return it with resolved operands.
    async fn claim_next(&self, lease: &LeasePolicy, now: Time) -> Result<Option<TaskAssignment>>;

    /// Record a task outcome and propagate it to the owning expression.
    /// Returns the expression's resulting status.
    async fn update_task_status(&self, id: TaskId, outcome: TaskOutcome) -> Result<ExpressionStatus>;

    /// Return dispatched tasks whose lease ran out at `now` to pending.
    async fn reap_expired_leases(&self, now: Time) -> Result<Vec<TaskId>>;
}
