//! Task and expression state machine.
//!
//! Task: `pending | dispatched → completed | error`, both terminal.
//! Expression: `pending → completed | error`, both terminal; `error` is sticky.

use paral_core::{Expression, ExpressionStatus, Task, TaskId, TaskOutcome, TaskStatus};

use crate::dependency::TaskLookup;

/// A status change that the state machine forbids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The task already reached a terminal status
    #[error("task {task} is already {status}")]
    AlreadyTerminal {
        /// Task that was reported
        task: TaskId,
        /// Its terminal status
        status: TaskStatus,
    },
}

/// Record a worker's outcome on `task`.
pub fn apply_outcome(task: &mut Task, outcome: &TaskOutcome) -> Result<(), TransitionError> {
    if task.status.is_terminal() {
        return Err(TransitionError::AlreadyTerminal { task: task.id, status: task.status });
    }

    task.status = outcome.status();
    task.lease_expires_at = None;
    match outcome {
        TaskOutcome::Completed(value) => {
            task.result = Some(*value);
            task.error = None;
        }
        TaskOutcome::Error(reason) => {
            task.result = None;
            task.error = Some(reason.clone());
        }
    }
    Ok(())
}

/// Re-derive `expression`'s status after `updated` (one of its tasks) changed.
///
/// Returns the resulting status.
pub fn reconcile(expression: &mut Expression, updated: &Task, tasks: &impl TaskLookup) -> ExpressionStatus {
    // Terminal expressions never move, in particular error is never overwritten.
    if expression.status.is_terminal() {
        return expression.status;
    }

    let next = if updated.status == TaskStatus::Error {
        ExpressionStatus::Error
    } else if expression
        .tasks
        .iter()
        .all(|id| tasks.task(*id).is_some_and(|t| t.status == TaskStatus::Completed))
    {
        ExpressionStatus::Completed
    } else {
        ExpressionStatus::Pending
    };

    match next {
        ExpressionStatus::Completed => {
            expression.result = expression
                .final_task()
                .and_then(|id| tasks.task(id))
                .and_then(|t| t.result);
        }
        ExpressionStatus::Error => expression.result = None,
        ExpressionStatus::Pending => {}
    }

    if next != expression.status {
        expression.status = next;
        expression.updated_at = chrono::Utc::now();
    }
    next
}
