//! Expression model - a submitted formula and its aggregate state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ExpressionId, TaskId};
use crate::task::Task;
use crate::Time;

/// Aggregate status of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    /// Some tasks have not completed yet
    Pending,
    /// Every task completed; `result` is set
    Completed,
    /// A task failed; sticky
    Error,
}

impl ExpressionStatus {
    /// Whether the status can never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// An arithmetic expression together with its compiled task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Unique identifier
    pub id: ExpressionId,

    /// Source text as submitted
    pub text: String,

    /// Current status
    pub status: ExpressionStatus,

    /// Final value, set once completed
    pub result: Option<f64>,

    /// Tasks in compile (postfix) order. The last one yields the final value.
    pub tasks: Vec<TaskId>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last status change
    pub updated_at: Time,
}

impl Expression {
    /// Create a pending expression over already-compiled tasks.
    pub fn new(id: ExpressionId, text: impl Into<String>, tasks: Vec<TaskId>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            text: text.into(),
            status: ExpressionStatus::Pending,
            result: None,
            tasks,
            created_at: now,
            updated_at: now,
        }
    }

    /// The task whose result is the expression's result.
    pub fn final_task(&self) -> Option<TaskId> {
        self.tasks.last().copied()
    }
}

/// An expression snapshot with its task snapshots inlined, as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionView {
    /// Unique identifier
    pub id: ExpressionId,
    /// Source text as submitted
    pub text: String,
    /// Current status
    pub status: ExpressionStatus,
    /// Final value, set once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    /// Tasks in compile order
    pub tasks: Vec<Task>,
    /// Creation timestamp
    pub created_at: Time,
    /// Last status change
    pub updated_at: Time,
}

impl ExpressionView {
    /// Combine an expression with its tasks (in compile order).
    pub fn new(expression: Expression, tasks: Vec<Task>) -> Self {
        Self {
            id: expression.id,
            text: expression.text,
            status: expression.status,
            result: expression.result,
            tasks,
            created_at: expression.created_at,
            updated_at: expression.updated_at,
        }
    }
}
