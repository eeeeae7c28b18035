//! Request and response bodies of the orchestrator's HTTP API.

use serde::{Deserialize, Serialize};

use crate::expression::{Expression, ExpressionStatus, ExpressionView};
use crate::id::ExpressionId;
use crate::task::TaskAssignment;

/// `POST /api/v1/calculate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Infix expression text
    pub expression: String,
}

/// Response to a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateResponse {
    /// Identifier to poll
    pub id: ExpressionId,
}

/// `GET /api/v1/expressions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionsResponse {
    /// All expressions in submission order
    pub expressions: Vec<Expression>,
}

/// `GET /api/v1/expressions/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionResponse {
    /// The expression with its tasks
    pub expression: ExpressionView,
}

/// `GET /internal/task`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task leased to the caller
    pub task: TaskAssignment,
}

/// Response to `POST /internal/task/result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultResponse {
    /// Owning expression's status after the report
    pub expression_status: ExpressionStatus,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
}
