//! Errors raised while evaluating or reporting a single task.

use crate::id::TaskId;

/// Failure computing one binary operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Right-hand operand of a division was zero
    #[error("division by zero")]
    DivisionByZero,

    /// The operation overflowed or produced NaN
    #[error("result of {lhs} {op} {rhs} is not a finite number")]
    NonFinite {
        /// Left operand
        lhs: f64,
        /// Operator symbol
        op: char,
        /// Right operand
        rhs: f64,
    },
}

/// A worker report that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Status `completed` without a `result` value
    #[error("report for task {task} is completed but carries no result")]
    MissingResult {
        /// Reported task
        task: TaskId,
    },
}
