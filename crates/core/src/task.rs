//! Task model - one binary arithmetic operation in an expression's DAG.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, ReportError};
use crate::id::{ExpressionId, TaskId};
use crate::Time;

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// `+`
    #[serde(rename = "+")]
    Add,
    /// `-`
    #[serde(rename = "-")]
    Subtract,
    /// `*`
    #[serde(rename = "*")]
    Multiply,
    /// `/`
    #[serde(rename = "/")]
    Divide,
}

impl Operation {
    /// Map an operator character to its operation.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    /// The operator character.
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    /// Binding strength: `+ -` bind at 1, `* /` at 2.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
        }
    }

    /// Compute `lhs <op> rhs`.
    pub fn apply(self, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
        let value = match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                lhs / rhs
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite { lhs, op: self.symbol(), rhs })
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An operand: either a number or the output of another task.
///
/// On the wire a task output is written as `task_<id>_result`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Argument {
    /// A literal number from the source text
    Literal(f64),
    /// The result of the referenced task
    TaskOutput(TaskId),
}

const PLACEHOLDER_PREFIX: &str = "task_";
const PLACEHOLDER_SUFFIX: &str = "_result";

impl Argument {
    /// The task this argument depends on, if any.
    pub fn dependency(&self) -> Option<TaskId> {
        match self {
            Self::Literal(_) => None,
            Self::TaskOutput(id) => Some(*id),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{}", value),
            Self::TaskOutput(id) => write!(f, "{PLACEHOLDER_PREFIX}{id}{PLACEHOLDER_SUFFIX}"),
        }
    }
}

/// Error parsing an [`Argument`] from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task argument: {0:?}")]
pub struct ArgumentParseError(pub String);

impl FromStr for Argument {
    type Err = ArgumentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = s
            .strip_prefix(PLACEHOLDER_PREFIX)
            .and_then(|rest| rest.strip_suffix(PLACEHOLDER_SUFFIX))
        {
            return inner
                .parse()
                .map(Self::TaskOutput)
                .map_err(|_| ArgumentParseError(s.to_string()));
        }

        match s.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self::Literal(value)),
            _ => Err(ArgumentParseError(s.to_string())),
        }
    }
}

impl From<Argument> for String {
    fn from(arg: Argument) -> Self {
        arg.to_string()
    }
}

impl TryFrom<String> for Argument {
    type Error = ArgumentParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Lifecycle of a task.
///
/// ```text
/// pending ──claim──▶ dispatched ──report──▶ completed | error
///    ▲                    │
///    └──lease expired─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be handed to a worker
    Pending,
    /// Leased to a worker
    Dispatched,
    /// Finished with a result
    Completed,
    /// Failed; the owning expression is failed too
    Error,
}

impl TaskStatus {
    /// Whether the status can never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Dispatched => write!(f, "dispatched"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single atomic operation of a compiled expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Owning expression
    pub expression_id: ExpressionId,

    /// Operator to apply
    pub operation: Operation,

    /// Left operand
    pub arg1: Argument,

    /// Right operand
    pub arg2: Argument,

    /// Simulated duration a worker holds the task before reporting
    #[serde(rename = "operation_time_ms", with = "millis")]
    pub operation_time: Duration,

    /// Current status
    pub status: TaskStatus,

    /// Result, set once completed
    pub result: Option<f64>,

    /// Failure reason, set once failed
    pub error: Option<String>,

    /// Tasks that must complete before this one can run
    pub dependencies: Vec<TaskId>,

    /// When the current dispatch lease runs out
    pub lease_expires_at: Option<Time>,

    /// Creation timestamp
    pub created_at: Time,
}

impl Task {
    /// Create a pending task. Dependencies are derived from the arguments.
    pub fn new(
        expression_id: ExpressionId,
        operation: Operation,
        arg1: Argument,
        arg2: Argument,
        operation_time: Duration,
    ) -> Self {
        let mut dependencies: Vec<TaskId> =
            [arg1, arg2].iter().filter_map(Argument::dependency).collect();
        dependencies.dedup();

        Self {
            id: TaskId::new(),
            expression_id,
            operation,
            arg1,
            arg2,
            operation_time,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            dependencies,
            lease_expires_at: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Terminal outcome of a task as reported by a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The operation produced a value
    Completed(f64),
    /// The operation failed
    Error(String),
}

impl TaskOutcome {
    /// Status a task takes on after this outcome.
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Completed(_) => TaskStatus::Completed,
            Self::Error(_) => TaskStatus::Error,
        }
    }
}

/// Snapshot of a task handed to a worker, with operands already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    /// Task being executed
    pub id: TaskId,
    /// Owning expression
    pub expression_id: ExpressionId,
    /// Operator to apply
    pub operation: Operation,
    /// Left operand value
    pub arg1: f64,
    /// Right operand value
    pub arg2: f64,
    /// How long to hold the task before reporting
    #[serde(rename = "operation_time_ms", with = "millis")]
    pub operation_time: Duration,
}

/// Status values a worker may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Computed successfully
    Completed,
    /// Computation failed
    Error,
}

/// A worker's report for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Task being reported
    pub id: TaskId,
    /// Reported status
    pub status: ReportStatus,
    /// Computed value, required when completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskReport {
    /// A successful report.
    pub fn completed(id: TaskId, result: f64) -> Self {
        Self { id, status: ReportStatus::Completed, result: Some(result), error: None }
    }

    /// A failure report.
    pub fn failed(id: TaskId, reason: impl Into<String>) -> Self {
        Self { id, status: ReportStatus::Error, result: None, error: Some(reason.into()) }
    }

    /// Convert into the outcome applied to the task.
    pub fn outcome(&self) -> Result<TaskOutcome, ReportError> {
        match self.status {
            ReportStatus::Completed => self
                .result
                .map(TaskOutcome::Completed)
                .ok_or(ReportError::MissingResult { task: self.id }),
            ReportStatus::Error => Ok(TaskOutcome::Error(
                self.error.clone().unwrap_or_else(|| "worker reported an error".to_string()),
            )),
        }
    }
}

/// Serde adapter for durations as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_operations() {
        assert_eq!(Operation::Add.apply(2.0, 3.0), Ok(5.0));
        assert_eq!(Operation::Subtract.apply(2.0, 3.0), Ok(-1.0));
        assert_eq!(Operation::Multiply.apply(2.0, 3.0), Ok(6.0));
        assert_eq!(Operation::Divide.apply(3.0, 2.0), Ok(1.5));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(Operation::Divide.apply(1.0, 0.0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_overflow_is_not_finite() {
        let err = Operation::Multiply.apply(f64::MAX, 2.0).unwrap_err();
        assert!(matches!(err, EvalError::NonFinite { op: '*', .. }));
    }

    #[test]
    fn test_precedence() {
        assert!(Operation::Multiply.precedence() > Operation::Add.precedence());
        assert_eq!(Operation::Add.precedence(), Operation::Subtract.precedence());
        assert_eq!(Operation::Multiply.precedence(), Operation::Divide.precedence());
    }

    #[test]
    fn test_argument_wire_form() {
        let id = TaskId::new();
        let arg = Argument::TaskOutput(id);
        assert_eq!(arg.to_string(), format!("task_{}_result", id));
        assert_eq!(arg.to_string().parse::<Argument>().unwrap(), arg);

        assert_eq!("2.5".parse::<Argument>().unwrap(), Argument::Literal(2.5));
        assert!("task_oops_result".parse::<Argument>().is_err());
        assert!("abc".parse::<Argument>().is_err());
    }

    #[test]
    fn test_new_task_derives_dependencies() {
        let dep = TaskId::new();
        let task = Task::new(
            ExpressionId::new(),
            Operation::Add,
            Argument::Literal(2.0),
            Argument::TaskOutput(dep),
            Duration::from_millis(10),
        );
        assert_eq!(task.dependencies, vec![dep]);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.result.is_none());

        let leaf = Task::new(
            ExpressionId::new(),
            Operation::Add,
            Argument::Literal(1.0),
            Argument::Literal(2.0),
            Duration::ZERO,
        );
        assert!(leaf.dependencies.is_empty());
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task::new(
            ExpressionId::new(),
            Operation::Multiply,
            Argument::Literal(3.0),
            Argument::Literal(4.0),
            Duration::from_millis(250),
        );
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["operation"], "*");
        assert_eq!(json["arg1"], "3");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["operation_time_ms"], 250);

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_report_outcome() {
        let id = TaskId::new();
        assert_eq!(TaskReport::completed(id, 4.0).outcome(), Ok(TaskOutcome::Completed(4.0)));
        assert_eq!(
            TaskReport::failed(id, "division by zero").outcome(),
            Ok(TaskOutcome::Error("division by zero".to_string()))
        );

        let bare: TaskReport =
            serde_json::from_str(&format!(r#"{{"id":"{}","status":"error"}}"#, id)).unwrap();
        assert!(matches!(bare.outcome(), Ok(TaskOutcome::Error(_))));
    }

    #[test]
    fn test_completed_report_requires_result() {
        let id = TaskId::new();
        let missing: TaskReport =
            serde_json::from_str(&format!(r#"{{"id":"{}","status":"completed"}}"#, id)).unwrap();
        assert_eq!(missing.result, None);
        assert_eq!(missing.outcome(), Err(ReportError::MissingResult { task: id }));

        let zero: TaskReport =
            serde_json::from_str(&format!(r#"{{"id":"{}","status":"completed","result":0}}"#, id))
                .unwrap();
        assert_eq!(zero.outcome(), Ok(TaskOutcome::Completed(0.0)));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Dispatched.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
    }
}
