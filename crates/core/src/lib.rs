//! Paral core data models.
//!
//! Expressions, the tasks they compile into, the snapshots exchanged with
//! workers, and process configuration.

#![warn(missing_docs)]

mod id;
mod expression;
mod task;
mod error;

/// HTTP request and response bodies.
pub mod wire;

/// Environment-driven configuration.
pub mod config;

pub use id::{ExpressionId, TaskId};
pub use expression::{Expression, ExpressionStatus, ExpressionView};
pub use task::{
    Argument, ArgumentParseError, Operation, ReportStatus, Task, TaskAssignment, TaskOutcome,
    TaskReport, TaskStatus,
};
pub use error::{EvalError, ReportError};
pub use config::{load_dotenv, AgentConfig, Config, LeaseConfig, OperationTimes, ServerConfig};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
