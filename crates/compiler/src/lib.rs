//! Expression compiler.
//!
//! Parses an infix arithmetic expression into postfix form and lowers it
//! into a DAG of binary [`Task`]s with explicit dependencies:
//!
//! ```text
//! "2+3*4" ──to_postfix──▶ 2 3 4 * + ──lower──▶ t1 = 3 * 4
//!                                             t2 = 2 + t1   (depends on t1)
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod postfix;
pub mod lower;

pub use error::{CompileError, Result};
pub use postfix::{to_postfix, Token};
pub use lower::lower;

use paral_core::{ExpressionId, OperationTimes, Task};
use tracing::debug;

/// Compiles expression text into tasks, stamping each with its configured duration.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    times: OperationTimes,
}

impl Compiler {
    /// Create a compiler with resolved operation times.
    pub fn new(times: OperationTimes) -> Self {
        Self { times }
    }

    /// Operation times this compiler stamps onto tasks.
    pub fn operation_times(&self) -> &OperationTimes {
        &self.times
    }

    /// Compile `text` into tasks owned by `expression_id`.
    ///
    /// On error no tasks are returned.
    pub fn compile(&self, text: &str, expression_id: ExpressionId) -> Result<Vec<Task>> {
        let postfix = to_postfix(text)?;
        debug!(expression_id = %expression_id, tokens = postfix.len(), "converted to postfix");

        let tasks = lower(&postfix, expression_id, &self.times)?;
        debug!(expression_id = %expression_id, tasks = tasks.len(), "lowered to tasks");
        Ok(tasks)
    }
}
