//! Lowering a postfix sequence into tasks.

use paral_core::{Argument, ExpressionId, OperationTimes, Task};

use crate::error::{CompileError, Result};
use crate::postfix::Token;

/// Turn `postfix` into tasks in evaluation order.
///
/// Each operator consumes the two most recent arguments (the first popped is
/// the right-hand operand) and pushes a reference to its own output. The last
/// task produced yields the expression's value.
pub fn lower(postfix: &[Token], expression_id: ExpressionId, times: &OperationTimes) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut stack: Vec<Argument> = Vec::with_capacity(postfix.len());

    for token in postfix {
        match *token {
            Token::Number(value) => stack.push(Argument::Literal(value)),
            Token::Operator(op) => {
                let (Some(arg2), Some(arg1)) = (stack.pop(), stack.pop()) else {
                    return Err(CompileError::Values);
                };
                let task = Task::new(expression_id, op, arg1, arg2, times.for_operation(op));
                stack.push(Argument::TaskOutput(task.id));
                tasks.push(task);
            }
        }
    }

    // A lone number or dangling operands never reach a final task.
    if stack.len() != 1 || tasks.is_empty() {
        return Err(CompileError::Values);
    }

    Ok(tasks)
}
