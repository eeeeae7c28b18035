//! Task selection strategies.

use paral_core::Task;

/// Strategy for choosing which eligible task to dispatch next.
pub trait TaskSelector: Send + Sync {
    /// Pick one of `candidates`, which are listed in creation order.
    fn select<'a>(&self, candidates: &[&'a Task]) -> Option<&'a Task>;
}

/// Earliest-created-first selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoSelector;

impl FifoSelector {
    /// Create a new FIFO selector.
    pub fn new() -> Self {
        Self
    }
}

impl TaskSelector for FifoSelector {
    fn select<'a>(&self, candidates: &[&'a Task]) -> Option<&'a Task> {
        candidates.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paral_core::{Argument, ExpressionId, Operation};
    use std::time::Duration;

    #[test]
    fn test_fifo_picks_first_candidate() {
        let make = || {
            Task::new(ExpressionId::new(), Operation::Add, Argument::Literal(1.0), Argument::Literal(1.0), Duration::ZERO)
        };
        let (a, b) = (make(), make());

        assert_eq!(FifoSelector::new().select(&[&a, &b]).map(|t| t.id), Some(a.id));
        assert!(FifoSelector::new().select(&[]).is_none());
    }
}
