//! Dependency resolution for tasks.

use std::collections::{HashMap, HashSet};

use paral_core::{Task, TaskId, TaskStatus};

/// Read access to tasks by id.
pub trait TaskLookup {
    /// Find a task.
    fn task(&self, id: TaskId) -> Option<&Task>;
}

impl TaskLookup for HashMap<TaskId, Task> {
    fn task(&self, id: TaskId) -> Option<&Task> {
        self.get(&id)
    }
}

/// Result of dependency resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// All dependencies completed, ready to execute
    Ready,
    /// Waiting on these tasks
    Blocked(Vec<TaskId>),
    /// These dependencies failed; the task can never run
    Failed(Vec<TaskId>),
}

/// A batch of tasks that does not form a valid DAG.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    /// The same id appears twice
    #[error("duplicate task {0}")]
    DuplicateTask(TaskId),

    /// An edge points at a task that is not earlier in the batch
    #[error("task {task} depends on {dependency}, which is not an earlier task of the batch")]
    UnknownDependency {
        /// Dependent task
        task: TaskId,
        /// Missing dependency
        dependency: TaskId,
    },

    /// Tasks of the batch belong to different expressions
    #[error("task {0} belongs to a different expression")]
    ForeignTask(TaskId),
}

/// Resolves task dependencies.
pub struct DependencyResolver;

impl DependencyResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Check whether `task`'s dependencies are satisfied.
    pub fn check(&self, tasks: &impl TaskLookup, task: &Task) -> Resolution {
        let mut blocked = Vec::new();
        let mut failed = Vec::new();

        for &dep_id in &task.dependencies {
            match tasks.task(dep_id).map(|t| t.status) {
                Some(TaskStatus::Completed) => {}
                Some(TaskStatus::Error) => failed.push(dep_id),
                // Missing dependencies block
                _ => blocked.push(dep_id),
            }
        }

        if !failed.is_empty() {
            Resolution::Failed(failed)
        } else if !blocked.is_empty() {
            Resolution::Blocked(blocked)
        } else {
            Resolution::Ready
        }
    }

    /// Verify a freshly compiled batch: unique ids, one owning expression,
    /// and every edge pointing at an earlier task (so the batch is already
    /// in topological order and acyclic).
    pub fn validate_batch(&self, tasks: &[Task]) -> Result<(), DependencyError> {
        let mut seen = HashSet::new();
        let owner = tasks.first().map(|t| t.expression_id);

        for task in tasks {
            if Some(task.expression_id) != owner {
                return Err(DependencyError::ForeignTask(task.id));
            }
            for &dependency in &task.dependencies {
                if !seen.contains(&dependency) {
                    return Err(DependencyError::UnknownDependency { task: task.id, dependency });
                }
            }
            if !seen.insert(task.id) {
                return Err(DependencyError::DuplicateTask(task.id));
            }
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
