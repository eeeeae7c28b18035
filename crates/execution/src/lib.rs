//! Execution layer - dependency resolution, task selection, status
//! propagation, dispatch leases, and the worker loop.

#![warn(missing_docs)]

pub mod dependency;
pub mod selector;
pub mod propagation;
pub mod scheduler;
pub mod engine;

pub use dependency::{DependencyError, DependencyResolver, Resolution, TaskLookup};
pub use selector::{FifoSelector, TaskSelector};
pub use propagation::{apply_outcome, reconcile, TransitionError};
pub use scheduler::LeasePolicy;
pub use engine::{CycleResult, EngineConfig, ExecutionEngine, TaskSource};
