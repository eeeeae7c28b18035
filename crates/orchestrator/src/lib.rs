//! Paral orchestrator.
//!
//! Accepts arithmetic expressions, compiles them into task graphs, and leases
//! runnable tasks to workers over HTTP (or in process through [`TaskSource`]).
//!
//! [`TaskSource`]: paral_execution::TaskSource

pub mod api;
pub mod error;
pub mod router;
pub mod service;

pub use error::{OrchestratorError, Result};
pub use router::build_router;
pub use service::Orchestrator;
