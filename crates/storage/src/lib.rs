//! Storage abstraction and implementations for Paral.
//!
//! This crate provides a trait-based repository interface with an in-memory
//! reference implementation guarded by a single reader/writer lock.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;

pub use trait_::{Repository, StorageError, Result};
pub use memory::InMemoryRepository;
