//! # Unit Components
//!
//! Aggregates the per-module unit tests for the simulation engine.


/// Cache storage (lookup/write/invalidate/reset) tests.
pub mod cache;



/// Replacement policy tests.
pub mod policies;

/// Performance model tests.
pub mod stats;
