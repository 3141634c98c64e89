//! Cache behavior teaching simulator library.
//!
//! This crate implements a step-by-step simulator of processor cache
//! behavior with the following:
//! 1. **Address codec:** Binary-string decomposition into tag/index/offset.
//! 2. **Cache store:** Direct-mapped, set-associative, and fully-associative
//!    organizations with LRU replacement.
//! 3. **Step pipeline:** A five-phase per-access state machine producing
//!    human-readable narration for each transition.
//! 4. **Controller:** An address queue, snapshot history with step-back, and
//!    a command surface for an external display layer.
//! 5. **Performance model:** Hit/miss rates, AMAT, stall cycles, write-buffer
//!    overflow, and CPU time from the accumulated counters.
//!
//! The crate is a pure in-process simulation object: no I/O, no persistence,
//! no rendering. A front end consumes the read-only observables and invokes
//! the controller's commands.

/// Address decomposition and derived cache geometry.
pub mod addr;
/// Cache line storage and replacement policies.
pub mod cache;
/// Simulator configuration (defaults, enums, hierarchical config, options).
pub mod config;
/// Error definitions.
pub mod error;
/// Step pipeline and simulation controller.
pub mod sim;
/// Access counters and the closed-form performance model.
pub mod stats;

/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::{Organization, SimConfig, WritePolicy};
/// Engine error type.
pub use crate::error::SimError;
/// Main entry point; owns the whole simulation state.
pub use crate::sim::SimulationController;
/// Derived performance metrics.
pub use crate::stats::{Counters, PerformanceMetrics};
