//! Simulation driver: the step pipeline and its controller.

/// Simulation controller, state, and snapshot history.
pub mod controller;
/// The five-phase per-access state machine and its narration.
pub mod pipeline;

pub use controller::{HistorySnapshot, Highlight, SimulationController, SimulationState};
pub use pipeline::{AccessState, CacheAction, CacheResult, Narration, Phase};
