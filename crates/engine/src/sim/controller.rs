//! Simulation controller: orchestration, snapshots, and undo.
//!
//! The controller owns the whole simulation as a single
//! [`SimulationState`] — no ambient globals — and is its sole mutator.
//! It drives the step pipeline phase-by-phase over an ordered address
//! queue, and after every phase transition appends a full deep-copy
//! [`HistorySnapshot`] to an append-only history. `step_back` is a pointer
//! rewind into that history, not a logical inverse: counters come back
//! exactly as snapshotted, never recomputed.
//!
//! Everything is single-threaded and synchronous; `step()` completes fully
//! before returning. The one wrinkle is the auto-chain rule: a write phase
//! whose access began as a hit folds the Finish phase into the same call.

use serde::Serialize;
use tracing::debug;

use crate::addr::CacheGeometry;
use crate::cache::policies::LruPolicy;
use crate::cache::CacheStore;
use crate::config::{Organization, SimConfig, WritePolicy};
use crate::error::SimError;
use crate::sim::pipeline::{
    self, AccessState, CacheAction, CacheResult, Narration, Phase,
};
use crate::stats::{Counters, PerformanceMetrics};

/// Transient display highlighting: which line the view should flash and why.
///
/// Cleared by the Finish phase. The `cache_result` here is the *display*
/// outcome (forced to HIT once a write lands); the access state keeps the
/// real lookup outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Highlight {
    /// Action being animated.
    pub action: Option<CacheAction>,
    /// Set/line index the action targets.
    pub action_to_index: Option<usize>,
    /// Display outcome of the current phase.
    pub cache_result: Option<CacheResult>,
}

impl Highlight {
    /// Clears all highlighting fields.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The complete simulation state, owned exclusively by the controller.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    /// Active configuration.
    pub config: SimConfig,
    /// Active cache organization.
    pub mode: Organization,
    /// Geometry derived from `config` and `mode`; always consistent.
    pub geometry: CacheGeometry,
    /// Cache line storage.
    pub store: CacheStore,
    /// Aggregate access counters.
    pub counters: Counters,
    /// Metrics derived after the last completed access.
    pub metrics: PerformanceMetrics,
    /// One metrics entry per completed access, in completion order.
    pub metrics_history: Vec<PerformanceMetrics>,
    /// Narration for the current address, one entry per completed phase.
    pub message_log: Vec<Narration>,
    /// Phase cursor into [`Phase::ALL`]; `Phase::COUNT` once exhausted.
    pub current_phase: usize,
    /// The in-flight access.
    pub access: AccessState,
    /// Ordered address queue.
    pub queue: Vec<String>,
    /// Position of the current address within the queue.
    pub queue_index: usize,
    /// Transient display highlighting.
    pub highlight: Highlight,
}

/// An immutable deep copy of the mutable simulation state, taken after each
/// phase transition. Configuration and the queue are not part of a snapshot:
/// changing either resets the history instead.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    /// Cache contents at snapshot time.
    pub store: CacheStore,
    /// Counters at snapshot time.
    pub counters: Counters,
    /// Metrics at snapshot time.
    pub metrics: PerformanceMetrics,
    /// Metrics history at snapshot time.
    pub metrics_history: Vec<PerformanceMetrics>,
    /// Message log at snapshot time.
    pub message_log: Vec<Narration>,
    /// Phase cursor at snapshot time.
    pub current_phase: usize,
    /// In-flight access at snapshot time.
    pub access: AccessState,
    /// Queue position at snapshot time.
    pub queue_index: usize,
    /// Display highlighting at snapshot time.
    pub highlight: Highlight,
}

/// Orchestrates the step pipeline over an address queue with snapshot undo.
#[derive(Debug)]
pub struct SimulationController {
    state: SimulationState,
    policy: LruPolicy,
    history: Vec<HistorySnapshot>,
    cursor: Option<usize>,
}

impl SimulationController {
    /// Creates a controller with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfiguration`] when the configuration
    /// violates the organization's structural invariants.
    pub fn new(config: SimConfig, mode: Organization) -> Result<Self, SimError> {
        let geometry = CacheGeometry::new(&config.cache, mode)?;
        let store = CacheStore::new(mode, &geometry);
        Ok(Self {
            state: SimulationState {
                config,
                mode,
                geometry,
                store,
                counters: Counters::default(),
                metrics: PerformanceMetrics::default(),
                metrics_history: Vec::new(),
                message_log: Vec::new(),
                current_phase: 0,
                access: AccessState::default(),
                queue: Vec::new(),
                queue_index: 0,
                highlight: Highlight::default(),
            },
            policy: LruPolicy,
            history: Vec::new(),
            cursor: None,
        })
    }

    /// Validates and replaces the configuration, reallocating the cache and
    /// resetting counters, metrics, and history.
    ///
    /// # Errors
    ///
    /// On [`SimError::InvalidConfiguration`] the previous configuration and
    /// all state are left intact.
    pub fn configure(&mut self, config: SimConfig) -> Result<(), SimError> {
        let geometry = CacheGeometry::new(&config.cache, self.state.mode)?;
        debug!(
            cache_size = config.cache.cache_size_bytes,
            block_size = config.cache.block_size_bytes,
            associativity = config.cache.associativity,
            "configure"
        );
        self.state.config = config;
        self.reallocate(geometry);
        Ok(())
    }

    /// Switches the cache organization, recomputing the associativity
    /// default for the new mode, and reallocates.
    ///
    /// Defaults: 1 for direct-mapped; 2 for set-associative unless a wider
    /// value is already set; the full line count for fully-associative.
    ///
    /// # Errors
    ///
    /// On [`SimError::InvalidConfiguration`] the previous mode and state are
    /// left intact.
    pub fn set_mode(&mut self, mode: Organization) -> Result<(), SimError> {
        let mut cache = self.state.config.cache.clone();
        cache.associativity = match mode {
            Organization::DirectMapped => 1,
            Organization::SetAssociative => {
                if cache.associativity > 1 {
                    cache.associativity
                } else {
                    2
                }
            }
            Organization::FullyAssociative => cache.line_count(),
        };
        let geometry = CacheGeometry::new(&cache, mode)?;
        debug!(?mode, associativity = cache.associativity, "set_mode");
        self.state.config.cache = cache;
        self.state.mode = mode;
        self.reallocate(geometry);
        Ok(())
    }

    /// Changes the write policy. Affects future writes and the performance
    /// model only; no reallocation.
    pub fn set_write_policy(&mut self, policy: WritePolicy) {
        self.state.config.cache.write_policy = policy;
    }

    /// Replaces the address queue and rewinds to its first address.
    pub fn set_address_queue(&mut self, addresses: Vec<String>) {
        self.state.queue = addresses;
        self.state.queue_index = 0;
        self.begin_access();
    }

    /// Jumps the queue cursor to `index`; out-of-range indices are ignored.
    pub fn set_current_address(&mut self, index: usize) {
        if index < self.state.queue.len() {
            self.state.queue_index = index;
            self.begin_access();
        }
    }

    /// Advances the pipeline by exactly one phase for the current address
    /// and appends a history snapshot.
    ///
    /// Auto-chain rule (intentional, preserved from the original design): if
    /// the access being written began as a hit, the Finish phase runs
    /// synchronously within this same call, so a hit's WriteUpdate and
    /// Finish collapse into one observable step. Misses and replacements do
    /// not chain.
    ///
    /// Once all phases for the current address are exhausted this is a
    /// no-op; advancing to the next address is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidAddress`] from the parse phase. The cursor is left
    /// unadvanced and no snapshot is recorded.
    pub fn step(&mut self) -> Result<(), SimError> {
        loop {
            let Some(phase) = Phase::from_index(self.state.current_phase) else {
                return Ok(());
            };
            let narration = pipeline::run_phase(&mut self.state, &self.policy, phase)?;
            self.state.message_log.push(narration);
            self.state.current_phase += 1;
            self.push_snapshot();

            let chain = phase == Phase::WriteUpdate
                && self.state.access.cache_result == Some(CacheResult::Hit);
            if !chain {
                return Ok(());
            }
        }
    }

    /// Pulls the next queued address and resets the phase cursor. A no-op
    /// past the end of the queue (an empty queue is not an error).
    pub fn advance_to_next_address(&mut self) {
        if self.state.queue_index + 1 >= self.state.queue.len() {
            return;
        }
        self.state.queue_index += 1;
        self.begin_access();
    }

    /// Moves the history cursor back one snapshot and restores it verbatim.
    ///
    /// This is a pointer rewind, not an inverse operation: counters and
    /// metrics are restored exactly as recorded. A no-op at the start of
    /// history or before any snapshot exists.
    pub fn step_back(&mut self) {
        let Some(cursor) = self.cursor else { return };
        if cursor == 0 {
            return;
        }
        let snapshot = self.history[cursor - 1].clone();
        self.restore(snapshot);
        self.cursor = Some(cursor - 1);
    }

    /// Runs step/advance until the entire address queue is exhausted.
    ///
    /// # Errors
    ///
    /// Stops at the first [`SimError::InvalidAddress`] in the queue.
    pub fn fast_forward(&mut self) -> Result<(), SimError> {
        if self.state.queue.is_empty() {
            return Ok(());
        }
        loop {
            while self.state.current_phase < Phase::COUNT {
                self.step()?;
            }
            if self.state.queue_index + 1 < self.state.queue.len() {
                self.advance_to_next_address();
            } else {
                return Ok(());
            }
        }
    }

    /// Clears line contents and zeroes counters, metrics, and history
    /// without changing the allocation shape or the configured queue.
    /// Idempotent.
    pub fn reset(&mut self) {
        debug!("reset");
        self.state.store.reset();
        self.state.counters = Counters::default();
        self.state.metrics = PerformanceMetrics::default();
        self.state.metrics_history.clear();
        self.state.queue_index = 0;
        self.begin_access();
        // Seed history with the clean baseline so step_back stays safe.
        self.history = vec![self.snapshot()];
        self.cursor = Some(0);
    }

    // ── Read-only observables ────────────────────────────────────────────

    /// The full simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Current cache contents.
    pub fn store(&self) -> &CacheStore {
        &self.state.store
    }

    /// Aggregate counters.
    pub fn counters(&self) -> &Counters {
        &self.state.counters
    }

    /// Metrics after the last completed access.
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.state.metrics
    }

    /// One metrics entry per completed access.
    pub fn metrics_history(&self) -> &[PerformanceMetrics] {
        &self.state.metrics_history
    }

    /// Narration log for the current address.
    pub fn message_log(&self) -> &[Narration] {
        &self.state.message_log
    }

    /// The in-flight access state.
    pub fn access(&self) -> &AccessState {
        &self.state.access
    }

    /// Phase cursor position (0..=[`Phase::COUNT`]).
    pub fn current_phase(&self) -> usize {
        self.state.current_phase
    }

    /// The next phase to run, or `None` once exhausted for this address.
    pub fn phase(&self) -> Option<Phase> {
        Phase::from_index(self.state.current_phase)
    }

    /// Active organization.
    pub fn mode(&self) -> Organization {
        self.state.mode
    }

    /// Active configuration.
    pub fn config(&self) -> &SimConfig {
        &self.state.config
    }

    /// Derived geometry.
    pub fn geometry(&self) -> &CacheGeometry {
        &self.state.geometry
    }

    /// The configured address queue.
    pub fn queue(&self) -> &[String] {
        &self.state.queue
    }

    /// Position of the current address within the queue.
    pub fn queue_index(&self) -> usize {
        self.state.queue_index
    }

    /// Transient display highlighting.
    pub fn highlight(&self) -> &Highlight {
        &self.state.highlight
    }

    /// Number of snapshots recorded.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Current history cursor, if any snapshot has been taken.
    pub fn history_cursor(&self) -> Option<usize> {
        self.cursor
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Starts a fresh access for the address at the current queue position.
    fn begin_access(&mut self) {
        let address = self
            .state
            .queue
            .get(self.state.queue_index)
            .cloned()
            .unwrap_or_default();
        self.state.access = AccessState::fresh(address);
        self.state.current_phase = 0;
        self.state.message_log.clear();
        self.state.highlight.clear();
    }

    /// Applies a new geometry: reallocates storage and resets everything
    /// derived from past accesses, including the snapshot history.
    fn reallocate(&mut self, geometry: CacheGeometry) {
        self.state.geometry = geometry;
        self.state.store = CacheStore::new(self.state.mode, &geometry);
        self.state.counters = Counters::default();
        self.state.metrics = PerformanceMetrics::default();
        self.state.metrics_history.clear();
        self.begin_access();
        self.history.clear();
        self.cursor = None;
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            store: self.state.store.clone(),
            counters: self.state.counters,
            metrics: self.state.metrics,
            metrics_history: self.state.metrics_history.clone(),
            message_log: self.state.message_log.clone(),
            current_phase: self.state.current_phase,
            access: self.state.access.clone(),
            queue_index: self.state.queue_index,
            highlight: self.state.highlight,
        }
    }

    /// Appends a snapshot; the history is append-only, so stepping forward
    /// after an undo appends past the rewound branch rather than truncating.
    fn push_snapshot(&mut self) {
        self.history.push(self.snapshot());
        self.cursor = Some(self.history.len() - 1);
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        self.state.store = snapshot.store;
        self.state.counters = snapshot.counters;
        self.state.metrics = snapshot.metrics;
        self.state.metrics_history = snapshot.metrics_history;
        self.state.message_log = snapshot.message_log;
        self.state.current_phase = snapshot.current_phase;
        self.state.access = snapshot.access;
        self.state.queue_index = snapshot.queue_index;
        self.state.highlight = snapshot.highlight;
    }
}
