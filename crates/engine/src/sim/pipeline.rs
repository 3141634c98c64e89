//! Per-access step pipeline.
//!
//! Every address passes through five phases in fixed order, no skipping:
//! ParseAddress → CheckLine → HandleResult → WriteUpdate → Finish. One
//! parameterized pipeline serves all three organizations; the differences
//! live in the geometry, the lookup, and the narration wording.
//!
//! Each phase mutates the shared [`SimulationState`] and returns a
//! [`Narration`] — human-readable text derived deterministically from the
//! new state. Narration carries no control-flow significance; the
//! controller appends it to the message log for the display layer.

use serde::Serialize;
use tracing::trace;

use crate::addr;
use crate::cache::policies::ReplacementPolicy;
use crate::cache::{Lookup, SENTINEL_MISS, SENTINEL_OUTDATED};
use crate::config::Organization;
use crate::error::SimError;
use crate::sim::controller::SimulationState;
use crate::stats::PerformanceMetrics;

/// The five pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Decompose the address into tag/index/offset/data.
    ParseAddress,
    /// Look the decomposed key up in the cache store.
    CheckLine,
    /// Apply the hit/miss/replace response and bump counters.
    HandleResult,
    /// Write the new block into the resolved line.
    WriteUpdate,
    /// Recompute metrics and clear transient highlighting.
    Finish,
}

impl Phase {
    /// Number of phases per access.
    pub const COUNT: usize = 5;

    /// All phases in execution order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ParseAddress,
        Self::CheckLine,
        Self::HandleResult,
        Self::WriteUpdate,
        Self::Finish,
    ];

    /// Phase at a given cursor position, or `None` past the last phase.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display label, matching the step list a front end shows.
    pub fn label(self) -> &'static str {
        match self {
            Self::ParseAddress => "Parse Address",
            Self::CheckLine => "Check Cache Line",
            Self::HandleResult => "Handle Hit or Miss",
            Self::WriteUpdate => "Write or Update Cache Line",
            Self::Finish => "Finish",
        }
    }
}

/// Lookup outcome attached to an in-flight access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheResult {
    /// The block was resident.
    Hit,
    /// Cold miss into an empty way.
    Miss,
    /// Miss evicting a resident line.
    Replace,
}

/// Transient display action, highlighted by the (out-of-scope) view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheAction {
    /// The lookup is scanning a line or set.
    Search,
    /// The access hit.
    Hit,
    /// The access cold-missed.
    Miss,
    /// The access is evicting a victim.
    Replace,
    /// The resolved line is being written.
    Write,
}

/// State of the single in-flight access.
///
/// Created fresh per queued address, mutated by each phase, and superseded
/// when the controller advances to the next address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessState {
    /// The raw binary address string.
    pub address: String,
    /// Decomposed tag bits.
    pub tag: String,
    /// Decomposed set/line index.
    pub index: usize,
    /// Decomposed offset bits.
    pub offset: String,
    /// Block payload bits (address minus offset).
    pub data: String,
    /// Resolved way; `None` for direct-mapped and before CheckLine.
    pub way: Option<usize>,
    /// Lookup outcome; `None` before CheckLine.
    pub cache_result: Option<CacheResult>,
    /// Dirty bit the WriteUpdate phase applied.
    pub dirty: bool,
    /// Completion message set by the Finish phase.
    pub message: String,
}

impl AccessState {
    /// Fresh state for a newly dequeued address.
    pub fn fresh(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

/// Narration emitted by one phase: what is about to happen, what happened,
/// and an optional performance note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Narration {
    /// Set-up text shown before the phase's effect.
    pub pre: String,
    /// Outcome text derived from the post-phase state.
    pub action: String,
    /// Performance commentary, only on phases that touch the metrics.
    pub performance: Option<String>,
}

/// Runs one phase against the simulation state.
///
/// # Errors
///
/// Only ParseAddress can fail ([`SimError::InvalidAddress`]); it does so
/// before mutating anything, so the caller can surface the error and leave
/// the cursor, history, and counters untouched.
pub(crate) fn run_phase(
    state: &mut SimulationState,
    policy: &dyn ReplacementPolicy,
    phase: Phase,
) -> Result<Narration, SimError> {
    trace!(phase = phase.label(), address = %state.access.address, "pipeline phase");
    match phase {
        Phase::ParseAddress => parse_address(state),
        Phase::CheckLine => Ok(check_line(state, policy)),
        Phase::HandleResult => Ok(handle_result(state)),
        Phase::WriteUpdate => Ok(write_update(state)),
        Phase::Finish => Ok(finish(state)),
    }
}

fn parse_address(state: &mut SimulationState) -> Result<Narration, SimError> {
    let fields = addr::decompose(&state.access.address, &state.geometry)?;
    state.access.tag = fields.tag;
    state.access.index = fields.index;
    state.access.offset = fields.offset;
    state.access.data = fields.data;

    let g = &state.geometry;
    let a = &state.access;
    let pre = match state.mode {
        Organization::DirectMapped => format!(
            "Current address: {}. The address splits into a tag ({} bits) identifying the \
             memory block, an index ({} bits) selecting the cache line, and an offset \
             ({} bits) locating the byte within the block.",
            a.address, g.tag_bits, g.index_bits, g.offset_bits
        ),
        Organization::SetAssociative => format!(
            "Current address: {}. The address splits into a tag ({} bits), a set index \
             ({} bits) selecting one of {} sets, and an offset ({} bits).",
            a.address, g.tag_bits, g.index_bits, g.num_sets, g.offset_bits
        ),
        Organization::FullyAssociative => format!(
            "Current address: {}. The cache is a single set, so the address splits into a \
             tag ({} bits) and an offset ({} bits).",
            a.address, g.tag_bits, g.offset_bits
        ),
    };
    let action = match state.mode {
        Organization::DirectMapped => format!(
            "Mapping complete: the block maps to cache line {} with tag {}.",
            a.index, a.tag
        ),
        Organization::SetAssociative => format!(
            "Mapping complete: the block is assigned to set {} with tag {}.",
            a.index, a.tag
        ),
        Organization::FullyAssociative => format!(
            "Mapping complete: tag {} may occupy any way of the single set.",
            a.tag
        ),
    };
    Ok(Narration {
        pre,
        action,
        performance: None,
    })
}

fn check_line(state: &mut SimulationState, policy: &dyn ReplacementPolicy) -> Narration {
    state.highlight.action = Some(CacheAction::Search);
    state.highlight.action_to_index = Some(state.access.index);

    let lookup = state
        .store
        .lookup(state.access.index, &state.access.tag, policy);
    match lookup {
        Lookup::Hit { .. } => state.access.cache_result = Some(CacheResult::Hit),
        Lookup::Miss { .. } => {
            state.counters.read_misses += 1;
            state.access.cache_result = Some(CacheResult::Miss);
        }
        Lookup::Replace { .. } => {
            state.counters.write_misses += 1;
            state.access.cache_result = Some(CacheResult::Replace);
        }
    }
    if state.mode != Organization::DirectMapped {
        state.access.way = Some(lookup.way());
    }

    let a = &state.access;
    let pre = match state.mode {
        Organization::DirectMapped => format!(
            "Inspecting cache line {} for a valid block with tag {}.",
            a.index, a.tag
        ),
        Organization::SetAssociative => format!(
            "Examining all {} ways in set {} for a matching tag {}.",
            state.geometry.associativity, a.index, a.tag
        ),
        Organization::FullyAssociative => {
            format!("Checking every slot in the cache for a matching tag {}.", a.tag)
        }
    };
    let action = match (a.cache_result, state.mode) {
        (Some(CacheResult::Hit), Organization::DirectMapped) => {
            "Cache hit: the stored tag matches, so the data is already in the cache.".to_string()
        }
        (Some(CacheResult::Hit), Organization::SetAssociative) => {
            format!("Cache hit: data found in way {}.", a.way.unwrap_or(0))
        }
        (Some(CacheResult::Hit), Organization::FullyAssociative) => {
            "Cache hit: data found in the cache.".to_string()
        }
        (_, Organization::DirectMapped) => {
            "Cache miss: the tag does not match; the data must be fetched from memory."
                .to_string()
        }
        (_, Organization::SetAssociative) => {
            "Cache miss: no valid entry in this set matches the tag.".to_string()
        }
        (_, Organization::FullyAssociative) => {
            "Cache miss: no matching entry found; the block will be fetched from memory."
                .to_string()
        }
    };
    Narration {
        pre,
        action,
        performance: None,
    }
}

fn handle_result(state: &mut SimulationState) -> Narration {
    let index = state.access.index;
    let way = state.access.way.unwrap_or(0);
    let hit_time = state.config.cache.hit_time_cycles;
    let miss_penalty = state.config.cache.miss_penalty_cycles;

    let action = match state.access.cache_result {
        Some(CacheResult::Hit) => {
            state.store.touch(index, way, state.counters.access_counter);
            state.counters.access_counter += 1;
            state.counters.hits += 1;
            state.highlight.action = Some(CacheAction::Hit);
            state.highlight.cache_result = Some(CacheResult::Hit);
            format!(
                "Cache hit: access served in {hit_time} cycle(s); the line's access stamp \
                 was refreshed."
            )
        }
        Some(CacheResult::Replace) => {
            state.store.invalidate(index, way, SENTINEL_OUTDATED);
            state.counters.misses += 1;
            state.counters.total_writes += 1;
            state.highlight.action = Some(CacheAction::Replace);
            state.highlight.cache_result = Some(CacheResult::Replace);
            match state.mode {
                Organization::DirectMapped => format!(
                    "Replacing the resident block in line {index}: fetching from memory \
                     incurs a {miss_penalty}-cycle penalty."
                ),
                _ => format!(
                    "Replacing the least-recently-used entry in way {way}: fetching from \
                     memory incurs a {miss_penalty}-cycle penalty."
                ),
            }
        }
        Some(CacheResult::Miss) | None => {
            state.store.invalidate(index, way, SENTINEL_MISS);
            state.counters.misses += 1;
            state.counters.total_reads += 1;
            state.highlight.action = Some(CacheAction::Miss);
            state.highlight.cache_result = Some(CacheResult::Miss);
            match state.mode {
                Organization::DirectMapped => format!(
                    "Filling the empty line {index}: fetching from memory incurs a \
                     {miss_penalty}-cycle penalty."
                ),
                _ => format!(
                    "Claiming the empty way {way}: fetching from memory incurs a \
                     {miss_penalty}-cycle penalty."
                ),
            }
        }
    };

    Narration {
        pre: "Evaluating whether the lookup was a hit, a cold miss, or a miss requiring \
              replacement, and applying the matching response."
            .to_string(),
        action,
        performance: None,
    }
}

fn write_update(state: &mut SimulationState) -> Narration {
    let index = state.access.index;
    let way = state.access.way.unwrap_or(0);

    let pre = match state.access.cache_result {
        Some(CacheResult::Replace) => format!(
            "Replacing the outdated contents at index {index} with the fetched block."
        ),
        Some(CacheResult::Hit) => {
            "Updating the cache entry to refresh its contents and access time.".to_string()
        }
        _ => format!("Writing the fetched block into index {index}."),
    };

    state.store.write(
        index,
        way,
        &state.access.tag,
        &state.access.data,
        &state.access.offset,
        state.config.cache.write_policy,
        state.counters.access_counter,
    );
    state.access.dirty = state.store.line(index, way).dirty;

    // The display highlight is forced to a HIT/WRITE: once the write lands
    // the value is resident regardless of how the access began. The access
    // state keeps its lookup outcome; that is what the auto-chain rule and
    // the narration key off.
    state.highlight.cache_result = Some(CacheResult::Hit);
    state.highlight.action = Some(CacheAction::Write);
    state.highlight.action_to_index = Some(index);

    let action = match state.mode {
        Organization::DirectMapped => format!(
            "Wrote tag {} into cache line {index}.",
            state.access.tag
        ),
        Organization::SetAssociative => format!(
            "Set {index} updated: {} of {} ways occupied.",
            state.store.occupancy(index),
            state.geometry.associativity
        ),
        Organization::FullyAssociative => format!(
            "Cache updated: {} of {} slots occupied.",
            state.store.occupancy(0),
            state.geometry.num_lines
        ),
    };
    Narration {
        pre,
        action,
        performance: None,
    }
}

fn finish(state: &mut SimulationState) -> Narration {
    state.metrics = PerformanceMetrics::compute(&state.counters, &state.config);
    state.metrics_history.push(state.metrics);
    state.highlight.clear();

    state.access.message = match state.mode {
        Organization::DirectMapped => "Direct-mapped access completed.",
        Organization::SetAssociative => "Set-associative access completed.",
        Organization::FullyAssociative => "Fully-associative access completed.",
    }
    .to_string();

    let action = format!(
        "Access complete. Hit rate: {:.1}% ({} hits / {} accesses).",
        state.metrics.hit_rate * 100.0,
        state.counters.hits,
        state.counters.total_accesses()
    );
    Narration {
        pre: "Wrapping up this access and recomputing the performance metrics.".to_string(),
        action,
        performance: Some(format!(
            "Average access time: {:.2} cycles (hit time + miss rate x miss penalty).",
            state.metrics.avg_access_time
        )),
    }
}
