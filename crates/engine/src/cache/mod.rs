//! Cache storage model.
//!
//! The in-memory representation of cache lines, sets, and ways, plus the
//! lookup/allocate/update/invalidate operations the step pipeline drives.
//! Two physical shapes cover the three organizations: a flat line vector for
//! direct-mapped caches, and a vector of sets for set-associative and
//! fully-associative caches (the latter always a single set spanning every
//! line).
//!
//! Tags, data, and offsets are stored as bit strings: lookup compares tags
//! for equality only, and the display layer renders the fields verbatim.

/// Replacement policy trait and implementations.
pub mod policies;

use serde::Serialize;

use crate::addr::CacheGeometry;
use crate::config::{Organization, WritePolicy};
use policies::ReplacementPolicy;

/// Sentinel text written into a line evicted to make room (REPLACE).
pub const SENTINEL_OUTDATED: &str = "outdated";

/// Sentinel text written into an empty line claimed by a cold miss (MISS).
pub const SENTINEL_MISS: &str = "miss";

/// One cache line: the unit of storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    /// Whether the line holds live data.
    pub valid: bool,
    /// Stored tag bits (or a sentinel while the line is being turned over).
    pub tag: String,
    /// The cached block's addressable payload.
    pub data: String,
    /// Offset bits of the access that filled the line (display only).
    pub offset: String,
    /// Stamp from the monotonic access counter; drives LRU.
    pub last_access: u64,
    /// Set when the line holds data not yet written back to memory.
    pub dirty: bool,
}

impl CacheLine {
    /// Clears the line back to its empty state, keeping its slot.
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Overwrites the line's contents with a sentinel and drops validity.
    fn invalidate(&mut self, sentinel: &str) {
        self.valid = false;
        self.tag = sentinel.to_string();
        self.data = sentinel.to_string();
        self.offset = sentinel.to_string();
        self.dirty = false;
    }
}

/// One set: an ordered group of ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSet {
    /// The set's lines, in way order.
    pub ways: Vec<CacheLine>,
}

/// Outcome of a cache lookup, naming the way the access resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lookup {
    /// A valid line with a matching tag.
    Hit {
        /// The matching way.
        way: usize,
    },
    /// No match, but a free (invalid) way is available: a cold miss.
    Miss {
        /// The lowest-indexed free way.
        way: usize,
    },
    /// No match and no free way: a miss requiring eviction.
    Replace {
        /// The victim chosen by the replacement policy.
        way: usize,
    },
}

impl Lookup {
    /// The way this lookup resolved to, regardless of outcome.
    pub fn way(self) -> usize {
        match self {
            Self::Hit { way } | Self::Miss { way } | Self::Replace { way } => way,
        }
    }
}

/// Cache line storage for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStore {
    /// Flat line-per-index storage (direct-mapped).
    DirectMapped {
        /// Lines indexed 0..`num_lines`.
        lines: Vec<CacheLine>,
    },
    /// Set-of-ways storage (set-associative and fully-associative).
    Associative {
        /// Sets indexed 0..`num_sets`; fully-associative has exactly one.
        sets: Vec<CacheSet>,
    },
}

impl CacheStore {
    /// Allocates empty storage matching the organization and geometry.
    pub fn new(mode: Organization, geometry: &CacheGeometry) -> Self {
        match mode {
            Organization::DirectMapped => Self::DirectMapped {
                lines: vec![CacheLine::default(); geometry.num_lines],
            },
            Organization::SetAssociative | Organization::FullyAssociative => Self::Associative {
                sets: (0..geometry.num_sets)
                    .map(|_| CacheSet {
                        ways: vec![CacheLine::default(); geometry.associativity],
                    })
                    .collect(),
            },
        }
    }

    /// Looks a decomposed address up.
    ///
    /// Direct-mapped: the single line at `index` — hit iff valid with a
    /// matching tag; a valid line with a different tag is a `Replace` at
    /// that same line; an invalid line is a `Miss`.
    ///
    /// Associative: scan the set's ways in index order — hit on the first
    /// valid matching way, else `Miss` at the first invalid way, else the
    /// replacement policy names the `Replace` victim.
    pub fn lookup(&self, index: usize, tag: &str, policy: &dyn ReplacementPolicy) -> Lookup {
        match self {
            Self::DirectMapped { lines } => {
                let line = &lines[index];
                if line.valid && line.tag == tag {
                    Lookup::Hit { way: 0 }
                } else if line.valid {
                    Lookup::Replace { way: 0 }
                } else {
                    Lookup::Miss { way: 0 }
                }
            }
            Self::Associative { sets } => {
                let ways = &sets[index].ways;
                if let Some(way) = ways.iter().position(|w| w.valid && w.tag == tag) {
                    return Lookup::Hit { way };
                }
                if let Some(way) = ways.iter().position(|w| !w.valid) {
                    return Lookup::Miss { way };
                }
                Lookup::Replace {
                    way: policy.select_victim(ways),
                }
            }
        }
    }

    /// Writes a block into a line: marks it valid, stores tag/data/offset,
    /// stamps `last_access`, and sets the dirty bit per the write policy.
    pub fn write(
        &mut self,
        index: usize,
        way: usize,
        tag: &str,
        data: &str,
        offset: &str,
        write_policy: WritePolicy,
        access_counter: u64,
    ) {
        let line = self.line_mut(index, way);
        line.valid = true;
        line.tag = tag.to_string();
        line.data = data.to_string();
        line.offset = offset.to_string();
        line.dirty = write_policy == WritePolicy::WriteBack;
        line.last_access = access_counter;
    }

    /// Invalidates a line ahead of a refill, leaving sentinel text in its
    /// fields for the trace. Functionally equivalent to clearing validity.
    pub fn invalidate(&mut self, index: usize, way: usize, sentinel: &str) {
        self.line_mut(index, way).invalidate(sentinel);
    }

    /// Refreshes a line's recency stamp (on a hit).
    pub fn touch(&mut self, index: usize, way: usize, access_counter: u64) {
        self.line_mut(index, way).last_access = access_counter;
    }

    /// Borrows one line.
    ///
    /// # Panics
    ///
    /// Panics if `index`/`way` fall outside the allocated shape. Callers
    /// only pass values produced by [`CacheStore::lookup`] against the same
    /// store, which are always in range.
    pub fn line(&self, index: usize, way: usize) -> &CacheLine {
        match self {
            Self::DirectMapped { lines } => &lines[index],
            Self::Associative { sets } => &sets[index].ways[way],
        }
    }

    /// Ways of one set, in way order (a single line for direct-mapped).
    pub fn ways(&self, index: usize) -> &[CacheLine] {
        match self {
            Self::DirectMapped { lines } => std::slice::from_ref(&lines[index]),
            Self::Associative { sets } => &sets[index].ways,
        }
    }

    /// Number of indexable sets (lines for direct-mapped).
    pub fn num_sets(&self) -> usize {
        match self {
            Self::DirectMapped { lines } => lines.len(),
            Self::Associative { sets } => sets.len(),
        }
    }

    /// Count of valid lines in one set.
    pub fn occupancy(&self, index: usize) -> usize {
        self.ways(index).iter().filter(|w| w.valid).count()
    }

    /// Clears every line's contents without changing the allocation shape.
    pub fn reset(&mut self) {
        match self {
            Self::DirectMapped { lines } => lines.iter_mut().for_each(CacheLine::clear),
            Self::Associative { sets } => sets
                .iter_mut()
                .flat_map(|s| s.ways.iter_mut())
                .for_each(CacheLine::clear),
        }
    }

    fn line_mut(&mut self, index: usize, way: usize) -> &mut CacheLine {
        match self {
            Self::DirectMapped { lines } => &mut lines[index],
            Self::Associative { sets } => &mut sets[index].ways[way],
        }
    }
}
