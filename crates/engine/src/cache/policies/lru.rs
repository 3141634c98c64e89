//! Least Recently Used (LRU) replacement policy.
//!
//! Evicts the way whose `last_access` stamp is smallest. Stamps come from a
//! monotonically increasing access counter that the pipeline bumps on every
//! hit, so the smallest stamp marks the line untouched for the longest time.
//!
//! Ties resolve to the lowest way index: the scan uses strict `<`, so the
//! earliest-indexed minimum wins. Untouched lines all carry stamp 0 and the
//! same rule fills a fresh set left to right.

use super::ReplacementPolicy;
use crate::cache::CacheLine;

/// LRU policy. Stateless; recency is read off the lines themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruPolicy;

impl ReplacementPolicy for LruPolicy {
    fn select_victim(&self, ways: &[CacheLine]) -> usize {
        let mut victim = 0;
        for (way, line) in ways.iter().enumerate() {
            if line.last_access < ways[victim].last_access {
                victim = way;
            }
        }
        victim
    }
}
