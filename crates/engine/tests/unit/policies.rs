//! Replacement Policy Unit Tests.

use pretty_assertions::assert_eq;

use cachesim_core::cache::policies::{LruPolicy, ReplacementPolicy};
use cachesim_core::cache::CacheLine;

/// A valid line with the given recency stamp.
fn line(last_access: u64) -> CacheLine {
    CacheLine {
        valid: true,
        last_access,
        ..CacheLine::default()
    }
}

// ══════════════════════════════════════════════════════════
// 1. Least-recently-used selection
// ══════════════════════════════════════════════════════════

/// The victim is the way with the smallest access stamp.
#[test]
fn lru_selects_oldest_stamp() {
    let ways = vec![line(5), line(2), line(9), line(7)];
    assert_eq!(LruPolicy.select_victim(&ways), 1);
}

/// Ties break to the lowest-indexed way: a strict less-than scan keeps
/// the first minimum it sees.
#[test]
fn lru_ties_break_to_lowest_way() {
    let ways = vec![line(3), line(0), line(0), line(4)];
    assert_eq!(LruPolicy.select_victim(&ways), 1);

    let all_equal = vec![line(0), line(0), line(0)];
    assert_eq!(LruPolicy.select_victim(&all_equal), 0);
}

/// A single-way set has only one possible victim.
#[test]
fn lru_single_way() {
    assert_eq!(LruPolicy.select_victim(&[line(42)]), 0);
}
