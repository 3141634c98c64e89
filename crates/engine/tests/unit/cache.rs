//! Cache Store Unit Tests.
//!
//! Verifies lookup precedence (hit, cold miss, replace), write and
//! invalidate semantics, and shape-preserving reset for both physical
//! storage layouts.

use pretty_assertions::assert_eq;

use cachesim_core::addr::CacheGeometry;
use cachesim_core::cache::policies::LruPolicy;
use cachesim_core::cache::{CacheStore, Lookup, SENTINEL_MISS, SENTINEL_OUTDATED};
use cachesim_core::config::{CacheConfig, Organization, WritePolicy};

/// 16 B cache, 4 B blocks: 4 lines. With 2 ways that is 2 sets.
fn store(mode: Organization, associativity: usize) -> (CacheStore, CacheGeometry) {
    let cache = CacheConfig {
        cache_size_bytes: 16,
        associativity,
        ..CacheConfig::default()
    };
    let geometry = CacheGeometry::new(&cache, mode).unwrap();
    (CacheStore::new(mode, &geometry), geometry)
}

// ══════════════════════════════════════════════════════════
// 1. Direct-mapped lookup precedence
// ══════════════════════════════════════════════════════════

/// Empty line → Miss; matching tag → Hit; valid with different tag →
/// Replace at the same line.
#[test]
fn direct_mapped_lookup_precedence() {
    let (mut store, _) = store(Organization::DirectMapped, 1);

    assert_eq!(
        store.lookup(2, "0100", &LruPolicy),
        Lookup::Miss { way: 0 }
    );

    store.write(2, 0, "0100", "010010", "00", WritePolicy::WriteBack, 0);
    assert_eq!(store.lookup(2, "0100", &LruPolicy), Lookup::Hit { way: 0 });
    assert_eq!(
        store.lookup(2, "1100", &LruPolicy),
        Lookup::Replace { way: 0 }
    );
}

// ══════════════════════════════════════════════════════════
// 2. Associative lookup precedence
// ══════════════════════════════════════════════════════════

/// Scan order: first matching valid way wins; otherwise the first free
/// way (lowest index); otherwise the policy's victim.
#[test]
fn associative_lookup_precedence() {
    let (mut store, _) = store(Organization::SetAssociative, 2);

    // Both ways free: cold miss lands in way 0.
    assert_eq!(store.lookup(0, "00000", &LruPolicy), Lookup::Miss { way: 0 });

    store.write(0, 0, "00000", "000000", "00", WritePolicy::WriteBack, 0);
    // Way 0 occupied by a different tag: next free way is 1.
    assert_eq!(store.lookup(0, "00001", &LruPolicy), Lookup::Miss { way: 1 });

    store.write(0, 1, "00001", "000010", "00", WritePolicy::WriteBack, 0);
    assert_eq!(store.lookup(0, "00001", &LruPolicy), Lookup::Hit { way: 1 });

    // Set full, no match: the replacement policy names the victim.
    assert_eq!(
        store.lookup(0, "00010", &LruPolicy),
        Lookup::Replace { way: 0 }
    );
}

/// A fully-associative store is a single set spanning every line.
#[test]
fn fully_associative_is_one_set() {
    let (store, geometry) = store(Organization::FullyAssociative, 4);
    assert_eq!(store.num_sets(), 1);
    assert_eq!(store.ways(0).len(), geometry.num_lines);
}

// ══════════════════════════════════════════════════════════
// 3. Write semantics
// ══════════════════════════════════════════════════════════

/// Write marks the line valid, stores all fields, and stamps recency.
#[test]
fn write_fills_line() {
    let (mut store, _) = store(Organization::DirectMapped, 1);
    store.write(1, 0, "0110", "011001", "10", WritePolicy::WriteBack, 7);

    let line = store.line(1, 0);
    assert!(line.valid);
    assert_eq!(line.tag, "0110");
    assert_eq!(line.data, "011001");
    assert_eq!(line.offset, "10");
    assert_eq!(line.last_access, 7);
}

/// Write-back writes set the dirty bit; write-through writes never do.
#[test]
fn dirty_bit_follows_write_policy() {
    let (mut store, _) = store(Organization::DirectMapped, 1);

    store.write(0, 0, "0000", "000000", "00", WritePolicy::WriteBack, 0);
    assert!(store.line(0, 0).dirty);

    store.write(0, 0, "0000", "000000", "00", WritePolicy::WriteThrough, 1);
    assert!(!store.line(0, 0).dirty);
}

// ══════════════════════════════════════════════════════════
// 4. Invalidate
// ══════════════════════════════════════════════════════════

/// Invalidation drops validity and leaves the sentinel in every display
/// field, clearing the dirty bit.
#[test]
fn invalidate_writes_sentinel() {
    let (mut store, _) = store(Organization::SetAssociative, 2);
    store.write(1, 1, "00011", "000110", "00", WritePolicy::WriteBack, 0);

    store.invalidate(1, 1, SENTINEL_OUTDATED);
    let line = store.line(1, 1);
    assert!(!line.valid);
    assert!(!line.dirty);
    assert_eq!(line.tag, SENTINEL_OUTDATED);
    assert_eq!(line.data, SENTINEL_OUTDATED);

    store.invalidate(1, 0, SENTINEL_MISS);
    assert_eq!(store.line(1, 0).tag, SENTINEL_MISS);
}

// ══════════════════════════════════════════════════════════
// 5. Reset
// ══════════════════════════════════════════════════════════

/// Reset clears every line's contents but keeps the allocation shape.
#[test]
fn reset_clears_contents_keeps_shape() {
    let (mut store, _) = store(Organization::SetAssociative, 2);
    store.write(0, 0, "00000", "000000", "00", WritePolicy::WriteBack, 3);
    store.write(1, 1, "00001", "000110", "00", WritePolicy::WriteBack, 4);

    store.reset();

    assert_eq!(store.num_sets(), 2);
    for index in 0..store.num_sets() {
        for line in store.ways(index) {
            assert!(!line.valid);
            assert_eq!(line.tag, "");
            assert_eq!(line.last_access, 0);
            assert!(!line.dirty);
        }
    }
}

/// Occupancy counts only valid lines.
#[test]
fn occupancy_counts_valid_ways() {
    let (mut store, _) = store(Organization::SetAssociative, 2);
    assert_eq!(store.occupancy(0), 0);
    store.write(0, 0, "00000", "000000", "00", WritePolicy::WriteBack, 0);
    assert_eq!(store.occupancy(0), 1);
    store.invalidate(0, 0, SENTINEL_MISS);
    assert_eq!(store.occupancy(0), 0);
}
