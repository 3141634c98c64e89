//! Cache replacement policies.
//!
//! Decides, on a miss with no free way, which resident line to evict.

/// Least Recently Used replacement policy.
pub mod lru;

pub use lru::LruPolicy;

use crate::cache::CacheLine;

/// Trait for cache replacement policies.
///
/// A policy inspects the ways of a full set and names the victim. It holds
/// no state of its own; recency lives on the lines as `last_access`.
pub trait ReplacementPolicy: Send + Sync {
    /// Selects a victim way to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `ways` - The set's lines in way order. All are valid when called.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn select_victim(&self, ways: &[CacheLine]) -> usize;
}
