//! Configuration system for the cache simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** Baseline teaching constants (8-bit addresses, 32-byte cache).
//! 2. **Structures:** Hierarchical config for cache, write buffer, memory, and CPU.
//! 3. **Enums:** Cache organization and write policy.
//! 4. **Option tables:** The discrete values a configuration form may offer.
//!
//! Configuration is supplied via JSON (the UI layer serializes its form
//! state) or use `SimConfig::default()` for the CLI. Structural invariants
//! are *not* enforced here; they are checked when a [`CacheGeometry`]
//! (`crate::addr::CacheGeometry`) is derived, so a rejected change never
//! replaces a working configuration.

use serde::{Deserialize, Serialize};

/// Default configuration constants for the simulator.
///
/// These values reproduce the simulator's startup state when not explicitly
/// overridden: a deliberately tiny cache so every structural effect is
/// visible within a handful of accesses.
mod defaults {
    /// Total bits in a memory address.
    pub const ADDRESS_BITS: usize = 8;

    /// Total cache capacity in bytes (8 lines of 4 bytes).
    pub const CACHE_SIZE: usize = 32;

    /// Cache block (line) size in bytes.
    pub const BLOCK_SIZE: usize = 4;

    /// Default associativity (1 way = direct-mapped).
    pub const ASSOCIATIVITY: usize = 1;

    /// Cache hit service time in cycles.
    pub const HIT_TIME: u64 = 1;

    /// Miss penalty in cycles (full fetch from backing memory).
    pub const MISS_PENALTY: u64 = 100;

    /// Write buffer capacity in blocks.
    pub const WRITE_BUFFER_SIZE: usize = 4;

    /// Write buffer drain rate in blocks per cycle.
    pub const WRITE_BUFFER_DRAIN_RATE: usize = 1;

    /// Backing memory latency in cycles.
    pub const MEMORY_LATENCY: u64 = 100;

    /// Memory bandwidth in bytes per cycle.
    pub const MEMORY_BANDWIDTH: u64 = 4;

    /// Bus latency in cycles.
    pub const BUS_LATENCY: u64 = 16;

    /// Base cycles per instruction.
    pub const CPI: u64 = 1;
}

/// Discrete values a configuration form may offer for each parameter.
///
/// The engine accepts any value passing validation; these tables exist so a
/// front end can populate selection widgets without hardcoding them.
pub mod options {
    /// Cache capacities in bytes.
    pub const CACHE_SIZE_BYTES: &[usize] = &[
        8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
    ];
    /// Block sizes in bytes.
    pub const BLOCK_SIZE_BYTES: &[usize] = &[1, 2, 4, 8, 16, 32, 64, 128];
    /// Associativities (number of ways).
    pub const ASSOCIATIVITY: &[usize] = &[1, 2, 4, 8, 16, 32, 64, 128];
    /// Address widths in bits.
    pub const ADDRESS_BITS: &[usize] = &[8, 16, 32, 64];
    /// Memory latencies in cycles.
    pub const MEMORY_LATENCY_CYCLES: &[u64] = &[10, 20, 50, 100, 200, 500, 1000];
    /// Memory bandwidths in bytes per cycle.
    pub const MEMORY_BANDWIDTH_BYTES_PER_CYCLE: &[u64] = &[1, 2, 4, 8, 16, 32, 64, 128];
    /// Bus latencies in cycles.
    pub const BUS_LATENCY_CYCLES: &[u64] = &[1, 2, 4, 8, 16, 32, 64, 128];
    /// Write buffer sizes in blocks.
    pub const WRITE_BUFFER_SIZE_BLOCKS: &[usize] = &[1, 2, 4, 8, 16, 32, 64, 128];
    /// Write buffer drain rates in blocks per cycle.
    pub const WRITE_BUFFER_DRAIN_RATES: &[usize] = &[1, 2, 4, 8, 16, 32, 64, 128];
}

/// Cache organization (placement) schemes.
///
/// Selects how a decomposed address maps onto storage: one candidate line,
/// one candidate set of ways, or the whole cache as a single set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Organization {
    /// Each block maps to exactly one cache line (associativity 1).
    #[default]
    DirectMapped,
    /// Each block maps to one set holding `associativity` ways.
    SetAssociative,
    /// A single set spanning every line; any block may occupy any way.
    FullyAssociative,
}

/// Write policies governing the dirty bit on cache updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WritePolicy {
    /// Writes stay in the cache until eviction; updated lines are dirty.
    #[default]
    WriteBack,
    /// Writes propagate to memory immediately; lines are never dirty.
    WriteThrough,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use cachesim_core::config::SimConfig;
///
/// let config = SimConfig::default();
/// assert_eq!(config.cache.cache_size_bytes, 32);
/// assert_eq!(config.cpu.cycles_per_instruction, 1);
/// ```
///
/// Deserializing from JSON (typical UI usage):
///
/// ```
/// use cachesim_core::config::{SimConfig, WritePolicy};
///
/// let json = r#"{
///     "cache": {
///         "address_bits": 16,
///         "cache_size_bytes": 256,
///         "block_size_bytes": 8,
///         "associativity": 2,
///         "write_policy": "WRITE_THROUGH"
///     },
///     "memory": { "latency_cycles": 50 },
///     "cpu": {}
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.cache.write_policy, WritePolicy::WriteThrough);
/// assert_eq!(config.memory.latency_cycles, 50);
/// assert_eq!(config.memory.bus_latency_cycles, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Cache geometry, timing, and write policy.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Backing memory parameters.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// CPU parameters.
    #[serde(default)]
    pub cpu: CpuConfig,
}

/// Cache geometry, timing, and write-policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Total bits in a memory address.
    #[serde(default = "CacheConfig::default_address_bits")]
    pub address_bits: usize,

    /// Total cache capacity in bytes.
    #[serde(default = "CacheConfig::default_cache_size")]
    pub cache_size_bytes: usize,

    /// Block (line) size in bytes.
    #[serde(default = "CacheConfig::default_block_size")]
    pub block_size_bytes: usize,

    /// Number of ways per set. 1 for direct-mapped; the full line count for
    /// fully-associative. Recomputed by `set_mode`.
    #[serde(default = "CacheConfig::default_associativity")]
    pub associativity: usize,

    /// Write policy applied on every cache update.
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// Hit service time in cycles.
    #[serde(default = "CacheConfig::default_hit_time")]
    pub hit_time_cycles: u64,

    /// Miss penalty in cycles.
    #[serde(default = "CacheConfig::default_miss_penalty")]
    pub miss_penalty_cycles: u64,

    /// Optional write buffer between cache and memory.
    #[serde(default)]
    pub write_buffer: WriteBufferConfig,
}

impl CacheConfig {
    /// Returns the default address width in bits.
    fn default_address_bits() -> usize {
        defaults::ADDRESS_BITS
    }

    /// Returns the default cache capacity in bytes.
    fn default_cache_size() -> usize {
        defaults::CACHE_SIZE
    }

    /// Returns the default block size in bytes.
    fn default_block_size() -> usize {
        defaults::BLOCK_SIZE
    }

    /// Returns the default associativity.
    fn default_associativity() -> usize {
        defaults::ASSOCIATIVITY
    }

    /// Returns the default hit time in cycles.
    fn default_hit_time() -> u64 {
        defaults::HIT_TIME
    }

    /// Returns the default miss penalty in cycles.
    fn default_miss_penalty() -> u64 {
        defaults::MISS_PENALTY
    }

    /// Number of cache lines this configuration describes.
    ///
    /// Meaningful only once validation has confirmed the division is exact.
    pub fn line_count(&self) -> usize {
        self.cache_size_bytes / self.block_size_bytes
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            address_bits: defaults::ADDRESS_BITS,
            cache_size_bytes: defaults::CACHE_SIZE,
            block_size_bytes: defaults::BLOCK_SIZE,
            associativity: defaults::ASSOCIATIVITY,
            write_policy: WritePolicy::default(),
            hit_time_cycles: defaults::HIT_TIME,
            miss_penalty_cycles: defaults::MISS_PENALTY,
            write_buffer: WriteBufferConfig::default(),
        }
    }
}

/// Write buffer configuration.
///
/// When enabled, write stalls are amortized across the buffer instead of
/// paying the full write-miss penalty per access; see
/// [`PerformanceMetrics`](crate::stats::PerformanceMetrics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBufferConfig {
    /// Whether the buffer participates in the performance model.
    #[serde(default)]
    pub enabled: bool,

    /// Buffer capacity in blocks.
    #[serde(default = "WriteBufferConfig::default_size")]
    pub size_blocks: usize,

    /// Drain rate in blocks per cycle.
    #[serde(default = "WriteBufferConfig::default_drain_rate")]
    pub drain_rate_blocks_per_cycle: usize,
}

impl WriteBufferConfig {
    /// Returns the default buffer capacity in blocks.
    fn default_size() -> usize {
        defaults::WRITE_BUFFER_SIZE
    }

    /// Returns the default drain rate in blocks per cycle.
    fn default_drain_rate() -> usize {
        defaults::WRITE_BUFFER_DRAIN_RATE
    }
}

impl Default for WriteBufferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size_blocks: defaults::WRITE_BUFFER_SIZE,
            drain_rate_blocks_per_cycle: defaults::WRITE_BUFFER_DRAIN_RATE,
        }
    }
}

/// Backing memory configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Access latency in cycles.
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency_cycles: u64,

    /// Transfer bandwidth in bytes per cycle.
    #[serde(default = "MemoryConfig::default_bandwidth")]
    pub bandwidth_bytes_per_cycle: u64,

    /// Bus latency in cycles.
    #[serde(default = "MemoryConfig::default_bus_latency")]
    pub bus_latency_cycles: u64,
}

impl MemoryConfig {
    /// Returns the default memory latency in cycles.
    fn default_latency() -> u64 {
        defaults::MEMORY_LATENCY
    }

    /// Returns the default bandwidth in bytes per cycle.
    fn default_bandwidth() -> u64 {
        defaults::MEMORY_BANDWIDTH
    }

    /// Returns the default bus latency in cycles.
    fn default_bus_latency() -> u64 {
        defaults::BUS_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            latency_cycles: defaults::MEMORY_LATENCY,
            bandwidth_bytes_per_cycle: defaults::MEMORY_BANDWIDTH,
            bus_latency_cycles: defaults::BUS_LATENCY,
        }
    }
}

/// CPU configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuConfig {
    /// Base cycles per instruction (excluding memory stalls).
    #[serde(default = "CpuConfig::default_cpi")]
    pub cycles_per_instruction: u64,
}

impl CpuConfig {
    /// Returns the default CPI.
    fn default_cpi() -> u64 {
        defaults::CPI
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            cycles_per_instruction: defaults::CPI,
        }
    }
}
