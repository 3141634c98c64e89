//! Access counters and the closed-form performance model.
//!
//! This module tracks aggregate access outcomes and derives the standard
//! teaching metrics from them. It provides:
//! 1. **Counters:** Hits, misses, read/write totals, and miss classification.
//! 2. **Metrics:** Hit/miss rate, AMAT, stall cycles, write-buffer overflow, CPU time.
//! 3. **Reporting:** A formatted statistics dump for the CLI.
//!
//! Metrics are derived, never mutated directly: the Finish phase recomputes
//! them wholesale from the counters after every completed access.

use serde::Serialize;

use crate::config::{SimConfig, WritePolicy};

/// Aggregate access counters.
///
/// The miss classification follows the domain's convention: a cold miss
/// into an empty slot counts as a *read* miss, a miss requiring eviction as
/// a *write* miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Accesses that hit.
    pub hits: u64,
    /// Accesses that missed (cold or eviction).
    pub misses: u64,
    /// Completed cold-miss fills.
    pub total_reads: u64,
    /// Completed eviction refills.
    pub total_writes: u64,
    /// Cold (empty-slot) misses.
    pub read_misses: u64,
    /// Misses requiring eviction.
    pub write_misses: u64,
    /// Monotonic access stamp; bumped on every hit, feeds LRU.
    pub access_counter: u64,
}

impl Counters {
    /// Total completed accesses.
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Cold misses per completed fill; 0 before any fill completes.
    pub fn read_miss_rate(&self) -> f64 {
        if self.total_reads > 0 {
            self.read_misses as f64 / self.total_reads as f64
        } else {
            0.0
        }
    }

    /// Eviction misses per completed refill; 0 before any refill completes.
    pub fn write_miss_rate(&self) -> f64 {
        if self.total_writes > 0 {
            self.write_misses as f64 / self.total_writes as f64
        } else {
            0.0
        }
    }
}

/// Derived performance metrics, recomputed after every completed access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Fraction of accesses that hit.
    pub hit_rate: f64,
    /// Fraction of accesses that missed.
    pub miss_rate: f64,
    /// Average memory access time: hit time + miss rate × miss penalty.
    pub avg_access_time: f64,
    /// Read stall cycles: read miss rate × memory latency.
    pub read_stall_cycles: f64,
    /// Write stall cycles: write miss rate × miss penalty.
    pub write_stall_cycles: f64,
    /// Per-miss write penalty under the active write policy and buffer.
    pub write_miss_penalty: f64,
    /// Write-buffer overflow estimate (0 while the buffer keeps up).
    pub write_buffer_stall: f64,
    /// CPU time: CPI + read stalls + write stalls.
    pub cpu_time: f64,
}

impl PerformanceMetrics {
    /// Computes the full metric set from accumulated counters.
    ///
    /// Pure: neither argument is mutated, and equal inputs always produce
    /// equal outputs. With zero accesses every rate is 0 (not NaN).
    pub fn compute(counters: &Counters, config: &SimConfig) -> Self {
        let total = counters.total_accesses();
        let (hit_rate, miss_rate) = if total > 0 {
            (
                counters.hits as f64 / total as f64,
                counters.misses as f64 / total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let cache = &config.cache;
        let avg_access_time =
            cache.hit_time_cycles as f64 + miss_rate * cache.miss_penalty_cycles as f64;
        let read_stall_cycles = counters.read_miss_rate() * config.memory.latency_cycles as f64;
        let write_stall_cycles =
            counters.write_miss_rate() * cache.miss_penalty_cycles as f64;
        let write_buffer_stall = write_buffer_overflows(counters, config);
        let write_miss_penalty = if cache.write_buffer.enabled {
            write_miss_penalty_with_buffer(write_buffer_stall, config)
        } else {
            write_miss_penalty_unbuffered(config)
        };
        let cpu_time =
            config.cpu.cycles_per_instruction as f64 + read_stall_cycles + write_stall_cycles;

        Self {
            hit_rate,
            miss_rate,
            avg_access_time,
            read_stall_cycles,
            write_stall_cycles,
            write_miss_penalty,
            write_buffer_stall,
            cpu_time,
        }
    }

    /// Prints a formatted statistics report to stdout.
    pub fn print(&self, counters: &Counters) {
        println!("\n==========================================================");
        println!("CACHE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("accesses                 {}", counters.total_accesses());
        println!("hits                     {}", counters.hits);
        println!("misses                   {}", counters.misses);
        println!("  cold (empty slot)      {}", counters.read_misses);
        println!("  eviction (replace)     {}", counters.write_misses);
        println!("----------------------------------------------------------");
        println!("hit_rate                 {:.2}%", self.hit_rate * 100.0);
        println!("miss_rate                {:.2}%", self.miss_rate * 100.0);
        println!("avg_access_time          {:.2} cycles", self.avg_access_time);
        println!("read_stall_cycles        {:.2}", self.read_stall_cycles);
        println!("write_stall_cycles       {:.2}", self.write_stall_cycles);
        println!("write_miss_penalty       {:.2} cycles", self.write_miss_penalty);
        println!("write_buffer_stall       {:.2}", self.write_buffer_stall);
        println!("cpu_time                 {:.2} cycles", self.cpu_time);
        println!("==========================================================");
    }
}

/// Per-miss write penalty without a write buffer.
///
/// Write-back pays the full refill (miss penalty + hit time); write-through
/// pays the bus trip (bus latency + block transfer time).
fn write_miss_penalty_unbuffered(config: &SimConfig) -> f64 {
    let cache = &config.cache;
    let memory = &config.memory;
    match cache.write_policy {
        WritePolicy::WriteBack => (cache.miss_penalty_cycles + cache.hit_time_cycles) as f64,
        WritePolicy::WriteThrough => {
            memory.bus_latency_cycles as f64
                + cache.block_size_bytes as f64 / memory.bandwidth_bytes_per_cycle as f64
        }
    }
}

/// Per-miss write penalty with the buffer absorbing bursts, scaled by how
/// often the buffer overflows.
fn write_miss_penalty_with_buffer(write_stalls: f64, config: &SimConfig) -> f64 {
    let cache = &config.cache;
    let memory = &config.memory;
    let size = cache.write_buffer.size_blocks as f64;
    match cache.write_policy {
        WritePolicy::WriteBack => {
            (write_stalls / size)
                * (memory.bus_latency_cycles as f64
                    + cache.block_size_bytes as f64 / memory.bandwidth_bytes_per_cycle as f64)
        }
        WritePolicy::WriteThrough => {
            (write_stalls / size) * cache.miss_penalty_cycles as f64
        }
    }
}

/// Estimated buffer overflows: eviction misses beyond what the buffer can
/// drain, per buffer capacity. Clamped at zero while the buffer keeps up.
fn write_buffer_overflows(counters: &Counters, config: &SimConfig) -> f64 {
    let buffer = &config.cache.write_buffer;
    let capacity = (buffer.size_blocks * buffer.drain_rate_blocks_per_cycle) as f64;
    let overflow = (counters.write_misses as f64 - capacity) / buffer.size_blocks as f64;
    overflow.max(0.0)
}
