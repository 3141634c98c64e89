//! Performance Model Unit Tests.
//!
//! Worked examples against the closed-form metric formulas, covering both
//! write policies with and without a write buffer.

use pretty_assertions::assert_eq;

use cachesim_core::config::{SimConfig, WritePolicy};
use cachesim_core::{Counters, PerformanceMetrics};

// ══════════════════════════════════════════════════════════
// 1. Rates
// ══════════════════════════════════════════════════════════

/// With zero accesses every rate is exactly zero, never NaN.
#[test]
fn zero_accesses_yield_zero_rates() {
    let metrics = PerformanceMetrics::compute(&Counters::default(), &SimConfig::default());

    assert_eq!(metrics.hit_rate, 0.0);
    assert_eq!(metrics.miss_rate, 0.0);
    assert_eq!(metrics.read_stall_cycles, 0.0);
    assert_eq!(metrics.write_stall_cycles, 0.0);
    assert_eq!(metrics.write_buffer_stall, 0.0);
    // AMAT and CPU time still carry the configured base costs.
    assert_eq!(metrics.avg_access_time, 1.0);
    assert_eq!(metrics.cpu_time, 1.0);
}

/// Hit rate and miss rate always sum to one once anything has happened.
#[test]
fn rates_are_complementary() {
    let counters = Counters {
        hits: 7,
        misses: 3,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &SimConfig::default());
    assert_eq!(metrics.hit_rate + metrics.miss_rate, 1.0);
    assert_eq!(metrics.hit_rate, 0.7);
}

// ══════════════════════════════════════════════════════════
// 2. Worked example: default config
// ══════════════════════════════════════════════════════════

/// 3 hits, 1 cold miss under the defaults (hit time 1, penalty 100,
/// memory latency 100, CPI 1):
///
/// - AMAT = 1 + 0.25 × 100 = 26
/// - read stall = (1/1) × 100 = 100
/// - CPU time = 1 + 100 + 0 = 101
#[test]
fn worked_example_default_config() {
    let counters = Counters {
        hits: 3,
        misses: 1,
        total_reads: 1,
        read_misses: 1,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &SimConfig::default());

    assert_eq!(metrics.hit_rate, 0.75);
    assert_eq!(metrics.miss_rate, 0.25);
    assert_eq!(metrics.avg_access_time, 26.0);
    assert_eq!(metrics.read_stall_cycles, 100.0);
    assert_eq!(metrics.write_stall_cycles, 0.0);
    assert_eq!(metrics.cpu_time, 101.0);
}

/// Recomputation is pure: equal inputs give equal outputs.
#[test]
fn compute_is_deterministic() {
    let counters = Counters {
        hits: 5,
        misses: 2,
        total_reads: 1,
        total_writes: 1,
        read_misses: 1,
        write_misses: 1,
        access_counter: 5,
    };
    let config = SimConfig::default();
    assert_eq!(
        PerformanceMetrics::compute(&counters, &config),
        PerformanceMetrics::compute(&counters, &config)
    );
}

// ══════════════════════════════════════════════════════════
// 3. Write-miss penalty, unbuffered
// ══════════════════════════════════════════════════════════

/// Write-back without a buffer pays the full refill: penalty + hit time.
#[test]
fn unbuffered_write_back_penalty() {
    let metrics = PerformanceMetrics::compute(&Counters::default(), &SimConfig::default());
    assert_eq!(metrics.write_miss_penalty, 101.0);
}

/// Write-through without a buffer pays the bus trip: bus latency plus
/// block size over bandwidth (16 + 4/4 = 17 under the defaults).
#[test]
fn unbuffered_write_through_penalty() {
    let mut config = SimConfig::default();
    config.cache.write_policy = WritePolicy::WriteThrough;
    let metrics = PerformanceMetrics::compute(&Counters::default(), &config);
    assert_eq!(metrics.write_miss_penalty, 17.0);
}

// ══════════════════════════════════════════════════════════
// 4. Write buffer
// ══════════════════════════════════════════════════════════

/// Buffer of 4 blocks draining 1 per cycle absorbs 4 eviction misses;
/// 8 misses overflow it once: (8 − 4) / 4 = 1.
#[test]
fn buffer_overflow_estimate() {
    let mut config = SimConfig::default();
    config.cache.write_buffer.enabled = true;

    let counters = Counters {
        write_misses: 8,
        total_writes: 8,
        misses: 8,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &config);
    assert_eq!(metrics.write_buffer_stall, 1.0);
}

/// While the buffer keeps up the overflow estimate clamps at zero, and
/// the buffered write-miss penalty collapses with it.
#[test]
fn buffer_keeping_up_means_no_stall() {
    let mut config = SimConfig::default();
    config.cache.write_buffer.enabled = true;

    let counters = Counters {
        write_misses: 3,
        total_writes: 3,
        misses: 3,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &config);
    assert_eq!(metrics.write_buffer_stall, 0.0);
    assert_eq!(metrics.write_miss_penalty, 0.0);
}

/// Buffered write-back amortizes the bus trip over the buffer:
/// (overflow / size) × (bus + block/bandwidth) = (1/4) × 17 = 4.25.
#[test]
fn buffered_write_back_penalty() {
    let mut config = SimConfig::default();
    config.cache.write_buffer.enabled = true;

    let counters = Counters {
        write_misses: 8,
        total_writes: 8,
        misses: 8,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &config);
    assert_eq!(metrics.write_miss_penalty, 4.25);
}

/// Buffered write-through amortizes the miss penalty instead:
/// (overflow / size) × penalty = (1/4) × 100 = 25.
#[test]
fn buffered_write_through_penalty() {
    let mut config = SimConfig::default();
    config.cache.write_policy = WritePolicy::WriteThrough;
    config.cache.write_buffer.enabled = true;

    let counters = Counters {
        write_misses: 8,
        total_writes: 8,
        misses: 8,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &config);
    assert_eq!(metrics.write_miss_penalty, 25.0);
}

// ══════════════════════════════════════════════════════════
// 5. Counters
// ══════════════════════════════════════════════════════════

/// Miss-classification rates guard their zero denominators.
#[test]
fn miss_rates_guard_zero_denominators() {
    let counters = Counters::default();
    assert_eq!(counters.read_miss_rate(), 0.0);
    assert_eq!(counters.write_miss_rate(), 0.0);

    let counters = Counters {
        total_reads: 4,
        read_misses: 4,
        total_writes: 2,
        write_misses: 1,
        ..Counters::default()
    };
    assert_eq!(counters.read_miss_rate(), 1.0);
    assert_eq!(counters.write_miss_rate(), 0.5);
}

/// Eviction-miss stalls feed write stall cycles.
#[test]
fn write_stall_cycles_from_eviction_rate() {
    let counters = Counters {
        hits: 0,
        misses: 4,
        total_writes: 4,
        write_misses: 2,
        ..Counters::default()
    };
    let metrics = PerformanceMetrics::compute(&counters, &SimConfig::default());
    // (2/4) × 100-cycle penalty.
    assert_eq!(metrics.write_stall_cycles, 50.0);
}
