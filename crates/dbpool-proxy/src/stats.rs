//! Data source counters and the transaction duration histogram.
//!
//! Connections only report events through [`PoolCounters`]; the data source
//! decides where they go. [`AtomicPoolCounters`] is the in-process default.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sink for pool-wide statistics.
pub trait PoolCounters: Send + Sync {
    /// A compiled statement was created by the driver.
    fn increment_prepared_statement_count(&self);
    /// A compiled statement was physically closed.
    fn increment_closed_prepared_statement_count(&self);
    fn increment_cached_prepared_statement_hit_count(&self);
    fn increment_cached_prepared_statement_miss_count(&self);
    /// A cached statement was evicted or displaced.
    fn increment_cached_prepared_statement_delete_count(&self);
    fn increment_start_transaction_count(&self);
    fn increment_commit_count(&self);
    fn increment_rollback_count(&self);
    fn record_transaction_millis(&self, millis: u64);
}

/// Bucketed histogram over fixed upper bounds.
///
/// A value lands in the first bucket whose bound is greater than it; values
/// at or above the last bound go to the overflow bucket.
#[derive(Debug)]
pub struct Histogram {
    bounds: Vec<u64>,
    buckets: Vec<AtomicU64>,
}

impl Histogram {
    /// Millisecond bounds used for transaction durations.
    pub const TRANSACTION_BOUNDS: [u64; 7] = [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000];

    pub fn new(bounds: &[u64]) -> Self {
        let mut bounds = bounds.to_vec();
        bounds.sort_unstable();
        bounds.dedup();
        let buckets = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self { bounds, buckets }
    }

    pub fn record(&self, value: u64) {
        let index = self.bounds.partition_point(|&bound| bound <= value);
        self.buckets[index].fetch_add(1, Ordering::Relaxed);
    }

    pub fn bounds(&self) -> &[u64] {
        &self.bounds
    }

    /// Counts per bucket, overflow bucket last.
    pub fn snapshot(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|bucket| bucket.load(Ordering::Relaxed))
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.snapshot().iter().sum()
    }

    pub fn reset(&self) {
        for bucket in &self.buckets {
            bucket.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(&Self::TRANSACTION_BOUNDS)
    }
}

/// Point-in-time copy of [`AtomicPoolCounters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub prepared_statement_count: u64,
    pub closed_prepared_statement_count: u64,
    pub cached_prepared_statement_hit_count: u64,
    pub cached_prepared_statement_miss_count: u64,
    pub cached_prepared_statement_delete_count: u64,
    pub start_transaction_count: u64,
    pub commit_count: u64,
    pub rollback_count: u64,
    pub transaction_histogram: Vec<u64>,
}

/// Lock-free counters with a transaction histogram.
#[derive(Debug, Default)]
pub struct AtomicPoolCounters {
    prepared_statement_count: AtomicU64,
    closed_prepared_statement_count: AtomicU64,
    cached_hit_count: AtomicU64,
    cached_miss_count: AtomicU64,
    cached_delete_count: AtomicU64,
    start_transaction_count: AtomicU64,
    commit_count: AtomicU64,
    rollback_count: AtomicU64,
    transaction_histogram: Histogram,
}

impl AtomicPoolCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn transaction_histogram(&self) -> &Histogram {
        &self.transaction_histogram
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            prepared_statement_count: self.prepared_statement_count.load(Ordering::Relaxed),
            closed_prepared_statement_count: self
                .closed_prepared_statement_count
                .load(Ordering::Relaxed),
            cached_prepared_statement_hit_count: self.cached_hit_count.load(Ordering::Relaxed),
            cached_prepared_statement_miss_count: self.cached_miss_count.load(Ordering::Relaxed),
            cached_prepared_statement_delete_count: self
                .cached_delete_count
                .load(Ordering::Relaxed),
            start_transaction_count: self.start_transaction_count.load(Ordering::Relaxed),
            commit_count: self.commit_count.load(Ordering::Relaxed),
            rollback_count: self.rollback_count.load(Ordering::Relaxed),
            transaction_histogram: self.transaction_histogram.snapshot(),
        }
    }
}

impl PoolCounters for AtomicPoolCounters {
    fn increment_prepared_statement_count(&self) {
        self.prepared_statement_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_closed_prepared_statement_count(&self) {
        self.closed_prepared_statement_count
            .fetch_add(1, Ordering::Relaxed);
    }

    fn increment_cached_prepared_statement_hit_count(&self) {
        self.cached_hit_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_cached_prepared_statement_miss_count(&self) {
        self.cached_miss_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_cached_prepared_statement_delete_count(&self) {
        self.cached_delete_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_start_transaction_count(&self) {
        self.start_transaction_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_commit_count(&self) {
        self.commit_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_rollback_count(&self) {
        self.rollback_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_transaction_millis(&self, millis: u64) {
        self.transaction_histogram.record(millis);
    }
}
