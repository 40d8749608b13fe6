//! Logging setup and optional metrics export

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

#[cfg(feature = "metrics")]
pub use metrics_counters::MetricsPoolCounters;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}

#[cfg(feature = "metrics")]
mod metrics_counters {
    use metrics::{counter, describe_counter, describe_histogram, histogram};

    use crate::stats::{AtomicPoolCounters, CounterSnapshot, PoolCounters};

    const METRIC_PREPARED: &str = "dbpool_proxy_prepared_statements_total";
    const METRIC_PREPARED_CLOSED: &str = "dbpool_proxy_prepared_statements_closed_total";
    const METRIC_CACHE_HITS: &str = "dbpool_proxy_statement_cache_hits_total";
    const METRIC_CACHE_MISSES: &str = "dbpool_proxy_statement_cache_misses_total";
    const METRIC_CACHE_EVICTIONS: &str = "dbpool_proxy_statement_cache_evictions_total";
    const METRIC_TX_STARTED: &str = "dbpool_proxy_transactions_started_total";
    const METRIC_COMMITS: &str = "dbpool_proxy_commits_total";
    const METRIC_ROLLBACKS: &str = "dbpool_proxy_rollbacks_total";
    const METRIC_TX_DURATION: &str = "dbpool_proxy_transaction_duration_seconds";

    /// [`AtomicPoolCounters`] that also reports through the `metrics` facade.
    #[derive(Debug, Default)]
    pub struct MetricsPoolCounters {
        inner: AtomicPoolCounters,
    }

    impl MetricsPoolCounters {
        pub fn new() -> Self {
            describe_counter!(METRIC_PREPARED, "Compiled statements created by the driver");
            describe_counter!(METRIC_PREPARED_CLOSED, "Compiled statements physically closed");
            describe_counter!(METRIC_CACHE_HITS, "Statement cache hits");
            describe_counter!(METRIC_CACHE_MISSES, "Statement cache misses");
            describe_counter!(METRIC_CACHE_EVICTIONS, "Statements evicted from the cache");
            describe_counter!(METRIC_TX_STARTED, "Transactions started");
            describe_counter!(METRIC_COMMITS, "Commits issued");
            describe_counter!(METRIC_ROLLBACKS, "Rollbacks issued");
            describe_histogram!(METRIC_TX_DURATION, "Transaction duration in seconds");
            Self::default()
        }

        pub const fn inner(&self) -> &AtomicPoolCounters {
            &self.inner
        }

        pub fn snapshot(&self) -> CounterSnapshot {
            self.inner.snapshot()
        }
    }

    impl PoolCounters for MetricsPoolCounters {
        fn increment_prepared_statement_count(&self) {
            self.inner.increment_prepared_statement_count();
            counter!(METRIC_PREPARED).increment(1);
        }

        fn increment_closed_prepared_statement_count(&self) {
            self.inner.increment_closed_prepared_statement_count();
            counter!(METRIC_PREPARED_CLOSED).increment(1);
        }

        fn increment_cached_prepared_statement_hit_count(&self) {
            self.inner.increment_cached_prepared_statement_hit_count();
            counter!(METRIC_CACHE_HITS).increment(1);
        }

        fn increment_cached_prepared_statement_miss_count(&self) {
            self.inner.increment_cached_prepared_statement_miss_count();
            counter!(METRIC_CACHE_MISSES).increment(1);
        }

        fn increment_cached_prepared_statement_delete_count(&self) {
            self.inner.increment_cached_prepared_statement_delete_count();
            counter!(METRIC_CACHE_EVICTIONS).increment(1);
        }

        fn increment_start_transaction_count(&self) {
            self.inner.increment_start_transaction_count();
            counter!(METRIC_TX_STARTED).increment(1);
        }

        fn increment_commit_count(&self) {
            self.inner.increment_commit_count();
            counter!(METRIC_COMMITS).increment(1);
        }

        fn increment_rollback_count(&self) {
            self.inner.increment_rollback_count();
            counter!(METRIC_ROLLBACKS).increment(1);
        }

        #[allow(clippy::cast_precision_loss)]
        fn record_transaction_millis(&self, millis: u64) {
            self.inner.record_transaction_millis(millis);
            histogram!(METRIC_TX_DURATION).record(millis as f64 / 1000.0);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_metrics_counters_forward_to_inner() {
            let counters = MetricsPoolCounters::new();
            counters.increment_prepared_statement_count();
            counters.increment_cached_prepared_statement_hit_count();
            counters.record_transaction_millis(5);

            let snapshot = counters.snapshot();
            assert_eq!(snapshot.prepared_statement_count, 1);
            assert_eq!(snapshot.cached_prepared_statement_hit_count, 1);
            assert_eq!(counters.inner().transaction_histogram().total(), 1);
        }
    }
}

