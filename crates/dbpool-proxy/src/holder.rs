//! Pool slot owning one physical connection.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config::DataSourceConfig;
use crate::driver::{Holdability, RawConnection, TransactionIsolation};
use crate::error::DriverResult;
use crate::event::{ConnectionEventListener, Listeners, StatementEventListener};
use crate::statement_cache::StatementPool;
use crate::stats::PoolCounters;

static NEXT_HOLDER_ID: AtomicU64 = AtomicU64::new(1);

/// Session state last applied to the physical connection.
///
/// Setters on a pooled connection keep this in sync so the pool can restore
/// defaults before handing the connection to the next borrower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnderlyingState {
    pub auto_commit: bool,
    pub read_only: bool,
    pub transaction_isolation: Option<TransactionIsolation>,
    pub holdability: Option<Holdability>,
}

impl Default for UnderlyingState {
    fn default() -> Self {
        Self {
            auto_commit: true,
            read_only: false,
            transaction_isolation: None,
            holdability: None,
        }
    }
}

/// One physical connection and everything cached alongside it.
///
/// Outlives the logical [`PooledConnection`](crate::PooledConnection)s that
/// borrow it: the data source receives it back through `recycle`.
pub struct ConnectionHolder {
    id: u64,
    connection: Box<dyn RawConnection>,
    statement_pool: StatementPool,
    pool_prepared_statements: bool,
    connection_listeners: Listeners<dyn ConnectionEventListener>,
    statement_listeners: Listeners<dyn StatementEventListener>,
    open_statements: HashSet<u64>,
    underlying: UnderlyingState,
    use_count: u64,
    connected_at: Instant,
}

impl fmt::Debug for ConnectionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHolder")
            .field("id", &self.id)
            .field("statement_pool", &self.statement_pool)
            .field("pool_prepared_statements", &self.pool_prepared_statements)
            .field("open_statements", &self.open_statements.len())
            .field("connection_listeners", &self.connection_listeners.len())
            .field("statement_listeners", &self.statement_listeners.len())
            .field("underlying", &self.underlying)
            .field("use_count", &self.use_count)
            .finish_non_exhaustive()
    }
}

impl ConnectionHolder {
    pub fn new(connection: Box<dyn RawConnection>, config: &DataSourceConfig) -> Self {
        Self {
            id: NEXT_HOLDER_ID.fetch_add(1, Ordering::Relaxed),
            connection,
            statement_pool: StatementPool::new(config.max_pool_prepared_statement_per_connection()),
            pool_prepared_statements: config.pool_prepared_statements(),
            connection_listeners: Listeners::new(),
            statement_listeners: Listeners::new(),
            open_statements: HashSet::new(),
            underlying: UnderlyingState::default(),
            use_count: 0,
            connected_at: Instant::now(),
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn connection(&self) -> &dyn RawConnection {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> &mut dyn RawConnection {
        self.connection.as_mut()
    }

    pub const fn statement_pool(&self) -> &StatementPool {
        &self.statement_pool
    }

    pub const fn statement_pool_mut(&mut self) -> &mut StatementPool {
        &mut self.statement_pool
    }

    pub const fn is_pool_prepared_statements(&self) -> bool {
        self.pool_prepared_statements
    }

    /// Turn statement pooling on or off.
    ///
    /// Turning it off closes every cached statement and returns how many
    /// were closed.
    pub fn set_pool_prepared_statements(
        &mut self,
        enabled: bool,
        counters: &dyn PoolCounters,
    ) -> usize {
        self.pool_prepared_statements = enabled;
        if enabled {
            return 0;
        }

        let closed = self.close_cached();
        for _ in 0..closed {
            counters.increment_cached_prepared_statement_delete_count();
            counters.increment_closed_prepared_statement_count();
        }
        closed
    }

    pub const fn underlying(&self) -> &UnderlyingState {
        &self.underlying
    }

    pub const fn underlying_mut(&mut self) -> &mut UnderlyingState {
        &mut self.underlying
    }

    /// Number of times this slot has been lent out.
    pub const fn use_count(&self) -> u64 {
        self.use_count
    }

    pub(crate) const fn increment_use_count(&mut self) {
        self.use_count += 1;
    }

    pub const fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub(crate) fn add_trace(&mut self, statement_id: u64) {
        self.open_statements.insert(statement_id);
    }

    pub(crate) fn remove_trace(&mut self, statement_id: u64) {
        self.open_statements.remove(&statement_id);
    }

    /// Ids of statements handed out and not yet closed.
    pub const fn open_statements(&self) -> &HashSet<u64> {
        &self.open_statements
    }

    pub(crate) fn add_connection_listener(&mut self, listener: Arc<dyn ConnectionEventListener>) {
        self.connection_listeners.add(listener);
    }

    pub(crate) fn remove_connection_listener(
        &mut self,
        listener: &Arc<dyn ConnectionEventListener>,
    ) -> bool {
        self.connection_listeners.remove(listener)
    }

    pub(crate) fn connection_listeners(&self) -> Vec<Arc<dyn ConnectionEventListener>> {
        self.connection_listeners.snapshot()
    }

    pub(crate) fn add_statement_listener(&mut self, listener: Arc<dyn StatementEventListener>) {
        self.statement_listeners.add(listener);
    }

    pub(crate) fn remove_statement_listener(
        &mut self,
        listener: &Arc<dyn StatementEventListener>,
    ) -> bool {
        self.statement_listeners.remove(listener)
    }

    pub(crate) fn statement_listeners(&self) -> Vec<Arc<dyn StatementEventListener>> {
        self.statement_listeners.snapshot()
    }

    /// Reset per-borrow state before the slot is lent out again.
    ///
    /// Listeners and traces belong to one borrow; cached statements survive.
    pub fn reset(&mut self) {
        self.connection_listeners = Listeners::new();
        self.statement_listeners = Listeners::new();
        self.open_statements.clear();
    }

    /// Close every cached statement and the physical connection.
    ///
    /// Returns the number of cached statements closed.
    pub fn close(mut self) -> DriverResult<usize> {
        let count = self.close_cached();
        self.connection.close()?;
        Ok(count)
    }

    fn close_cached(&mut self) -> usize {
        let cached = self.statement_pool.drain();
        let count = cached.len();
        for mut holder in cached {
            if let Err(e) = holder.close() {
                tracing::warn!(
                    connection.id = self.id,
                    sql = holder.key().sql(),
                    error = %e,
                    "failed to close cached statement"
                );
            }
        }
        count
    }
}
