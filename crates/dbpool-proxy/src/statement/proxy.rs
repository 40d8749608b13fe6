//! The statement state every filter sees.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::connection::ConnectionShared;
use crate::datasource::DataSource;
use crate::driver::{RawCallableStatement, RawPreparedStatement, RawStatement};
use crate::error::{Error, Result};
use crate::statement_cache::{PreparedStatementHolder, StatementKey};

static NEXT_STATEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Separator used by [`StatementProxy::batch_sql`].
pub const BATCH_SQL_SEPARATOR: &str = "\n;\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Open,
    /// Compiled handle went back to the connection's statement cache.
    SoftClosed,
    /// Raw handle was physically closed.
    Destroyed,
}

enum RawHandle {
    Plain(Box<dyn RawStatement>),
    Cached(PreparedStatementHolder),
    Released,
}

/// Raw handle plus the bookkeeping the pool keeps per statement.
///
/// Filters receive this for every operation. It only holds a weak reference
/// to its connection, so it never keeps a closed connection alive.
pub struct StatementProxy {
    id: u64,
    connection_id: u64,
    connection: Weak<ConnectionShared>,
    data_source: Arc<dyn DataSource>,
    handle: RawHandle,
    batch_sql_list: Vec<String>,
    last_execute_sql: Option<String>,
    fetch_row_peak: Arc<AtomicU64>,
    state: StatementState,
}

impl fmt::Debug for StatementProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementProxy")
            .field("id", &self.id)
            .field("connection_id", &self.connection_id)
            .field("sql", &self.sql())
            .field("state", &self.state)
            .field("batch", &self.batch_sql_list.len())
            .field("last_execute_sql", &self.last_execute_sql)
            .finish_non_exhaustive()
    }
}

impl StatementProxy {
    fn with_handle(shared: &Arc<ConnectionShared>, handle: RawHandle) -> Self {
        Self {
            id: NEXT_STATEMENT_ID.fetch_add(1, Ordering::Relaxed),
            connection_id: shared.id(),
            connection: Arc::downgrade(shared),
            data_source: Arc::clone(shared.data_source()),
            handle,
            batch_sql_list: Vec::new(),
            last_execute_sql: None,
            fetch_row_peak: Arc::new(AtomicU64::new(0)),
            state: StatementState::Open,
        }
    }

    pub(crate) fn plain(shared: &Arc<ConnectionShared>, raw: Box<dyn RawStatement>) -> Self {
        Self::with_handle(shared, RawHandle::Plain(raw))
    }

    pub(crate) fn cached(shared: &Arc<ConnectionShared>, entry: PreparedStatementHolder) -> Self {
        Self::with_handle(shared, RawHandle::Cached(entry))
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn connection_id(&self) -> u64 {
        self.connection_id
    }

    pub const fn state(&self) -> StatementState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == StatementState::Open
    }

    pub const fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    /// Cache key of a prepared or callable statement.
    pub const fn key(&self) -> Option<&StatementKey> {
        match &self.handle {
            RawHandle::Cached(entry) => Some(entry.key()),
            _ => None,
        }
    }

    /// SQL a prepared or callable statement was compiled from.
    pub fn sql(&self) -> Option<&str> {
        self.key().map(StatementKey::sql)
    }

    /// The cache entry backing this statement, while it is open.
    pub const fn cache_entry(&self) -> Option<&PreparedStatementHolder> {
        match &self.handle {
            RawHandle::Cached(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn last_execute_sql(&self) -> Option<&str> {
        self.last_execute_sql.as_deref()
    }

    pub(crate) fn set_last_execute_sql(&mut self, sql: &str) {
        self.last_execute_sql = Some(sql.to_string());
    }

    pub fn batch_sql_list(&self) -> &[String] {
        &self.batch_sql_list
    }

    /// Batched SQL joined with `"\n;\n"`.
    pub fn batch_sql(&self) -> String {
        self.batch_sql_list.join(BATCH_SQL_SEPARATOR)
    }

    pub(crate) fn push_batch_sql(&mut self, sql: &str) {
        self.batch_sql_list.push(sql.to_string());
    }

    pub(crate) fn clear_batch_sql(&mut self) {
        self.batch_sql_list.clear();
    }

    /// Most rows read from a single result set of this statement.
    pub fn fetch_row_peak(&self) -> u64 {
        self.fetch_row_peak.load(Ordering::Relaxed)
    }

    pub(crate) fn fetch_row_peak_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.fetch_row_peak)
    }

    pub(crate) fn connection(&self) -> Option<Arc<ConnectionShared>> {
        self.connection.upgrade()
    }

    pub fn raw_statement(&self) -> Result<&dyn RawStatement> {
        match &self.handle {
            RawHandle::Plain(raw) => Ok(raw.as_ref()),
            RawHandle::Cached(entry) => Ok(entry.statement().as_statement()),
            RawHandle::Released => Err(Error::StatementClosed),
        }
    }

    pub fn raw_statement_mut(&mut self) -> Result<&mut dyn RawStatement> {
        match &mut self.handle {
            RawHandle::Plain(raw) => Ok(raw.as_mut()),
            RawHandle::Cached(entry) => Ok(entry.statement_mut().as_statement_mut()),
            RawHandle::Released => Err(Error::StatementClosed),
        }
    }

    pub fn raw_prepared_mut(&mut self) -> Result<&mut dyn RawPreparedStatement> {
        match &mut self.handle {
            RawHandle::Cached(entry) => Ok(entry.statement_mut().as_prepared_mut()),
            RawHandle::Plain(_) => Err(Error::illegal_state("not a prepared statement")),
            RawHandle::Released => Err(Error::StatementClosed),
        }
    }

    pub fn raw_callable_mut(&mut self) -> Result<&mut dyn RawCallableStatement> {
        match &mut self.handle {
            RawHandle::Cached(entry) => entry
                .statement_mut()
                .as_callable_mut()
                .ok_or_else(|| Error::illegal_state("not a callable statement")),
            RawHandle::Plain(_) => Err(Error::illegal_state("not a callable statement")),
            RawHandle::Released => Err(Error::StatementClosed),
        }
    }

    /// Give up the raw handle.
    ///
    /// A compiled statement goes back to the connection's cache when the
    /// connection is still attached and pools statements; anything else is
    /// closed physically. Releasing twice is a no-op.
    pub(crate) fn release(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.handle, RawHandle::Released) {
            RawHandle::Released => Ok(()),
            RawHandle::Plain(mut raw) => {
                self.state = StatementState::Destroyed;
                if let Some(conn) = self.connection() {
                    conn.remove_trace(self.id);
                }
                raw.close().map_err(Error::from)
            }
            RawHandle::Cached(mut entry) => {
                entry.record_fetch_row_peak(self.fetch_row_peak());
                let returned = match self.connection() {
                    Some(conn) => conn.return_to_cache(self.id, entry),
                    None => Err(entry),
                };
                match returned {
                    Ok(()) => {
                        self.state = StatementState::SoftClosed;
                        Ok(())
                    }
                    Err(entry) => self.destroy(entry),
                }
            }
        }
    }

    fn destroy(&mut self, mut entry: PreparedStatementHolder) -> Result<()> {
        self.state = StatementState::Destroyed;
        let result = entry.close();
        self.data_source
            .counters()
            .increment_closed_prepared_statement_count();
        tracing::debug!(
            connection.id = self.connection_id,
            statement.id = self.id,
            "prepared statement closed"
        );
        result.map_err(Error::from)
    }
}
