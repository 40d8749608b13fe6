//! Statements handed out by a [`PooledConnection`](crate::PooledConnection).
//!
//! Every call goes through a fresh [`FilterChain`] built from the data
//! source's filters; the raw driver handle is only reached at the end of the
//! chain. Prepared and callable statements are borrowed from the
//! connection's statement cache and go back to it on close.

mod kind;
mod proxy;
mod result_set;

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub use kind::{Callable, CallableKind, Plain, Prepared, PreparedKind, StatementKind};
pub use proxy::{BATCH_SQL_SEPARATOR, StatementProxy, StatementState};
pub use result_set::PooledResultSet;

use crate::connection::ConnectionShared;
use crate::driver::{
    AutoGeneratedKeys, ColumnDescription, Concurrency, FetchDirection, Holdability, MoreResults,
    RawResultSet, ResultSetType, SqlType, Value, Warning,
};
use crate::error::{Error, Result};
use crate::filter::FilterChain;

/// A compiled statement borrowed from the statement cache.
pub type PooledPreparedStatement = PooledStatement<Prepared>;

/// A compiled stored procedure call borrowed from the statement cache.
pub type PooledCallableStatement = PooledStatement<Callable>;

/// Statement handle bound to a pooled connection.
///
/// Dropping an open statement closes it.
pub struct PooledStatement<K: StatementKind = Plain> {
    proxy: StatementProxy,
    _kind: PhantomData<K>,
}

impl<K: StatementKind> fmt::Debug for PooledStatement<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledStatement")
            .field("kind", &K::NAME)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl<K: StatementKind> PooledStatement<K> {
    pub(crate) const fn new(proxy: StatementProxy) -> Self {
        Self {
            proxy,
            _kind: PhantomData,
        }
    }

    pub const fn id(&self) -> u64 {
        self.proxy.id()
    }

    /// Id of the connection this statement was created from.
    pub const fn connection_id(&self) -> u64 {
        self.proxy.connection_id()
    }

    pub const fn state(&self) -> StatementState {
        self.proxy.state()
    }

    /// The state shared with filters.
    pub const fn proxy(&self) -> &StatementProxy {
        &self.proxy
    }

    pub fn batch_sql_list(&self) -> &[String] {
        self.proxy.batch_sql_list()
    }

    pub fn batch_sql(&self) -> String {
        self.proxy.batch_sql()
    }

    pub fn last_execute_sql(&self) -> Option<&str> {
        self.proxy.last_execute_sql()
    }

    pub fn fetch_row_peak(&self) -> u64 {
        self.proxy.fetch_row_peak()
    }

    fn live(&self) -> Result<Arc<ConnectionShared>> {
        if !self.proxy.is_open() {
            return Err(Error::StatementClosed);
        }
        let conn = self.proxy.connection().ok_or(Error::ConnectionClosed)?;
        conn.check_state()?;
        Ok(conn)
    }

    /// Run `op` through the filter chain with liveness checks and fault routing.
    fn dispatch<T>(
        &mut self,
        op: impl FnOnce(&mut FilterChain<'_>, &mut StatementProxy) -> Result<T>,
    ) -> Result<T> {
        let conn = self.live()?;
        self.run(&conn, op)
    }

    /// Like [`dispatch`](Self::dispatch) for a single-statement execute:
    /// `sql` becomes the last executed SQL and is recorded on the
    /// connection's transaction.
    fn dispatch_execute<T>(
        &mut self,
        sql: &str,
        op: impl FnOnce(&mut FilterChain<'_>, &mut StatementProxy) -> Result<T>,
    ) -> Result<T> {
        let conn = self.live()?;
        self.proxy.set_last_execute_sql(sql);
        conn.transaction_record(sql)?;
        self.run(&conn, op)
    }

    fn run<T>(
        &mut self,
        conn: &ConnectionShared,
        op: impl FnOnce(&mut FilterChain<'_>, &mut StatementProxy) -> Result<T>,
    ) -> Result<T> {
        let data_source = Arc::clone(self.proxy.data_source());
        let mut chain = FilterChain::new(data_source.filters());
        op(&mut chain, &mut self.proxy).map_err(|e| conn.handle_exception(e))
    }

    fn wrap(&self, raw: Box<dyn RawResultSet>) -> PooledResultSet {
        PooledResultSet::new(raw, self.proxy.fetch_row_peak_handle())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Release the statement.
    ///
    /// A compiled statement goes back to the connection's cache while the
    /// connection is attached and pools statements; otherwise the raw handle
    /// is closed. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if !self.proxy.is_open() {
            return Ok(());
        }

        let data_source = Arc::clone(self.proxy.data_source());
        let mut chain = FilterChain::new(data_source.filters());
        let result = chain.statement_close(&mut self.proxy);

        match (result, self.proxy.connection()) {
            (Err(e), Some(conn)) => Err(conn.handle_exception(e)),
            (result, _) => result,
        }
    }

    pub fn is_closed(&mut self) -> Result<bool> {
        if !self.proxy.is_open() {
            return Ok(true);
        }
        self.dispatch(|chain, stmt| chain.statement_is_closed(stmt))
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_cancel(stmt))
    }

    pub fn close_on_completion(&mut self) -> Result<()> {
        Err(Error::NotSupported("close_on_completion"))
    }

    pub fn is_close_on_completion(&self) -> Result<bool> {
        Err(Error::NotSupported("is_close_on_completion"))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════════

    pub fn execute(&mut self, sql: &str) -> Result<bool> {
        self.dispatch_execute(sql, |chain, stmt| chain.statement_execute(stmt, sql))
    }

    pub fn execute_with_generated_keys(&mut self, sql: &str, keys: AutoGeneratedKeys) -> Result<bool> {
        self.dispatch_execute(sql, |chain, stmt| {
            chain.statement_execute_with_generated_keys(stmt, sql, keys)
        })
    }

    pub fn execute_with_column_indexes(&mut self, sql: &str, columns: &[u32]) -> Result<bool> {
        self.dispatch_execute(sql, |chain, stmt| {
            chain.statement_execute_with_column_indexes(stmt, sql, columns)
        })
    }

    pub fn execute_with_column_names(&mut self, sql: &str, columns: &[&str]) -> Result<bool> {
        self.dispatch_execute(sql, |chain, stmt| {
            chain.statement_execute_with_column_names(stmt, sql, columns)
        })
    }

    pub fn execute_query(&mut self, sql: &str) -> Result<PooledResultSet> {
        let raw = self.dispatch_execute(sql, |chain, stmt| chain.statement_execute_query(stmt, sql))?;
        Ok(self.wrap(raw))
    }

    pub fn execute_update(&mut self, sql: &str) -> Result<u64> {
        self.dispatch_execute(sql, |chain, stmt| chain.statement_execute_update(stmt, sql))
    }

    pub fn execute_update_with_generated_keys(
        &mut self,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<u64> {
        self.dispatch_execute(sql, |chain, stmt| {
            chain.statement_execute_update_with_generated_keys(stmt, sql, keys)
        })
    }

    pub fn execute_update_with_column_indexes(&mut self, sql: &str, columns: &[u32]) -> Result<u64> {
        self.dispatch_execute(sql, |chain, stmt| {
            chain.statement_execute_update_with_column_indexes(stmt, sql, columns)
        })
    }

    pub fn execute_update_with_column_names(&mut self, sql: &str, columns: &[&str]) -> Result<u64> {
        self.dispatch_execute(sql, |chain, stmt| {
            chain.statement_execute_update_with_column_names(stmt, sql, columns)
        })
    }

    /// Queue `sql` for [`execute_batch`](Self::execute_batch).
    pub fn add_batch(&mut self, sql: &str) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_add_batch(stmt, sql))?;
        self.proxy.push_batch_sql(sql);
        Ok(())
    }

    pub fn clear_batch(&mut self) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_clear_batch(stmt))?;
        self.proxy.clear_batch_sql();
        Ok(())
    }

    /// Run the queued batch. The joined batch text, or the compiled SQL when
    /// nothing was queued by text, is recorded on the transaction. An empty
    /// text batch records nothing.
    pub fn execute_batch(&mut self) -> Result<Vec<i64>> {
        let conn = self.live()?;
        let sql = match self.proxy.sql() {
            Some(sql) if self.proxy.batch_sql_list().is_empty() => sql.to_string(),
            _ => self.proxy.batch_sql(),
        };
        if !sql.is_empty() {
            conn.transaction_record(&sql)?;
        }
        self.run(&conn, |chain, stmt| chain.statement_execute_batch(stmt))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Results
    // ═══════════════════════════════════════════════════════════════════════

    pub fn result_set(&mut self) -> Result<Option<PooledResultSet>> {
        let raw = self.dispatch(|chain, stmt| chain.statement_result_set(stmt))?;
        Ok(raw.map(|raw| self.wrap(raw)))
    }

    pub fn generated_keys(&mut self) -> Result<PooledResultSet> {
        let raw = self.dispatch(|chain, stmt| chain.statement_generated_keys(stmt))?;
        Ok(self.wrap(raw))
    }

    pub fn update_count(&mut self) -> Result<Option<u64>> {
        self.dispatch(|chain, stmt| chain.statement_update_count(stmt))
    }

    pub fn more_results(&mut self) -> Result<bool> {
        self.dispatch(|chain, stmt| chain.statement_more_results(stmt))
    }

    pub fn more_results_with(&mut self, current: MoreResults) -> Result<bool> {
        self.dispatch(|chain, stmt| chain.statement_more_results_with(stmt, current))
    }

    pub fn warnings(&mut self) -> Result<Vec<Warning>> {
        self.dispatch(|chain, stmt| chain.statement_warnings(stmt))
    }

    pub fn clear_warnings(&mut self) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_clear_warnings(stmt))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Settings
    // ═══════════════════════════════════════════════════════════════════════

    pub fn fetch_direction(&mut self) -> Result<FetchDirection> {
        self.dispatch(|chain, stmt| chain.statement_fetch_direction(stmt))
    }

    pub fn set_fetch_direction(&mut self, direction: FetchDirection) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_fetch_direction(stmt, direction))
    }

    pub fn fetch_size(&mut self) -> Result<u32> {
        self.dispatch(|chain, stmt| chain.statement_fetch_size(stmt))
    }

    pub fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_fetch_size(stmt, rows))
    }

    pub fn max_field_size(&mut self) -> Result<u32> {
        self.dispatch(|chain, stmt| chain.statement_max_field_size(stmt))
    }

    pub fn set_max_field_size(&mut self, bytes: u32) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_max_field_size(stmt, bytes))
    }

    pub fn max_rows(&mut self) -> Result<u64> {
        self.dispatch(|chain, stmt| chain.statement_max_rows(stmt))
    }

    pub fn set_max_rows(&mut self, rows: u64) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_max_rows(stmt, rows))
    }

    pub fn query_timeout(&mut self) -> Result<Duration> {
        self.dispatch(|chain, stmt| chain.statement_query_timeout(stmt))
    }

    pub fn set_query_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_query_timeout(stmt, timeout))
    }

    pub fn result_set_concurrency(&mut self) -> Result<Concurrency> {
        self.dispatch(|chain, stmt| chain.statement_result_set_concurrency(stmt))
    }

    pub fn result_set_holdability(&mut self) -> Result<Holdability> {
        self.dispatch(|chain, stmt| chain.statement_result_set_holdability(stmt))
    }

    pub fn result_set_type(&mut self) -> Result<ResultSetType> {
        self.dispatch(|chain, stmt| chain.statement_result_set_type(stmt))
    }

    pub fn is_poolable(&mut self) -> Result<bool> {
        self.dispatch(|chain, stmt| chain.statement_is_poolable(stmt))
    }

    pub fn set_poolable(&mut self, poolable: bool) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_poolable(stmt, poolable))
    }

    pub fn set_cursor_name(&mut self, name: &str) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_cursor_name(stmt, name))
    }

    pub fn set_escape_processing(&mut self, enable: bool) -> Result<()> {
        self.dispatch(|chain, stmt| chain.statement_set_escape_processing(stmt, enable))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Capability query
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether this handle or the raw statement can be viewed as `T`.
    pub fn is_wrapper_for<T: 'static>(&self) -> Result<bool>
    where
        K: 'static,
    {
        if !self.proxy.is_open() {
            return Err(Error::StatementClosed);
        }

        let type_id = TypeId::of::<T>();
        if type_id == TypeId::of::<Self>() {
            return Ok(true);
        }

        let raw = self.proxy.raw_statement()?;
        Ok(raw.as_any().is::<T>() || raw.is_wrapper_for(type_id))
    }

    /// The raw statement as `T`, if that is its concrete type.
    pub fn unwrap_raw<T: 'static>(&mut self) -> Result<Option<&mut T>> {
        if !self.proxy.is_open() {
            return Err(Error::StatementClosed);
        }
        let raw = self.proxy.raw_statement_mut()?;
        Ok(raw.as_any_mut().downcast_mut::<T>())
    }
}

impl<K: PreparedKind> PooledStatement<K> {
    /// SQL this statement was compiled from.
    pub fn sql(&self) -> &str {
        self.proxy.sql().unwrap_or_default()
    }

    /// Bind `value` to parameter `index` (1-based).
    pub fn set_parameter(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.dispatch(|chain, stmt| chain.prepared_set_parameter(stmt, index, value))
    }

    pub fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<()> {
        self.dispatch(|chain, stmt| chain.prepared_set_null(stmt, index, sql_type))
    }

    pub fn clear_parameters(&mut self) -> Result<()> {
        self.dispatch(|chain, stmt| chain.prepared_clear_parameters(stmt))
    }

    pub fn execute_prepared(&mut self) -> Result<bool> {
        let sql = self.sql().to_string();
        self.dispatch_execute(&sql, |chain, stmt| chain.prepared_execute(stmt))
    }

    pub fn execute_query_prepared(&mut self) -> Result<PooledResultSet> {
        let sql = self.sql().to_string();
        let raw = self.dispatch_execute(&sql, |chain, stmt| chain.prepared_execute_query(stmt))?;
        Ok(self.wrap(raw))
    }

    pub fn execute_update_prepared(&mut self) -> Result<u64> {
        let sql = self.sql().to_string();
        self.dispatch_execute(&sql, |chain, stmt| chain.prepared_execute_update(stmt))
    }

    /// Queue the current parameter set.
    pub fn add_batch_prepared(&mut self) -> Result<()> {
        self.dispatch(|chain, stmt| chain.prepared_add_batch(stmt))
    }

    pub fn metadata(&mut self) -> Result<Vec<ColumnDescription>> {
        self.dispatch(|chain, stmt| chain.prepared_metadata(stmt))
    }

    pub fn parameter_count(&mut self) -> Result<usize> {
        self.dispatch(|chain, stmt| chain.prepared_parameter_count(stmt))
    }
}

impl<K: CallableKind> PooledStatement<K> {
    pub fn register_out_parameter(&mut self, index: usize, sql_type: SqlType) -> Result<()> {
        self.dispatch(|chain, stmt| chain.callable_register_out_parameter(stmt, index, sql_type))
    }

    pub fn register_out_parameter_by_name(&mut self, name: &str, sql_type: SqlType) -> Result<()> {
        self.dispatch(|chain, stmt| {
            chain.callable_register_out_parameter_by_name(stmt, name, sql_type)
        })
    }

    pub fn set_parameter_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.dispatch(|chain, stmt| chain.callable_set_parameter_by_name(stmt, name, value))
    }

    pub fn out_value(&mut self, index: usize) -> Result<Value> {
        self.dispatch(|chain, stmt| chain.callable_out_value(stmt, index))
    }

    pub fn out_value_by_name(&mut self, name: &str) -> Result<Value> {
        self.dispatch(|chain, stmt| chain.callable_out_value_by_name(stmt, name))
    }

    pub fn was_null(&mut self) -> Result<bool> {
        self.dispatch(|chain, stmt| chain.callable_was_null(stmt))
    }
}

impl<K: StatementKind> Drop for PooledStatement<K> {
    fn drop(&mut self) {
        if !self.proxy.is_open() {
            return;
        }
        if let Err(e) = self.close() {
            tracing::warn!(
                statement.id = self.proxy.id(),
                connection.id = self.proxy.connection_id(),
                error = %e,
                "failed to close statement on drop"
            );
        }
        // A rejected close leaves the handle in place; this is the last exit.
        if let Err(e) = self.proxy.release() {
            tracing::warn!(
                statement.id = self.proxy.id(),
                connection.id = self.proxy.connection_id(),
                error = %e,
                "failed to release statement on drop"
            );
        }
    }
}
