//! Logical connection handed out by a pool.
//!
//! A [`PooledConnection`] borrows one [`ConnectionHolder`] from its data
//! source. Closing it gives the holder back through
//! [`DataSource::recycle`]; the physical connection stays open.
//!
//! # Locking
//!
//! The mutable connection state sits behind one `parking_lot::Mutex` shared
//! with the statements created from it (they keep a `Weak` reference). The
//! lock is held for the duration of a single raw connection call; filters and
//! listeners always run without it.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::datasource::{DataSource, FaultAction};
use crate::driver::{
    AutoGeneratedKeys, Concurrency, DatabaseMetadata, Holdability, ResultSetType, Savepoint,
    TransactionIsolation, Warning,
};
use crate::error::{DriverResult, Error, Result};
use crate::event::{ConnectionEvent, ConnectionEventListener, StatementEvent, StatementEventListener};
use crate::holder::ConnectionHolder;
use crate::statement::{
    Callable, Plain, PooledCallableStatement, PooledPreparedStatement, PooledStatement, Prepared,
    PreparedKind, StatementKind, StatementProxy,
};
use crate::statement_cache::{PreparedStatementHolder, StatementKey, StatementVariant};
use crate::transaction::TransactionInfo;

pub(crate) struct ConnectionCore {
    holder: Option<ConnectionHolder>,
    transaction: Option<TransactionInfo>,
    trace_enable: bool,
    closed: bool,
    disabled: bool,
}

/// State shared between a pooled connection and its statements.
pub(crate) struct ConnectionShared {
    id: u64,
    core: Mutex<ConnectionCore>,
    data_source: Arc<dyn DataSource>,
    dup_close_log_enable: bool,
}

impl ConnectionShared {
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    pub(crate) const fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    fn lock_live(&self) -> Result<MutexGuard<'_, ConnectionCore>> {
        let core = self.core.lock();
        if core.closed || core.disabled || core.holder.is_none() {
            return Err(Error::ConnectionClosed);
        }
        Ok(core)
    }

    pub(crate) fn check_state(&self) -> Result<()> {
        self.lock_live().map(drop)
    }

    /// Run `f` against the live holder without routing its outcome.
    fn with_holder<T>(&self, f: impl FnOnce(&mut ConnectionHolder) -> T) -> Result<T> {
        let mut core = self.lock_live()?;
        let holder = core.holder.as_mut().ok_or(Error::ConnectionClosed)?;
        Ok(f(holder))
    }

    /// Run a raw call against the live holder; failures go through the fault hook.
    fn call<T>(&self, f: impl FnOnce(&mut ConnectionHolder) -> DriverResult<T>) -> Result<T> {
        self.with_holder(f)?
            .map_err(|e| self.handle_exception(e.into()))
    }

    /// Report a failure to the data source before it reaches the caller.
    pub(crate) fn handle_exception(&self, error: Error) -> Error {
        if error.is_closed_handle() {
            return error;
        }

        let listeners = self
            .core
            .lock()
            .holder
            .as_ref()
            .map(ConnectionHolder::connection_listeners);

        let action = self
            .data_source
            .handle_connection_exception(self.id, &error);

        if action == FaultAction::Discard
            && let Some(listeners) = listeners
        {
            tracing::warn!(connection.id = self.id, error = %error, "discarding broken connection");
            let event = ConnectionEvent::error(self.id, &error);
            for listener in &listeners {
                listener.connection_error_occurred(&event);
            }
            if let Some(holder) = self.disable() {
                self.data_source.discard(holder);
            }
        }

        error
    }

    fn disable(&self) -> Option<ConnectionHolder> {
        let mut core = self.core.lock();
        core.trace_enable = false;
        core.transaction = None;
        core.disabled = true;
        core.holder.take()
    }

    pub(crate) fn add_trace(&self, statement_id: u64) {
        if let Some(holder) = self.core.lock().holder.as_mut() {
            holder.add_trace(statement_id);
        }
    }

    pub(crate) fn remove_trace(&self, statement_id: u64) {
        if let Some(holder) = self.core.lock().holder.as_mut() {
            holder.remove_trace(statement_id);
        }
    }

    /// Append `sql` to the active transaction, opening one if auto-commit is off.
    pub(crate) fn transaction_record(&self, sql: &str) -> Result<()> {
        let outcome = {
            let mut guard = self.lock_live()?;
            let core = &mut *guard;
            let holder = core.holder.as_mut().ok_or(Error::ConnectionClosed)?;

            holder.connection_mut().auto_commit().map(|auto_commit| {
                if core.transaction.is_none() && !auto_commit {
                    self.data_source
                        .counters()
                        .increment_start_transaction_count();
                    let transaction = TransactionInfo::new(self.data_source.create_transaction_id());
                    tracing::debug!(
                        connection.id = self.id,
                        transaction.id = transaction.id(),
                        "transaction started"
                    );
                    core.transaction = Some(transaction);
                }

                if let Some(transaction) = core.transaction.as_mut() {
                    transaction.record(sql);
                }
            })
        };

        outcome.map_err(|e| self.handle_exception(e.into()))
    }

    /// Finish and report the active transaction, if any.
    fn end_transaction(&self) {
        let Some(mut transaction) = self.core.lock().transaction.take() else {
            return;
        };

        transaction.finish();
        self.data_source
            .counters()
            .record_transaction_millis(transaction.duration_millis());
        self.data_source.log_transaction(&transaction);
    }

    /// Put a released compiled statement back into the holder's cache.
    ///
    /// Gives the entry back when there is no holder or pooling is off, so the
    /// caller can destroy it.
    pub(crate) fn return_to_cache(
        &self,
        statement_id: u64,
        mut entry: PreparedStatementHolder,
    ) -> std::result::Result<(), PreparedStatementHolder> {
        let (displaced, listeners, event) = {
            let mut core = self.core.lock();
            let Some(holder) = core.holder.as_mut() else {
                return Err(entry);
            };

            holder.remove_trace(statement_id);
            if !holder.is_pool_prepared_statements() {
                return Err(entry);
            }

            if let Err(e) = entry.statement_mut().as_prepared_mut().clear_parameters() {
                tracing::error!(
                    connection.id = self.id,
                    statement.id = statement_id,
                    error = %e,
                    "clear parameter error"
                );
            }

            let event = StatementEvent {
                connection_id: self.id,
                statement_id,
                sql: entry.key().sql().to_string(),
            };
            let displaced = holder.statement_pool_mut().put(entry);
            (displaced, holder.statement_listeners(), event)
        };

        if let Some(old) = displaced {
            self.close_displaced(old);
        }

        for listener in &listeners {
            listener.statement_closed(&event);
        }

        Ok(())
    }

    fn close_displaced(&self, mut entry: PreparedStatementHolder) {
        let counters = self.data_source.counters();
        counters.increment_cached_prepared_statement_delete_count();

        tracing::debug!(
            connection.id = self.id,
            statement.key = %entry.key(),
            hits = entry.hit_count(),
            "cached statement evicted"
        );

        if let Err(e) = entry.close() {
            tracing::warn!(
                connection.id = self.id,
                statement.key = %entry.key(),
                error = %e,
                "failed to close evicted statement"
            );
        }
        counters.increment_closed_prepared_statement_count();
    }
}

/// A pooled logical connection.
///
/// Every operation fails with [`Error::ConnectionClosed`] once the
/// connection is closed or disabled. Dropping an open connection closes it.
pub struct PooledConnection {
    shared: Arc<ConnectionShared>,
    owner_thread: ThreadId,
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("PooledConnection")
            .field("id", &self.shared.id)
            .field("holder", &core.holder.as_ref().map(ConnectionHolder::id))
            .field("closed", &core.closed)
            .field("disabled", &core.disabled)
            .field("owner_thread", &self.owner_thread)
            .finish()
    }
}

impl PooledConnection {
    pub fn new(data_source: Arc<dyn DataSource>, mut holder: ConnectionHolder) -> Self {
        holder.increment_use_count();
        let id = holder.id();
        let dup_close_log_enable = data_source.config().dup_close_log_enable();

        Self {
            shared: Arc::new(ConnectionShared {
                id,
                core: Mutex::new(ConnectionCore {
                    holder: Some(holder),
                    transaction: None,
                    trace_enable: false,
                    closed: false,
                    disabled: false,
                }),
                data_source,
                dup_close_log_enable,
            }),
            owner_thread: thread::current().id(),
        }
    }

    /// Id of the holder this connection was created on.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Thread that checked the connection out.
    pub const fn owner_thread(&self) -> ThreadId {
        self.owner_thread
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.shared.data_source
    }

    pub fn is_trace_enable(&self) -> bool {
        self.shared.core.lock().trace_enable
    }

    pub fn set_trace_enable(&self, enabled: bool) {
        self.shared.core.lock().trace_enable = enabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.shared.core.lock().disabled
    }

    /// Snapshot of the active transaction.
    pub fn transaction_info(&self) -> Option<TransactionInfo> {
        self.shared.core.lock().transaction.clone()
    }

    /// Number of statements handed out and not yet closed.
    pub fn open_statement_count(&self) -> usize {
        self.shared
            .core
            .lock()
            .holder
            .as_ref()
            .map_or(0, |holder| holder.open_statements().len())
    }

    /// Run `f` with read access to the attached holder.
    pub fn inspect_holder<R>(&self, f: impl FnOnce(&ConnectionHolder) -> R) -> Option<R> {
        self.shared.core.lock().holder.as_ref().map(f)
    }

    pub fn check_state(&self) -> Result<()> {
        self.shared.check_state()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statement acquisition
    // ═══════════════════════════════════════════════════════════════════════

    pub fn prepare_statement(&self, sql: &str) -> Result<PooledPreparedStatement> {
        self.prepare_with::<Prepared>(sql, StatementVariant::Plain)
    }

    pub fn prepare_statement_with_result_set(
        &self,
        sql: &str,
        result_set_type: ResultSetType,
        concurrency: Concurrency,
    ) -> Result<PooledPreparedStatement> {
        self.prepare_with::<Prepared>(
            sql,
            StatementVariant::ResultSet {
                result_set_type,
                concurrency,
            },
        )
    }

    pub fn prepare_statement_with_holdability(
        &self,
        sql: &str,
        result_set_type: ResultSetType,
        concurrency: Concurrency,
        holdability: Holdability,
    ) -> Result<PooledPreparedStatement> {
        self.prepare_with::<Prepared>(
            sql,
            StatementVariant::ResultSetHoldability {
                result_set_type,
                concurrency,
                holdability,
            },
        )
    }

    pub fn prepare_statement_with_column_indexes(
        &self,
        sql: &str,
        columns: &[u32],
    ) -> Result<PooledPreparedStatement> {
        self.prepare_with::<Prepared>(sql, StatementVariant::ColumnIndexes(columns.to_vec()))
    }

    pub fn prepare_statement_with_column_names(
        &self,
        sql: &str,
        columns: &[&str],
    ) -> Result<PooledPreparedStatement> {
        let columns = columns.iter().map(ToString::to_string).collect();
        self.prepare_with::<Prepared>(sql, StatementVariant::ColumnNames(columns))
    }

    pub fn prepare_statement_with_generated_keys(
        &self,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<PooledPreparedStatement> {
        self.prepare_with::<Prepared>(sql, StatementVariant::GeneratedKeys(keys))
    }

    pub fn prepare_call(&self, sql: &str) -> Result<PooledCallableStatement> {
        self.prepare_with::<Callable>(sql, StatementVariant::Call)
    }

    pub fn prepare_call_with_result_set(
        &self,
        sql: &str,
        result_set_type: ResultSetType,
        concurrency: Concurrency,
    ) -> Result<PooledCallableStatement> {
        self.prepare_with::<Callable>(
            sql,
            StatementVariant::CallResultSet {
                result_set_type,
                concurrency,
            },
        )
    }

    pub fn prepare_call_with_holdability(
        &self,
        sql: &str,
        result_set_type: ResultSetType,
        concurrency: Concurrency,
        holdability: Holdability,
    ) -> Result<PooledCallableStatement> {
        self.prepare_with::<Callable>(
            sql,
            StatementVariant::CallResultSetHoldability {
                result_set_type,
                concurrency,
                holdability,
            },
        )
    }

    pub fn create_statement(&self) -> Result<PooledStatement> {
        self.create_with(&StatementVariant::Plain)
    }

    pub fn create_statement_with_result_set(
        &self,
        result_set_type: ResultSetType,
        concurrency: Concurrency,
    ) -> Result<PooledStatement> {
        self.create_with(&StatementVariant::ResultSet {
            result_set_type,
            concurrency,
        })
    }

    pub fn create_statement_with_holdability(
        &self,
        result_set_type: ResultSetType,
        concurrency: Concurrency,
        holdability: Holdability,
    ) -> Result<PooledStatement> {
        self.create_with(&StatementVariant::ResultSetHoldability {
            result_set_type,
            concurrency,
            holdability,
        })
    }

    fn prepare_with<K: PreparedKind>(
        &self,
        sql: &str,
        variant: StatementVariant,
    ) -> Result<PooledStatement<K>> {
        let id = self.shared.id;
        let counters = self.shared.data_source.counters();

        let acquired = self.shared.with_holder(
            |holder: &mut ConnectionHolder| -> DriverResult<PreparedStatementHolder> {
                let catalog = holder.connection_mut().catalog()?;
                let key = StatementKey::new(sql, catalog, variant);

                if holder.is_pool_prepared_statements() {
                    if let Some(entry) = holder.statement_pool_mut().take(&key) {
                        counters.increment_cached_prepared_statement_hit_count();
                        tracing::debug!(connection.id = id, statement.key = %key, "statement cache hit");
                        return Ok(entry);
                    }
                    counters.increment_cached_prepared_statement_miss_count();
                }

                let compiled = K::compile(holder.connection_mut(), &key)?;
                counters.increment_prepared_statement_count();
                tracing::debug!(connection.id = id, statement.key = %key, "statement prepared");
                Ok(PreparedStatementHolder::new(key, compiled))
            },
        )?;

        let entry = acquired.map_err(|e| self.shared.handle_exception(e.into()))?;
        self.finish_acquire(StatementProxy::cached(&self.shared, entry))
    }

    fn create_with(&self, variant: &StatementVariant) -> Result<PooledStatement<Plain>> {
        let raw = self
            .shared
            .call(|holder| holder.connection_mut().create_statement(variant))?;
        self.finish_acquire(StatementProxy::plain(&self.shared, raw))
    }

    /// Apply the data source init hook, then trace and wrap the statement.
    fn finish_acquire<K: StatementKind>(&self, mut proxy: StatementProxy) -> Result<PooledStatement<K>> {
        let initialized = proxy.raw_statement_mut().and_then(|raw| {
            self.shared
                .data_source
                .init_statement(raw)
                .map_err(Error::from)
        });

        if let Err(e) = initialized {
            if let Err(release_err) = proxy.release() {
                tracing::warn!(
                    connection.id = self.shared.id,
                    statement.id = proxy.id(),
                    error = %release_err,
                    "failed to release statement after init error"
                );
            }
            return Err(self.shared.handle_exception(e));
        }

        self.shared.add_trace(proxy.id());
        Ok(PooledStatement::new(proxy))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Give the holder back to the data source.
    ///
    /// Closing twice is not an error; the second call is logged when
    /// `dup_close_log_enable` is set. Closing a disabled connection does
    /// nothing.
    pub fn close(&self) -> Result<()> {
        let holder = {
            let mut core = self.shared.core.lock();
            if core.disabled {
                return Ok(());
            }

            let Some(holder) = core.holder.take() else {
                if self.shared.dup_close_log_enable {
                    tracing::error!(connection.id = self.shared.id, "dup close");
                }
                return Ok(());
            };

            core.transaction = None;
            core.closed = true;
            holder
        };

        let event = ConnectionEvent::closed(self.shared.id);
        for listener in holder.connection_listeners() {
            listener.connection_closed(&event);
        }

        tracing::debug!(connection.id = self.shared.id, "connection recycled");
        self.shared.data_source.recycle(holder)
    }

    /// Detach from the holder without recycling it.
    ///
    /// Returns the holder so the caller can discard it.
    pub fn disable(&self) -> Option<ConnectionHolder> {
        self.shared.disable()
    }

    /// `true` once detached, otherwise whatever the driver reports.
    pub fn is_closed(&self) -> Result<bool> {
        let result = {
            let mut core = self.shared.core.lock();
            let Some(holder) = core.holder.as_mut() else {
                return Ok(true);
            };
            holder.connection_mut().is_closed()
        };
        result.map_err(|e| self.shared.handle_exception(e.into()))
    }

    pub fn is_valid(&self, timeout: Duration) -> Result<bool> {
        self.shared
            .call(|holder| holder.connection_mut().is_valid(timeout))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transactions
    // ═══════════════════════════════════════════════════════════════════════

    pub fn set_auto_commit(&self, auto_commit: bool) -> Result<()> {
        self.shared.call(|holder| {
            holder.connection_mut().set_auto_commit(auto_commit)?;
            holder.underlying_mut().auto_commit = auto_commit;
            Ok(())
        })
    }

    pub fn auto_commit(&self) -> Result<bool> {
        self.shared.call(|holder| holder.connection_mut().auto_commit())
    }

    /// Commit; the transaction record is finished whether or not it succeeds.
    pub fn commit(&self) -> Result<()> {
        let counters = self.shared.data_source.counters();
        let outcome = self.shared.with_holder(|holder| {
            counters.increment_commit_count();
            holder.connection_mut().commit()
        })?;

        self.shared.end_transaction();
        outcome.map_err(|e| self.shared.handle_exception(e.into()))
    }

    /// Roll back the active transaction.
    ///
    /// Without an active transaction record this is a no-op: nothing was
    /// executed through this connection since the last commit.
    pub fn rollback(&self) -> Result<()> {
        let counters = self.shared.data_source.counters();
        let outcome = {
            let mut core = self.shared.lock_live()?;
            if core.transaction.is_none() {
                return Ok(());
            }
            let holder = core.holder.as_mut().ok_or(Error::ConnectionClosed)?;
            counters.increment_rollback_count();
            holder.connection_mut().rollback()
        };

        self.shared.end_transaction();
        outcome.map_err(|e| self.shared.handle_exception(e.into()))
    }

    pub fn rollback_to_savepoint(&self, savepoint: &Savepoint) -> Result<()> {
        let counters = self.shared.data_source.counters();
        let outcome = self.shared.with_holder(|holder| {
            counters.increment_rollback_count();
            holder.connection_mut().rollback_to_savepoint(savepoint)
        })?;

        self.shared.end_transaction();
        outcome.map_err(|e| self.shared.handle_exception(e.into()))
    }

    pub fn set_savepoint(&self) -> Result<Savepoint> {
        self.shared
            .call(|holder| holder.connection_mut().set_savepoint(None))
    }

    pub fn set_named_savepoint(&self, name: &str) -> Result<Savepoint> {
        self.shared
            .call(|holder| holder.connection_mut().set_savepoint(Some(name)))
    }

    pub fn release_savepoint(&self, savepoint: &Savepoint) -> Result<()> {
        self.shared
            .call(|holder| holder.connection_mut().release_savepoint(savepoint))
    }

    pub fn set_transaction_isolation(&self, level: TransactionIsolation) -> Result<()> {
        self.shared.call(|holder| {
            holder.connection_mut().set_transaction_isolation(level)?;
            holder.underlying_mut().transaction_isolation = Some(level);
            Ok(())
        })
    }

    pub fn transaction_isolation(&self) -> Result<TransactionIsolation> {
        self.shared
            .call(|holder| holder.connection_mut().transaction_isolation())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Session state
    // ═══════════════════════════════════════════════════════════════════════

    pub fn native_sql(&self, sql: &str) -> Result<String> {
        self.shared
            .call(|holder| holder.connection_mut().native_sql(sql))
    }

    pub fn metadata(&self) -> Result<DatabaseMetadata> {
        self.shared.call(|holder| holder.connection_mut().metadata())
    }

    pub fn set_read_only(&self, read_only: bool) -> Result<()> {
        self.shared.call(|holder| {
            holder.connection_mut().set_read_only(read_only)?;
            holder.underlying_mut().read_only = read_only;
            Ok(())
        })
    }

    pub fn is_read_only(&self) -> Result<bool> {
        self.shared.call(|holder| holder.connection_mut().is_read_only())
    }

    pub fn set_catalog(&self, catalog: &str) -> Result<()> {
        self.shared
            .call(|holder| holder.connection_mut().set_catalog(catalog))
    }

    pub fn catalog(&self) -> Result<Option<String>> {
        self.shared.call(|holder| holder.connection_mut().catalog())
    }

    pub fn set_holdability(&self, holdability: Holdability) -> Result<()> {
        self.shared.call(|holder| {
            holder.connection_mut().set_holdability(holdability)?;
            holder.underlying_mut().holdability = Some(holdability);
            Ok(())
        })
    }

    pub fn holdability(&self) -> Result<Holdability> {
        self.shared.call(|holder| holder.connection_mut().holdability())
    }

    pub fn warnings(&self) -> Result<Vec<Warning>> {
        self.shared.call(|holder| holder.connection_mut().warnings())
    }

    pub fn clear_warnings(&self) -> Result<()> {
        self.shared
            .call(|holder| holder.connection_mut().clear_warnings())
    }

    pub fn set_client_info(&self, name: &str, value: &str) -> Result<()> {
        self.shared
            .call(|holder| holder.connection_mut().set_client_info(name, value))
    }

    pub fn set_client_info_all(&self, properties: &HashMap<String, String>) -> Result<()> {
        self.shared
            .call(|holder| holder.connection_mut().set_client_info_all(properties))
    }

    pub fn client_info(&self, name: &str) -> Result<Option<String>> {
        self.shared
            .call(|holder| holder.connection_mut().client_info(name))
    }

    pub fn client_info_all(&self) -> Result<HashMap<String, String>> {
        self.shared
            .call(|holder| holder.connection_mut().client_info_all())
    }

    pub fn schema(&self) -> Result<Option<String>> {
        Err(Error::NotSupported("schema"))
    }

    pub fn set_schema(&self, _schema: &str) -> Result<()> {
        Err(Error::NotSupported("set_schema"))
    }

    pub fn abort(&self) -> Result<()> {
        Err(Error::NotSupported("abort"))
    }

    pub fn network_timeout(&self) -> Result<Duration> {
        Err(Error::NotSupported("network_timeout"))
    }

    pub fn set_network_timeout(&self, _timeout: Duration) -> Result<()> {
        Err(Error::NotSupported("set_network_timeout"))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Listeners
    // ═══════════════════════════════════════════════════════════════════════

    fn attached_holder<T>(&self, f: impl FnOnce(&mut ConnectionHolder) -> T) -> Result<T> {
        let mut core = self.shared.core.lock();
        let holder = core
            .holder
            .as_mut()
            .ok_or_else(|| Error::illegal_state("pooled connection has no holder"))?;
        Ok(f(holder))
    }

    pub fn add_connection_event_listener(
        &self,
        listener: Arc<dyn ConnectionEventListener>,
    ) -> Result<()> {
        self.attached_holder(|holder| holder.add_connection_listener(listener))
    }

    pub fn remove_connection_event_listener(
        &self,
        listener: &Arc<dyn ConnectionEventListener>,
    ) -> Result<bool> {
        self.attached_holder(|holder| holder.remove_connection_listener(listener))
    }

    pub fn add_statement_event_listener(
        &self,
        listener: Arc<dyn StatementEventListener>,
    ) -> Result<()> {
        self.attached_holder(|holder| holder.add_statement_listener(listener))
    }

    pub fn remove_statement_event_listener(
        &self,
        listener: &Arc<dyn StatementEventListener>,
    ) -> Result<bool> {
        self.attached_holder(|holder| holder.remove_statement_listener(listener))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Capability query
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether this connection is, or wraps, a `T`.
    pub fn is_wrapper_for<T: 'static>(&self) -> Result<bool> {
        let type_id = TypeId::of::<T>();
        if type_id == TypeId::of::<Self>() {
            return Ok(true);
        }
        self.shared.with_holder(|holder| {
            let raw = holder.connection();
            raw.as_any().is::<T>() || raw.is_wrapper_for(type_id)
        })
    }

    /// Run `f` on the raw connection if it is a `T`.
    pub fn with_unwrapped<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<Option<R>> {
        self.shared.with_holder(|holder| {
            holder
                .connection_mut()
                .as_any_mut()
                .downcast_mut::<T>()
                .map(f)
        })
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let attached = {
            let core = self.shared.core.lock();
            core.holder.is_some() && !core.disabled
        };
        if attached && let Err(e) = self.close() {
            tracing::warn!(connection.id = self.shared.id, error = %e, "close on drop failed");
        }
    }
}
