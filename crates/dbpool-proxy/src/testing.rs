//! In-memory driver and data source used by unit tests.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::DataSourceConfig;
use crate::datasource::{DataSource, FaultAction};
use crate::driver::{
    AutoGeneratedKeys, ColumnDescription, Concurrency, DatabaseMetadata, FetchDirection,
    Holdability, MoreResults, RawCallableStatement, RawConnection, RawPreparedStatement,
    RawResultSet, RawStatement, ResultSetType, Savepoint, SqlType, TransactionIsolation, Value,
    Warning,
};
use crate::error::{DriverError, DriverResult, Error, Result};
use crate::filter::{Filter, FilterChain};
use crate::holder::ConnectionHolder;
use crate::statement::StatementProxy;
use crate::statement_cache::StatementVariant;
use crate::stats::{AtomicPoolCounters, PoolCounters};
use crate::transaction::TransactionInfo;
use crate::{ConnectionEvent, ConnectionEventListener, PooledConnection, StatementEvent, StatementEventListener};

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

// ═══════════════════════════════════════════════════════════════════════════
// Call log
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct CallLogInner {
    entries: Vec<String>,
    failures: Vec<(String, DriverError)>,
}

/// Ordered record of raw driver calls, shared by every mock handle.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<CallLogInner>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `op` and fail if a failure was injected for it.
    fn record(&self, op: &str, detail: &str) -> DriverResult<()> {
        let mut inner = self.inner.lock();
        let entry = if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op} {detail}")
        };
        inner.entries.push(entry);

        if let Some(pos) = inner.failures.iter().position(|(name, _)| name == op) {
            let (_, error) = inner.failures.remove(pos);
            return Err(error);
        }
        Ok(())
    }

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: &str) {
        self.fail_next_with(op, DriverError::new(format!("injected failure in {op}")));
    }

    pub fn fail_next_with(&self, op: &str, error: DriverError) {
        self.inner.lock().failures.push((op.to_string(), error));
    }

    fn matches(entry: &str, needle: &str) -> bool {
        entry == needle || entry.starts_with(&format!("{needle} "))
    }

    /// Whether a call matching `needle` (an op, or an op plus its detail) was made.
    pub fn contains(&self, needle: &str) -> bool {
        self.count(needle) > 0
    }

    pub fn count(&self, needle: &str) -> usize {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|entry| Self::matches(entry, needle))
            .count()
    }

    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().entries.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Result set
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct MockResultSet {
    log: CallLog,
    rows: Vec<Vec<Value>>,
    cursor: Option<usize>,
    closed: bool,
}

impl MockResultSet {
    pub fn new(log: &CallLog, rows: Vec<Vec<Value>>) -> Self {
        Self {
            log: log.clone(),
            rows,
            cursor: None,
            closed: false,
        }
    }
}

impl RawResultSet for MockResultSet {
    fn next(&mut self) -> DriverResult<bool> {
        if self.closed {
            return Err(DriverError::new("result set is closed"));
        }
        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = Some(next);
        Ok(next < self.rows.len())
    }

    fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    fn value(&self, index: usize) -> DriverResult<Value> {
        self.cursor
            .and_then(|row| self.rows.get(row))
            .and_then(|row| row.get(index.checked_sub(1)?))
            .cloned()
            .ok_or_else(|| DriverError::new(format!("no value at column {index}")))
    }

    fn close(&mut self) -> DriverResult<()> {
        self.closed = true;
        self.log.record("rs.close", "")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Statement
// ═══════════════════════════════════════════════════════════════════════════

/// Plain, prepared and callable statement in one type.
#[derive(Debug)]
pub struct MockStatement {
    log: CallLog,
    sql: String,
    rows: Vec<Vec<Value>>,
    closed: bool,
    parameters: BTreeMap<usize, Value>,
    named_parameters: HashMap<String, Value>,
    out_parameters: BTreeMap<usize, SqlType>,
    batch: Vec<String>,
    query_timeout: Duration,
    fetch_size: u32,
    fetch_direction: FetchDirection,
    max_rows: u64,
    max_field_size: u32,
    poolable: bool,
    last_was_null: bool,
    update_count: Option<u64>,
}

impl MockStatement {
    pub fn new(log: &CallLog, sql: &str) -> Self {
        Self {
            log: log.clone(),
            sql: sql.to_string(),
            rows: default_rows(),
            closed: false,
            parameters: BTreeMap::new(),
            named_parameters: HashMap::new(),
            out_parameters: BTreeMap::new(),
            batch: Vec::new(),
            query_timeout: Duration::ZERO,
            fetch_size: 0,
            fetch_direction: FetchDirection::Forward,
            max_rows: 0,
            max_field_size: 0,
            poolable: true,
            last_was_null: false,
            update_count: None,
        }
    }

    /// A statement with its own private log.
    pub fn detached(sql: &str) -> Self {
        Self::new(&CallLog::new(), sql)
    }

    pub fn parameter(&self, index: usize) -> Option<&Value> {
        self.parameters.get(&index)
    }

    fn call(&self, op: &str, detail: &str) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::new("statement is closed"));
        }
        self.log.record(op, detail)
    }

    fn call_sql(&self, op: &str) -> DriverResult<()> {
        self.call(op, &self.sql)
    }

    fn rows_result(&self) -> Box<dyn RawResultSet> {
        Box::new(MockResultSet::new(&self.log, self.rows.clone()))
    }
}

fn default_rows() -> Vec<Vec<Value>> {
    (1..=3).map(|i| vec![Value::Int(i)]).collect()
}

impl RawStatement for MockStatement {
    fn add_batch(&mut self, sql: &str) -> DriverResult<()> {
        self.call("stmt.add_batch", sql)?;
        self.batch.push(sql.to_string());
        Ok(())
    }

    fn cancel(&mut self) -> DriverResult<()> {
        self.call_sql("stmt.cancel")
    }

    fn clear_batch(&mut self) -> DriverResult<()> {
        self.call_sql("stmt.clear_batch")?;
        self.batch.clear();
        Ok(())
    }

    fn clear_warnings(&mut self) -> DriverResult<()> {
        self.call_sql("stmt.clear_warnings")
    }

    fn close(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.log.record("stmt.close", &self.sql)
    }

    fn execute(&mut self, sql: &str) -> DriverResult<bool> {
        self.call("stmt.execute", sql)?;
        Ok(true)
    }

    fn execute_with_generated_keys(
        &mut self,
        sql: &str,
        _keys: AutoGeneratedKeys,
    ) -> DriverResult<bool> {
        self.call("stmt.execute", sql)?;
        Ok(true)
    }

    fn execute_with_column_indexes(&mut self, sql: &str, _columns: &[u32]) -> DriverResult<bool> {
        self.call("stmt.execute", sql)?;
        Ok(true)
    }

    fn execute_with_column_names(&mut self, sql: &str, _columns: &[&str]) -> DriverResult<bool> {
        self.call("stmt.execute", sql)?;
        Ok(true)
    }

    fn execute_batch(&mut self) -> DriverResult<Vec<i64>> {
        self.call_sql("stmt.execute_batch")?;
        let counts = if self.batch.is_empty() {
            vec![1]
        } else {
            vec![1; self.batch.len()]
        };
        self.batch.clear();
        Ok(counts)
    }

    fn execute_query(&mut self, sql: &str) -> DriverResult<Box<dyn RawResultSet>> {
        self.call("stmt.execute_query", sql)?;
        Ok(self.rows_result())
    }

    fn execute_update(&mut self, sql: &str) -> DriverResult<u64> {
        self.call("stmt.execute_update", sql)?;
        self.update_count = Some(1);
        Ok(1)
    }

    fn execute_update_with_generated_keys(
        &mut self,
        sql: &str,
        _keys: AutoGeneratedKeys,
    ) -> DriverResult<u64> {
        self.execute_update(sql)
    }

    fn execute_update_with_column_indexes(
        &mut self,
        sql: &str,
        _columns: &[u32],
    ) -> DriverResult<u64> {
        self.execute_update(sql)
    }

    fn execute_update_with_column_names(
        &mut self,
        sql: &str,
        _columns: &[&str],
    ) -> DriverResult<u64> {
        self.execute_update(sql)
    }

    fn fetch_direction(&mut self) -> DriverResult<FetchDirection> {
        self.call_sql("stmt.fetch_direction")?;
        Ok(self.fetch_direction)
    }

    fn set_fetch_direction(&mut self, direction: FetchDirection) -> DriverResult<()> {
        self.call_sql("stmt.set_fetch_direction")?;
        self.fetch_direction = direction;
        Ok(())
    }

    fn fetch_size(&mut self) -> DriverResult<u32> {
        self.call_sql("stmt.fetch_size")?;
        Ok(self.fetch_size)
    }

    fn set_fetch_size(&mut self, rows: u32) -> DriverResult<()> {
        self.call_sql("stmt.set_fetch_size")?;
        self.fetch_size = rows;
        Ok(())
    }

    fn generated_keys(&mut self) -> DriverResult<Box<dyn RawResultSet>> {
        self.call_sql("stmt.generated_keys")?;
        Ok(Box::new(MockResultSet::new(&self.log, vec![vec![Value::Int(100)]])))
    }

    fn max_field_size(&mut self) -> DriverResult<u32> {
        self.call_sql("stmt.max_field_size")?;
        Ok(self.max_field_size)
    }

    fn set_max_field_size(&mut self, bytes: u32) -> DriverResult<()> {
        self.call_sql("stmt.set_max_field_size")?;
        self.max_field_size = bytes;
        Ok(())
    }

    fn max_rows(&mut self) -> DriverResult<u64> {
        self.call_sql("stmt.max_rows")?;
        Ok(self.max_rows)
    }

    fn set_max_rows(&mut self, rows: u64) -> DriverResult<()> {
        self.call_sql("stmt.set_max_rows")?;
        self.max_rows = rows;
        Ok(())
    }

    fn more_results(&mut self) -> DriverResult<bool> {
        self.call_sql("stmt.more_results")?;
        Ok(false)
    }

    fn more_results_with(&mut self, _current: MoreResults) -> DriverResult<bool> {
        self.call_sql("stmt.more_results")?;
        Ok(false)
    }

    fn query_timeout(&mut self) -> DriverResult<Duration> {
        self.call_sql("stmt.query_timeout")?;
        Ok(self.query_timeout)
    }

    fn set_query_timeout(&mut self, timeout: Duration) -> DriverResult<()> {
        self.call("stmt.set_query_timeout", &timeout.as_secs().to_string())?;
        self.query_timeout = timeout;
        Ok(())
    }

    fn result_set(&mut self) -> DriverResult<Option<Box<dyn RawResultSet>>> {
        self.call_sql("stmt.result_set")?;
        Ok(self.update_count.is_none().then(|| self.rows_result()))
    }

    fn result_set_concurrency(&mut self) -> DriverResult<Concurrency> {
        self.call_sql("stmt.result_set_concurrency")?;
        Ok(Concurrency::default())
    }

    fn result_set_holdability(&mut self) -> DriverResult<Holdability> {
        self.call_sql("stmt.result_set_holdability")?;
        Ok(Holdability::default())
    }

    fn result_set_type(&mut self) -> DriverResult<ResultSetType> {
        self.call_sql("stmt.result_set_type")?;
        Ok(ResultSetType::default())
    }

    fn update_count(&mut self) -> DriverResult<Option<u64>> {
        self.call_sql("stmt.update_count")?;
        Ok(self.update_count)
    }

    fn warnings(&mut self) -> DriverResult<Vec<Warning>> {
        self.call_sql("stmt.warnings")?;
        Ok(Vec::new())
    }

    fn is_closed(&mut self) -> DriverResult<bool> {
        Ok(self.closed)
    }

    fn is_poolable(&mut self) -> DriverResult<bool> {
        self.call_sql("stmt.is_poolable")?;
        Ok(self.poolable)
    }

    fn set_poolable(&mut self, poolable: bool) -> DriverResult<()> {
        self.call_sql("stmt.set_poolable")?;
        self.poolable = poolable;
        Ok(())
    }

    fn set_cursor_name(&mut self, name: &str) -> DriverResult<()> {
        self.call("stmt.set_cursor_name", name)
    }

    fn set_escape_processing(&mut self, _enable: bool) -> DriverResult<()> {
        self.call_sql("stmt.set_escape_processing")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl RawPreparedStatement for MockStatement {
    fn set_parameter(&mut self, index: usize, value: Value) -> DriverResult<()> {
        self.call("stmt.set_parameter", &index.to_string())?;
        self.parameters.insert(index, value);
        Ok(())
    }

    fn set_null(&mut self, index: usize, _sql_type: SqlType) -> DriverResult<()> {
        self.call("stmt.set_null", &index.to_string())?;
        self.parameters.insert(index, Value::Null);
        Ok(())
    }

    fn clear_parameters(&mut self) -> DriverResult<()> {
        self.call_sql("stmt.clear_parameters")?;
        self.parameters.clear();
        self.named_parameters.clear();
        Ok(())
    }

    fn execute_prepared(&mut self) -> DriverResult<bool> {
        self.call_sql("stmt.execute_prepared")?;
        Ok(true)
    }

    fn execute_query_prepared(&mut self) -> DriverResult<Box<dyn RawResultSet>> {
        self.call_sql("stmt.execute_query_prepared")?;
        Ok(self.rows_result())
    }

    fn execute_update_prepared(&mut self) -> DriverResult<u64> {
        self.call_sql("stmt.execute_update_prepared")?;
        self.update_count = Some(1);
        Ok(1)
    }

    fn add_batch_prepared(&mut self) -> DriverResult<()> {
        self.call_sql("stmt.add_batch_prepared")?;
        self.batch.push(self.sql.clone());
        Ok(())
    }

    fn metadata(&mut self) -> DriverResult<Vec<ColumnDescription>> {
        self.call_sql("stmt.metadata")?;
        Ok(vec![ColumnDescription::new("id", SqlType::BigInt, false)])
    }

    fn parameter_count(&mut self) -> DriverResult<usize> {
        self.call_sql("stmt.parameter_count")?;
        Ok(self.sql.matches('?').count())
    }
}

impl RawCallableStatement for MockStatement {
    fn register_out_parameter(&mut self, index: usize, sql_type: SqlType) -> DriverResult<()> {
        self.call("stmt.register_out_parameter", &index.to_string())?;
        self.out_parameters.insert(index, sql_type);
        Ok(())
    }

    fn register_out_parameter_by_name(&mut self, name: &str, _sql_type: SqlType) -> DriverResult<()> {
        self.call("stmt.register_out_parameter", name)
    }

    fn set_parameter_by_name(&mut self, name: &str, value: Value) -> DriverResult<()> {
        self.call("stmt.set_parameter", name)?;
        self.named_parameters.insert(name.to_string(), value);
        Ok(())
    }

    fn out_value(&mut self, index: usize) -> DriverResult<Value> {
        self.call("stmt.out_value", &index.to_string())?;
        let value = if self.out_parameters.contains_key(&index) {
            Value::Int(index as i64 * 10)
        } else {
            Value::Null
        };
        self.last_was_null = value.is_null();
        Ok(value)
    }

    fn out_value_by_name(&mut self, name: &str) -> DriverResult<Value> {
        self.call("stmt.out_value", name)?;
        let value = self.named_parameters.get(name).cloned().unwrap_or(Value::Null);
        self.last_was_null = value.is_null();
        Ok(value)
    }

    fn was_null(&mut self) -> DriverResult<bool> {
        self.call_sql("stmt.was_null")?;
        Ok(self.last_was_null)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Connection
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct MockConnection {
    log: CallLog,
    auto_commit: bool,
    catalog: Option<String>,
    read_only: bool,
    isolation: TransactionIsolation,
    holdability: Holdability,
    client_info: HashMap<String, String>,
    next_savepoint: i32,
    closed: bool,
}

impl MockConnection {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            auto_commit: true,
            catalog: None,
            read_only: false,
            isolation: TransactionIsolation::default(),
            holdability: Holdability::default(),
            client_info: HashMap::new(),
            next_savepoint: 1,
            closed: false,
        }
    }

    #[must_use]
    pub const fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    fn call(&self, op: &str, detail: &str) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::connection_lost("connection is closed"));
        }
        self.log.record(op, detail)
    }
}

impl RawConnection for MockConnection {
    fn create_statement(&mut self, variant: &StatementVariant) -> DriverResult<Box<dyn RawStatement>> {
        self.call("conn.create_statement", variant.as_str())?;
        Ok(Box::new(MockStatement::new(&self.log, "")))
    }

    fn prepare_statement(
        &mut self,
        sql: &str,
        _variant: &StatementVariant,
    ) -> DriverResult<Box<dyn RawPreparedStatement>> {
        self.call("conn.prepare", sql)?;
        Ok(Box::new(MockStatement::new(&self.log, sql)))
    }

    fn prepare_call(
        &mut self,
        sql: &str,
        _variant: &StatementVariant,
    ) -> DriverResult<Box<dyn RawCallableStatement>> {
        self.call("conn.prepare_call", sql)?;
        Ok(Box::new(MockStatement::new(&self.log, sql)))
    }

    fn native_sql(&mut self, sql: &str) -> DriverResult<String> {
        self.call("conn.native_sql", sql)?;
        Ok(sql.trim().to_string())
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> DriverResult<()> {
        self.call("conn.set_auto_commit", &auto_commit.to_string())?;
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn auto_commit(&mut self) -> DriverResult<bool> {
        self.call("conn.auto_commit", "")?;
        Ok(self.auto_commit)
    }

    fn commit(&mut self) -> DriverResult<()> {
        self.call("conn.commit", "")
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.call("conn.rollback", "")
    }

    fn rollback_to_savepoint(&mut self, savepoint: &Savepoint) -> DriverResult<()> {
        let detail = savepoint
            .name()
            .map_or_else(|| savepoint.id().unwrap_or_default().to_string(), ToString::to_string);
        self.call("conn.rollback_to_savepoint", &detail)
    }

    fn set_savepoint(&mut self, name: Option<&str>) -> DriverResult<Savepoint> {
        self.call("conn.set_savepoint", name.unwrap_or_default())?;
        Ok(match name {
            Some(name) => Savepoint::Named(name.to_string()),
            None => {
                let id = self.next_savepoint;
                self.next_savepoint += 1;
                Savepoint::Unnamed(id)
            }
        })
    }

    fn release_savepoint(&mut self, _savepoint: &Savepoint) -> DriverResult<()> {
        self.call("conn.release_savepoint", "")
    }

    fn close(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.log.record("conn.close", "")
    }

    fn is_closed(&mut self) -> DriverResult<bool> {
        Ok(self.closed)
    }

    fn is_valid(&mut self, _timeout: Duration) -> DriverResult<bool> {
        Ok(!self.closed)
    }

    fn metadata(&mut self) -> DriverResult<DatabaseMetadata> {
        self.call("conn.metadata", "")?;
        Ok(DatabaseMetadata {
            product_name: "MockDB".to_string(),
            product_version: "1.0".to_string(),
            driver_name: "mock".to_string(),
            driver_version: "1.0".to_string(),
            url: None,
            user_name: None,
        })
    }

    fn set_read_only(&mut self, read_only: bool) -> DriverResult<()> {
        self.call("conn.set_read_only", &read_only.to_string())?;
        self.read_only = read_only;
        Ok(())
    }

    fn is_read_only(&mut self) -> DriverResult<bool> {
        self.call("conn.is_read_only", "")?;
        Ok(self.read_only)
    }

    fn set_catalog(&mut self, catalog: &str) -> DriverResult<()> {
        self.call("conn.set_catalog", catalog)?;
        self.catalog = Some(catalog.to_string());
        Ok(())
    }

    fn catalog(&mut self) -> DriverResult<Option<String>> {
        self.call("conn.catalog", "")?;
        Ok(self.catalog.clone())
    }

    fn set_transaction_isolation(&mut self, level: TransactionIsolation) -> DriverResult<()> {
        self.call("conn.set_transaction_isolation", "")?;
        self.isolation = level;
        Ok(())
    }

    fn transaction_isolation(&mut self) -> DriverResult<TransactionIsolation> {
        self.call("conn.transaction_isolation", "")?;
        Ok(self.isolation)
    }

    fn set_holdability(&mut self, holdability: Holdability) -> DriverResult<()> {
        self.call("conn.set_holdability", "")?;
        self.holdability = holdability;
        Ok(())
    }

    fn holdability(&mut self) -> DriverResult<Holdability> {
        self.call("conn.holdability", "")?;
        Ok(self.holdability)
    }

    fn warnings(&mut self) -> DriverResult<Vec<Warning>> {
        self.call("conn.warnings", "")?;
        Ok(vec![Warning::new("mock warning")])
    }

    fn clear_warnings(&mut self) -> DriverResult<()> {
        self.call("conn.clear_warnings", "")
    }

    fn set_client_info(&mut self, name: &str, value: &str) -> DriverResult<()> {
        self.call("conn.set_client_info", name)?;
        self.client_info.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn client_info(&mut self, name: &str) -> DriverResult<Option<String>> {
        self.call("conn.client_info", name)?;
        Ok(self.client_info.get(name).cloned())
    }

    fn client_info_all(&mut self) -> DriverResult<HashMap<String, String>> {
        self.call("conn.client_info", "")?;
        Ok(self.client_info.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Data source
// ═══════════════════════════════════════════════════════════════════════════

/// Data source keeping idle holders in a stack and recording transactions.
pub struct MockDataSource {
    config: DataSourceConfig,
    filters: Vec<Arc<dyn Filter>>,
    counters: AtomicPoolCounters,
    log: CallLog,
    auto_commit: bool,
    discard_on_connection_error: bool,
    idle: Mutex<Vec<ConnectionHolder>>,
    recycled: AtomicU64,
    faults: Mutex<Vec<String>>,
    transactions: Mutex<Vec<TransactionInfo>>,
    next_transaction_id: AtomicU64,
}

impl std::fmt::Debug for MockDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDataSource")
            .field("filters", &self.filters.len())
            .field("idle", &self.idle.lock().len())
            .finish_non_exhaustive()
    }
}

impl MockDataSource {
    pub fn builder() -> MockDataSourceBuilder {
        MockDataSourceBuilder::default()
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub const fn atomic_counters(&self) -> &AtomicPoolCounters {
        &self.counters
    }

    /// Borrow an idle holder, or open a new mock connection.
    pub fn connection(self: &Arc<Self>) -> PooledConnection {
        let holder = self.idle.lock().pop().unwrap_or_else(|| {
            let raw = MockConnection::new(&self.log).with_auto_commit(self.auto_commit);
            ConnectionHolder::new(Box::new(raw), &self.config)
        });
        let data_source: Arc<dyn DataSource> = Arc::clone(self) as Arc<dyn DataSource>;
        PooledConnection::new(data_source, holder)
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn recycled_count(&self) -> u64 {
        self.recycled.load(Ordering::Relaxed)
    }

    pub fn faults(&self) -> Vec<String> {
        self.faults.lock().clone()
    }

    pub fn transactions(&self) -> Vec<TransactionInfo> {
        self.transactions.lock().clone()
    }
}

impl DataSource for MockDataSource {
    fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    fn counters(&self) -> &dyn PoolCounters {
        &self.counters
    }

    fn recycle(&self, mut holder: ConnectionHolder) -> Result<()> {
        holder.reset();
        self.recycled.fetch_add(1, Ordering::Relaxed);
        self.idle.lock().push(holder);
        Ok(())
    }

    fn handle_connection_exception(&self, _connection_id: u64, error: &Error) -> FaultAction {
        self.faults.lock().push(error.to_string());
        let fatal = error
            .driver_error()
            .is_some_and(DriverError::is_connection_exception);
        if self.discard_on_connection_error && fatal {
            FaultAction::Discard
        } else {
            FaultAction::Keep
        }
    }

    fn create_transaction_id(&self) -> u64 {
        self.next_transaction_id.fetch_add(1, Ordering::Relaxed)
    }

    fn log_transaction(&self, transaction: &TransactionInfo) {
        self.transactions.lock().push(transaction.clone());
    }
}

pub struct MockDataSourceBuilder {
    config: crate::config::DataSourceConfigBuilder,
    filters: Vec<Arc<dyn Filter>>,
    auto_commit: bool,
    discard_on_connection_error: bool,
}

impl Default for MockDataSourceBuilder {
    fn default() -> Self {
        Self {
            config: DataSourceConfig::builder().pool_prepared_statements(true),
            filters: Vec::new(),
            auto_commit: true,
            discard_on_connection_error: false,
        }
    }
}

impl MockDataSourceBuilder {
    #[must_use]
    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn config(
        mut self,
        f: impl FnOnce(crate::config::DataSourceConfigBuilder) -> crate::config::DataSourceConfigBuilder,
    ) -> Self {
        self.config = f(self.config);
        self
    }

    #[must_use]
    pub const fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    #[must_use]
    pub const fn discard_on_connection_error(mut self, enabled: bool) -> Self {
        self.discard_on_connection_error = enabled;
        self
    }

    pub fn build(self) -> Arc<MockDataSource> {
        Arc::new(MockDataSource {
            config: self.config.build(),
            filters: self.filters,
            counters: AtomicPoolCounters::new(),
            log: CallLog::new(),
            auto_commit: self.auto_commit,
            discard_on_connection_error: self.discard_on_connection_error,
            idle: Mutex::new(Vec::new()),
            recycled: AtomicU64::new(0),
            faults: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
            next_transaction_id: AtomicU64::new(1),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Filters and listeners
// ═══════════════════════════════════════════════════════════════════════════

/// Counts the operation kinds it sees, then forwards.
#[derive(Debug, Default)]
pub struct CountingFilter {
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl CountingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or_default()
    }

    fn hit(&self, op: &'static str) {
        *self.calls.lock().entry(op).or_default() += 1;
    }
}

impl Filter for CountingFilter {
    fn name(&self) -> &str {
        "counting"
    }

    fn statement_close(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<()> {
        self.hit("statement_close");
        chain.statement_close(stmt)
    }

    fn statement_execute(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<bool> {
        self.hit("statement_execute");
        chain.statement_execute(stmt, sql)
    }

    fn statement_execute_update(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<u64> {
        self.hit("statement_execute_update");
        chain.statement_execute_update(stmt, sql)
    }

    fn prepared_set_parameter(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        index: usize,
        value: Value,
    ) -> Result<()> {
        self.hit("prepared_set_parameter");
        chain.prepared_set_parameter(stmt, index, value)
    }

    fn prepared_execute_query(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Box<dyn RawResultSet>> {
        self.hit("prepared_execute_query");
        chain.prepared_execute_query(stmt)
    }

    fn prepared_execute_update(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<u64> {
        self.hit("prepared_execute_update");
        chain.prepared_execute_update(stmt)
    }
}

/// Rejects updates without reaching the driver.
#[derive(Debug, Default)]
pub struct VetoFilter;

impl VetoFilter {
    const MESSAGE: &'static str = "updates are not allowed";
}

impl Filter for VetoFilter {
    fn name(&self) -> &str {
        "veto"
    }

    fn statement_execute_update(
        &self,
        _chain: &mut FilterChain<'_>,
        _stmt: &mut StatementProxy,
        _sql: &str,
    ) -> Result<u64> {
        Err(Error::filter(self.name(), Self::MESSAGE))
    }

    fn prepared_execute_update(
        &self,
        _chain: &mut FilterChain<'_>,
        _stmt: &mut StatementProxy,
    ) -> Result<u64> {
        Err(Error::filter(self.name(), Self::MESSAGE))
    }

    /// Answers from the filter without a driver call.
    fn statement_fetch_size(&self, _chain: &mut FilterChain<'_>, _stmt: &mut StatementProxy) -> Result<u32> {
        Ok(42)
    }
}

/// Refuses every statement close.
#[derive(Debug, Default)]
pub struct RejectCloseFilter;

impl Filter for RejectCloseFilter {
    fn name(&self) -> &str {
        "reject-close"
    }

    fn statement_close(&self, _chain: &mut FilterChain<'_>, _stmt: &mut StatementProxy) -> Result<()> {
        Err(Error::filter(self.name(), "statements stay open"))
    }
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    closed: Mutex<Vec<ConnectionEvent>>,
    errors: Mutex<Vec<ConnectionEvent>>,
    statements: Mutex<Vec<StatementEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn closed(&self) -> Vec<ConnectionEvent> {
        self.closed.lock().clone()
    }

    pub fn errors(&self) -> Vec<ConnectionEvent> {
        self.errors.lock().clone()
    }

    pub fn statements(&self) -> Vec<StatementEvent> {
        self.statements.lock().clone()
    }
}

impl ConnectionEventListener for RecordingListener {
    fn connection_closed(&self, event: &ConnectionEvent) {
        self.closed.lock().push(event.clone());
    }

    fn connection_error_occurred(&self, event: &ConnectionEvent) {
        self.errors.lock().push(event.clone());
    }
}

impl StatementEventListener for RecordingListener {
    fn statement_closed(&self, event: &StatementEvent) {
        self.statements.lock().push(event.clone());
    }
}
