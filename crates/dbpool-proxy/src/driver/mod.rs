//! Raw driver capabilities wrapped by the proxy.
//!
//! A driver plugs in by implementing these traits. The proxy never inspects a
//! raw handle beyond these methods; anything driver specific is reachable
//! through the `as_any` / `is_wrapper_for` capability hooks.

mod types;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Duration;

pub use types::{
    AutoGeneratedKeys, ColumnDescription, Concurrency, DatabaseMetadata, FetchDirection,
    Holdability, MoreResults, ResultSetType, Savepoint, SqlType, TransactionIsolation, Value,
    Warning,
};

use crate::error::DriverResult;
use crate::statement_cache::StatementVariant;

/// A physical database connection.
pub trait RawConnection: Send {
    /// Create an uncompiled statement. Only the `Plain`, `ResultSet` and
    /// `ResultSetHoldability` variants are passed here.
    fn create_statement(&mut self, variant: &StatementVariant) -> DriverResult<Box<dyn RawStatement>>;

    fn prepare_statement(
        &mut self,
        sql: &str,
        variant: &StatementVariant,
    ) -> DriverResult<Box<dyn RawPreparedStatement>>;

    fn prepare_call(
        &mut self,
        sql: &str,
        variant: &StatementVariant,
    ) -> DriverResult<Box<dyn RawCallableStatement>>;

    fn native_sql(&mut self, sql: &str) -> DriverResult<String>;

    fn set_auto_commit(&mut self, auto_commit: bool) -> DriverResult<()>;
    fn auto_commit(&mut self) -> DriverResult<bool>;

    fn commit(&mut self) -> DriverResult<()>;
    fn rollback(&mut self) -> DriverResult<()>;
    fn rollback_to_savepoint(&mut self, savepoint: &Savepoint) -> DriverResult<()>;
    fn set_savepoint(&mut self, name: Option<&str>) -> DriverResult<Savepoint>;
    fn release_savepoint(&mut self, savepoint: &Savepoint) -> DriverResult<()>;

    fn close(&mut self) -> DriverResult<()>;
    fn is_closed(&mut self) -> DriverResult<bool>;
    fn is_valid(&mut self, timeout: Duration) -> DriverResult<bool>;

    fn metadata(&mut self) -> DriverResult<DatabaseMetadata>;

    fn set_read_only(&mut self, read_only: bool) -> DriverResult<()>;
    fn is_read_only(&mut self) -> DriverResult<bool>;

    fn set_catalog(&mut self, catalog: &str) -> DriverResult<()>;
    fn catalog(&mut self) -> DriverResult<Option<String>>;

    fn set_transaction_isolation(&mut self, level: TransactionIsolation) -> DriverResult<()>;
    fn transaction_isolation(&mut self) -> DriverResult<TransactionIsolation>;

    fn set_holdability(&mut self, holdability: Holdability) -> DriverResult<()>;
    fn holdability(&mut self) -> DriverResult<Holdability>;

    fn warnings(&mut self) -> DriverResult<Vec<Warning>>;
    fn clear_warnings(&mut self) -> DriverResult<()>;

    fn set_client_info(&mut self, name: &str, value: &str) -> DriverResult<()>;

    fn set_client_info_all(&mut self, properties: &HashMap<String, String>) -> DriverResult<()> {
        for (name, value) in properties {
            self.set_client_info(name, value)?;
        }
        Ok(())
    }

    fn client_info(&mut self, name: &str) -> DriverResult<Option<String>>;
    fn client_info_all(&mut self) -> DriverResult<HashMap<String, String>>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Whether the connection wraps, or itself is, the type behind `type_id`.
    fn is_wrapper_for(&self, _type_id: TypeId) -> bool {
        false
    }
}

/// A plain statement handle.
pub trait RawStatement: Send {
    fn add_batch(&mut self, sql: &str) -> DriverResult<()>;
    fn cancel(&mut self) -> DriverResult<()>;
    fn clear_batch(&mut self) -> DriverResult<()>;
    fn clear_warnings(&mut self) -> DriverResult<()>;
    fn close(&mut self) -> DriverResult<()>;

    fn execute(&mut self, sql: &str) -> DriverResult<bool>;
    fn execute_with_generated_keys(
        &mut self,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> DriverResult<bool>;
    fn execute_with_column_indexes(&mut self, sql: &str, columns: &[u32]) -> DriverResult<bool>;
    fn execute_with_column_names(&mut self, sql: &str, columns: &[&str]) -> DriverResult<bool>;

    /// Per-command update counts of the current batch.
    fn execute_batch(&mut self) -> DriverResult<Vec<i64>>;
    fn execute_query(&mut self, sql: &str) -> DriverResult<Box<dyn RawResultSet>>;

    fn execute_update(&mut self, sql: &str) -> DriverResult<u64>;
    fn execute_update_with_generated_keys(
        &mut self,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> DriverResult<u64>;
    fn execute_update_with_column_indexes(
        &mut self,
        sql: &str,
        columns: &[u32],
    ) -> DriverResult<u64>;
    fn execute_update_with_column_names(
        &mut self,
        sql: &str,
        columns: &[&str],
    ) -> DriverResult<u64>;

    fn fetch_direction(&mut self) -> DriverResult<FetchDirection>;
    fn set_fetch_direction(&mut self, direction: FetchDirection) -> DriverResult<()>;
    fn fetch_size(&mut self) -> DriverResult<u32>;
    fn set_fetch_size(&mut self, rows: u32) -> DriverResult<()>;

    fn generated_keys(&mut self) -> DriverResult<Box<dyn RawResultSet>>;

    fn max_field_size(&mut self) -> DriverResult<u32>;
    fn set_max_field_size(&mut self, bytes: u32) -> DriverResult<()>;
    fn max_rows(&mut self) -> DriverResult<u64>;
    fn set_max_rows(&mut self, rows: u64) -> DriverResult<()>;

    fn more_results(&mut self) -> DriverResult<bool>;
    fn more_results_with(&mut self, current: MoreResults) -> DriverResult<bool>;

    fn query_timeout(&mut self) -> DriverResult<Duration>;
    fn set_query_timeout(&mut self, timeout: Duration) -> DriverResult<()>;

    fn result_set(&mut self) -> DriverResult<Option<Box<dyn RawResultSet>>>;
    fn result_set_concurrency(&mut self) -> DriverResult<Concurrency>;
    fn result_set_holdability(&mut self) -> DriverResult<Holdability>;
    fn result_set_type(&mut self) -> DriverResult<ResultSetType>;

    /// `None` when the current result is a result set or there are no more results.
    fn update_count(&mut self) -> DriverResult<Option<u64>>;

    fn warnings(&mut self) -> DriverResult<Vec<Warning>>;
    fn is_closed(&mut self) -> DriverResult<bool>;

    fn is_poolable(&mut self) -> DriverResult<bool>;
    fn set_poolable(&mut self, poolable: bool) -> DriverResult<()>;
    fn set_cursor_name(&mut self, name: &str) -> DriverResult<()>;
    fn set_escape_processing(&mut self, enable: bool) -> DriverResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn is_wrapper_for(&self, _type_id: TypeId) -> bool {
        false
    }
}

/// A compiled statement with positional parameters (1-based).
pub trait RawPreparedStatement: RawStatement {
    fn set_parameter(&mut self, index: usize, value: Value) -> DriverResult<()>;
    fn set_null(&mut self, index: usize, sql_type: SqlType) -> DriverResult<()>;
    fn clear_parameters(&mut self) -> DriverResult<()>;

    fn execute_prepared(&mut self) -> DriverResult<bool>;
    fn execute_query_prepared(&mut self) -> DriverResult<Box<dyn RawResultSet>>;
    fn execute_update_prepared(&mut self) -> DriverResult<u64>;
    fn add_batch_prepared(&mut self) -> DriverResult<()>;

    fn metadata(&mut self) -> DriverResult<Vec<ColumnDescription>>;
    fn parameter_count(&mut self) -> DriverResult<usize>;
}

/// A compiled stored procedure call.
pub trait RawCallableStatement: RawPreparedStatement {
    fn register_out_parameter(&mut self, index: usize, sql_type: SqlType) -> DriverResult<()>;
    fn register_out_parameter_by_name(&mut self, name: &str, sql_type: SqlType)
    -> DriverResult<()>;
    fn set_parameter_by_name(&mut self, name: &str, value: Value) -> DriverResult<()>;
    fn out_value(&mut self, index: usize) -> DriverResult<Value>;
    fn out_value_by_name(&mut self, name: &str) -> DriverResult<Value>;
    fn was_null(&mut self) -> DriverResult<bool>;
}

/// A forward-only cursor over query results. Column indexes are 1-based.
pub trait RawResultSet: Send {
    fn next(&mut self) -> DriverResult<bool>;
    fn column_count(&self) -> usize;
    fn value(&self, index: usize) -> DriverResult<Value>;
    fn close(&mut self) -> DriverResult<()>;

    fn as_any(&self) -> &dyn Any;
}
