//! Per-operation dispatch through the configured filters.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::Filter;
use crate::driver::{
    AutoGeneratedKeys, ColumnDescription, Concurrency, FetchDirection, Holdability, MoreResults,
    RawResultSet, ResultSetType, SqlType, Value, Warning,
};
use crate::error::Result;
use crate::statement::StatementProxy;

/// Cursor over the filter list for one operation.
///
/// Each entry point hands control to the next filter, or performs the raw
/// driver call once every filter has run. A chain is built per call and
/// dropped when the call returns.
pub struct FilterChain<'a> {
    filters: &'a [Arc<dyn Filter>],
    pos: usize,
}

impl fmt::Debug for FilterChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .field("pos", &self.pos)
            .finish()
    }
}

impl<'a> FilterChain<'a> {
    pub const fn new(filters: &'a [Arc<dyn Filter>]) -> Self {
        Self { filters, pos: 0 }
    }

    /// Number of filters in the chain.
    pub const fn len(&self) -> usize {
        self.filters.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Index of the next filter to run.
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn next_filter(&mut self) -> Option<&'a dyn Filter> {
        let filter = self.filters.get(self.pos)?;
        self.pos += 1;
        Some(filter.as_ref())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statement
    // ═══════════════════════════════════════════════════════════════════════

    pub fn statement_add_batch(&mut self, stmt: &mut StatementProxy, sql: &str) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_add_batch(self, stmt, sql);
        }
        Ok(stmt.raw_statement_mut()?.add_batch(sql)?)
    }

    pub fn statement_cancel(&mut self, stmt: &mut StatementProxy) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_cancel(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.cancel()?)
    }

    pub fn statement_clear_batch(&mut self, stmt: &mut StatementProxy) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_clear_batch(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.clear_batch()?)
    }

    pub fn statement_clear_warnings(&mut self, stmt: &mut StatementProxy) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_clear_warnings(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.clear_warnings()?)
    }

    /// Terminal step returns the compiled handle to the cache or destroys it.
    pub fn statement_close(&mut self, stmt: &mut StatementProxy) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_close(self, stmt);
        }
        stmt.release()
    }

    pub fn statement_execute(&mut self, stmt: &mut StatementProxy, sql: &str) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute(self, stmt, sql);
        }
        Ok(stmt.raw_statement_mut()?.execute(sql)?)
    }

    pub fn statement_execute_with_generated_keys(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_with_generated_keys(self, stmt, sql, keys);
        }
        Ok(stmt
            .raw_statement_mut()?
            .execute_with_generated_keys(sql, keys)?)
    }

    pub fn statement_execute_with_column_indexes(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[u32],
    ) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_with_column_indexes(self, stmt, sql, columns);
        }
        Ok(stmt
            .raw_statement_mut()?
            .execute_with_column_indexes(sql, columns)?)
    }

    pub fn statement_execute_with_column_names(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[&str],
    ) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_with_column_names(self, stmt, sql, columns);
        }
        Ok(stmt
            .raw_statement_mut()?
            .execute_with_column_names(sql, columns)?)
    }

    pub fn statement_execute_batch(&mut self, stmt: &mut StatementProxy) -> Result<Vec<i64>> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_batch(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.execute_batch()?)
    }

    pub fn statement_execute_query(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<Box<dyn RawResultSet>> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_query(self, stmt, sql);
        }
        Ok(stmt.raw_statement_mut()?.execute_query(sql)?)
    }

    pub fn statement_execute_update(&mut self, stmt: &mut StatementProxy, sql: &str) -> Result<u64> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_update(self, stmt, sql);
        }
        Ok(stmt.raw_statement_mut()?.execute_update(sql)?)
    }

    pub fn statement_execute_update_with_generated_keys(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<u64> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_update_with_generated_keys(self, stmt, sql, keys);
        }
        Ok(stmt
            .raw_statement_mut()?
            .execute_update_with_generated_keys(sql, keys)?)
    }

    pub fn statement_execute_update_with_column_indexes(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[u32],
    ) -> Result<u64> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_update_with_column_indexes(self, stmt, sql, columns);
        }
        Ok(stmt
            .raw_statement_mut()?
            .execute_update_with_column_indexes(sql, columns)?)
    }

    pub fn statement_execute_update_with_column_names(
        &mut self,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[&str],
    ) -> Result<u64> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_execute_update_with_column_names(self, stmt, sql, columns);
        }
        Ok(stmt
            .raw_statement_mut()?
            .execute_update_with_column_names(sql, columns)?)
    }

    pub fn statement_fetch_direction(&mut self, stmt: &mut StatementProxy) -> Result<FetchDirection> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_fetch_direction(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.fetch_direction()?)
    }

    pub fn statement_set_fetch_direction(
        &mut self,
        stmt: &mut StatementProxy,
        direction: FetchDirection,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_fetch_direction(self, stmt, direction);
        }
        Ok(stmt.raw_statement_mut()?.set_fetch_direction(direction)?)
    }

    pub fn statement_fetch_size(&mut self, stmt: &mut StatementProxy) -> Result<u32> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_fetch_size(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.fetch_size()?)
    }

    pub fn statement_set_fetch_size(&mut self, stmt: &mut StatementProxy, rows: u32) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_fetch_size(self, stmt, rows);
        }
        Ok(stmt.raw_statement_mut()?.set_fetch_size(rows)?)
    }

    pub fn statement_generated_keys(
        &mut self,
        stmt: &mut StatementProxy,
    ) -> Result<Box<dyn RawResultSet>> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_generated_keys(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.generated_keys()?)
    }

    pub fn statement_max_field_size(&mut self, stmt: &mut StatementProxy) -> Result<u32> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_max_field_size(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.max_field_size()?)
    }

    pub fn statement_set_max_field_size(
        &mut self,
        stmt: &mut StatementProxy,
        bytes: u32,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_max_field_size(self, stmt, bytes);
        }
        Ok(stmt.raw_statement_mut()?.set_max_field_size(bytes)?)
    }

    pub fn statement_max_rows(&mut self, stmt: &mut StatementProxy) -> Result<u64> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_max_rows(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.max_rows()?)
    }

    pub fn statement_set_max_rows(&mut self, stmt: &mut StatementProxy, rows: u64) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_max_rows(self, stmt, rows);
        }
        Ok(stmt.raw_statement_mut()?.set_max_rows(rows)?)
    }

    pub fn statement_more_results(&mut self, stmt: &mut StatementProxy) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_more_results(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.more_results()?)
    }

    pub fn statement_more_results_with(
        &mut self,
        stmt: &mut StatementProxy,
        current: MoreResults,
    ) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_more_results_with(self, stmt, current);
        }
        Ok(stmt.raw_statement_mut()?.more_results_with(current)?)
    }

    pub fn statement_query_timeout(&mut self, stmt: &mut StatementProxy) -> Result<Duration> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_query_timeout(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.query_timeout()?)
    }

    pub fn statement_set_query_timeout(
        &mut self,
        stmt: &mut StatementProxy,
        timeout: Duration,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_query_timeout(self, stmt, timeout);
        }
        Ok(stmt.raw_statement_mut()?.set_query_timeout(timeout)?)
    }

    pub fn statement_result_set(
        &mut self,
        stmt: &mut StatementProxy,
    ) -> Result<Option<Box<dyn RawResultSet>>> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_result_set(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.result_set()?)
    }

    pub fn statement_result_set_concurrency(
        &mut self,
        stmt: &mut StatementProxy,
    ) -> Result<Concurrency> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_result_set_concurrency(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.result_set_concurrency()?)
    }

    pub fn statement_result_set_holdability(
        &mut self,
        stmt: &mut StatementProxy,
    ) -> Result<Holdability> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_result_set_holdability(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.result_set_holdability()?)
    }

    pub fn statement_result_set_type(&mut self, stmt: &mut StatementProxy) -> Result<ResultSetType> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_result_set_type(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.result_set_type()?)
    }

    pub fn statement_update_count(&mut self, stmt: &mut StatementProxy) -> Result<Option<u64>> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_update_count(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.update_count()?)
    }

    pub fn statement_warnings(&mut self, stmt: &mut StatementProxy) -> Result<Vec<Warning>> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_warnings(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.warnings()?)
    }

    pub fn statement_is_closed(&mut self, stmt: &mut StatementProxy) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_is_closed(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.is_closed()?)
    }

    pub fn statement_is_poolable(&mut self, stmt: &mut StatementProxy) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_is_poolable(self, stmt);
        }
        Ok(stmt.raw_statement_mut()?.is_poolable()?)
    }

    pub fn statement_set_poolable(
        &mut self,
        stmt: &mut StatementProxy,
        poolable: bool,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_poolable(self, stmt, poolable);
        }
        Ok(stmt.raw_statement_mut()?.set_poolable(poolable)?)
    }

    pub fn statement_set_cursor_name(&mut self, stmt: &mut StatementProxy, name: &str) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_cursor_name(self, stmt, name);
        }
        Ok(stmt.raw_statement_mut()?.set_cursor_name(name)?)
    }

    pub fn statement_set_escape_processing(
        &mut self,
        stmt: &mut StatementProxy,
        enable: bool,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.statement_set_escape_processing(self, stmt, enable);
        }
        Ok(stmt.raw_statement_mut()?.set_escape_processing(enable)?)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Prepared statement
    // ═══════════════════════════════════════════════════════════════════════

    pub fn prepared_set_parameter(
        &mut self,
        stmt: &mut StatementProxy,
        index: usize,
        value: Value,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_set_parameter(self, stmt, index, value);
        }
        Ok(stmt.raw_prepared_mut()?.set_parameter(index, value)?)
    }

    pub fn prepared_set_null(
        &mut self,
        stmt: &mut StatementProxy,
        index: usize,
        sql_type: SqlType,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_set_null(self, stmt, index, sql_type);
        }
        Ok(stmt.raw_prepared_mut()?.set_null(index, sql_type)?)
    }

    pub fn prepared_clear_parameters(&mut self, stmt: &mut StatementProxy) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_clear_parameters(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.clear_parameters()?)
    }

    pub fn prepared_execute(&mut self, stmt: &mut StatementProxy) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_execute(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.execute_prepared()?)
    }

    pub fn prepared_execute_query(
        &mut self,
        stmt: &mut StatementProxy,
    ) -> Result<Box<dyn RawResultSet>> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_execute_query(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.execute_query_prepared()?)
    }

    pub fn prepared_execute_update(&mut self, stmt: &mut StatementProxy) -> Result<u64> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_execute_update(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.execute_update_prepared()?)
    }

    pub fn prepared_add_batch(&mut self, stmt: &mut StatementProxy) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_add_batch(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.add_batch_prepared()?)
    }

    pub fn prepared_metadata(&mut self, stmt: &mut StatementProxy) -> Result<Vec<ColumnDescription>> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_metadata(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.metadata()?)
    }

    pub fn prepared_parameter_count(&mut self, stmt: &mut StatementProxy) -> Result<usize> {
        if let Some(filter) = self.next_filter() {
            return filter.prepared_parameter_count(self, stmt);
        }
        Ok(stmt.raw_prepared_mut()?.parameter_count()?)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Callable statement
    // ═══════════════════════════════════════════════════════════════════════

    pub fn callable_register_out_parameter(
        &mut self,
        stmt: &mut StatementProxy,
        index: usize,
        sql_type: SqlType,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.callable_register_out_parameter(self, stmt, index, sql_type);
        }
        Ok(stmt
            .raw_callable_mut()?
            .register_out_parameter(index, sql_type)?)
    }

    pub fn callable_register_out_parameter_by_name(
        &mut self,
        stmt: &mut StatementProxy,
        name: &str,
        sql_type: SqlType,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.callable_register_out_parameter_by_name(self, stmt, name, sql_type);
        }
        Ok(stmt
            .raw_callable_mut()?
            .register_out_parameter_by_name(name, sql_type)?)
    }

    pub fn callable_set_parameter_by_name(
        &mut self,
        stmt: &mut StatementProxy,
        name: &str,
        value: Value,
    ) -> Result<()> {
        if let Some(filter) = self.next_filter() {
            return filter.callable_set_parameter_by_name(self, stmt, name, value);
        }
        Ok(stmt.raw_callable_mut()?.set_parameter_by_name(name, value)?)
    }

    pub fn callable_out_value(&mut self, stmt: &mut StatementProxy, index: usize) -> Result<Value> {
        if let Some(filter) = self.next_filter() {
            return filter.callable_out_value(self, stmt, index);
        }
        Ok(stmt.raw_callable_mut()?.out_value(index)?)
    }

    pub fn callable_out_value_by_name(
        &mut self,
        stmt: &mut StatementProxy,
        name: &str,
    ) -> Result<Value> {
        if let Some(filter) = self.next_filter() {
            return filter.callable_out_value_by_name(self, stmt, name);
        }
        Ok(stmt.raw_callable_mut()?.out_value_by_name(name)?)
    }

    pub fn callable_was_null(&mut self, stmt: &mut StatementProxy) -> Result<bool> {
        if let Some(filter) = self.next_filter() {
            return filter.callable_was_null(self, stmt);
        }
        Ok(stmt.raw_callable_mut()?.was_null()?)
    }
}
