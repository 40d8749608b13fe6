//! Statement interceptors
//!
//! A [`Filter`] sees every statement operation on its way to the driver. All
//! methods forward to the [`FilterChain`] by default, so an implementation
//! overrides only the operation kinds it cares about. Returning without
//! calling the chain short-circuits the operation.
//!
//! # Available Filters
//!
//! - [`LogFilter`] - tracing spans and outcome logs for executions and closes

mod chain;
mod log;

use std::time::Duration;

pub use chain::FilterChain;
pub use log::LogFilter;

use crate::driver::{
    AutoGeneratedKeys, ColumnDescription, Concurrency, FetchDirection, Holdability, MoreResults,
    RawResultSet, ResultSetType, SqlType, Value, Warning,
};
use crate::error::Result;
use crate::statement::StatementProxy;

pub trait Filter: Send + Sync {
    /// Name used in logs and in [`Error::Filter`](crate::Error::Filter).
    fn name(&self) -> &str;

    fn statement_add_batch(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<()> {
        chain.statement_add_batch(stmt, sql)
    }

    fn statement_cancel(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<()> {
        chain.statement_cancel(stmt)
    }

    fn statement_clear_batch(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<()> {
        chain.statement_clear_batch(stmt)
    }

    fn statement_clear_warnings(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<()> {
        chain.statement_clear_warnings(stmt)
    }

    fn statement_close(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<()> {
        chain.statement_close(stmt)
    }

    fn statement_execute(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<bool> {
        chain.statement_execute(stmt, sql)
    }

    fn statement_execute_with_generated_keys(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<bool> {
        chain.statement_execute_with_generated_keys(stmt, sql, keys)
    }

    fn statement_execute_with_column_indexes(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[u32],
    ) -> Result<bool> {
        chain.statement_execute_with_column_indexes(stmt, sql, columns)
    }

    fn statement_execute_with_column_names(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[&str],
    ) -> Result<bool> {
        chain.statement_execute_with_column_names(stmt, sql, columns)
    }

    fn statement_execute_batch(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Vec<i64>> {
        chain.statement_execute_batch(stmt)
    }

    fn statement_execute_query(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<Box<dyn RawResultSet>> {
        chain.statement_execute_query(stmt, sql)
    }

    fn statement_execute_update(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<u64> {
        chain.statement_execute_update(stmt, sql)
    }

    fn statement_execute_update_with_generated_keys(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<u64> {
        chain.statement_execute_update_with_generated_keys(stmt, sql, keys)
    }

    fn statement_execute_update_with_column_indexes(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[u32],
    ) -> Result<u64> {
        chain.statement_execute_update_with_column_indexes(stmt, sql, columns)
    }

    fn statement_execute_update_with_column_names(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[&str],
    ) -> Result<u64> {
        chain.statement_execute_update_with_column_names(stmt, sql, columns)
    }

    fn statement_fetch_direction(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<FetchDirection> {
        chain.statement_fetch_direction(stmt)
    }

    fn statement_set_fetch_direction(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        direction: FetchDirection,
    ) -> Result<()> {
        chain.statement_set_fetch_direction(stmt, direction)
    }

    fn statement_fetch_size(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<u32> {
        chain.statement_fetch_size(stmt)
    }

    fn statement_set_fetch_size(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        rows: u32,
    ) -> Result<()> {
        chain.statement_set_fetch_size(stmt, rows)
    }

    fn statement_generated_keys(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Box<dyn RawResultSet>> {
        chain.statement_generated_keys(stmt)
    }

    fn statement_max_field_size(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<u32> {
        chain.statement_max_field_size(stmt)
    }

    fn statement_set_max_field_size(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        bytes: u32,
    ) -> Result<()> {
        chain.statement_set_max_field_size(stmt, bytes)
    }

    fn statement_max_rows(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<u64> {
        chain.statement_max_rows(stmt)
    }

    fn statement_set_max_rows(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        rows: u64,
    ) -> Result<()> {
        chain.statement_set_max_rows(stmt, rows)
    }

    fn statement_more_results(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<bool> {
        chain.statement_more_results(stmt)
    }

    fn statement_more_results_with(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        current: MoreResults,
    ) -> Result<bool> {
        chain.statement_more_results_with(stmt, current)
    }

    fn statement_query_timeout(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Duration> {
        chain.statement_query_timeout(stmt)
    }

    fn statement_set_query_timeout(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        timeout: Duration,
    ) -> Result<()> {
        chain.statement_set_query_timeout(stmt, timeout)
    }

    fn statement_result_set(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Option<Box<dyn RawResultSet>>> {
        chain.statement_result_set(stmt)
    }

    fn statement_result_set_concurrency(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Concurrency> {
        chain.statement_result_set_concurrency(stmt)
    }

    fn statement_result_set_holdability(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Holdability> {
        chain.statement_result_set_holdability(stmt)
    }

    fn statement_result_set_type(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<ResultSetType> {
        chain.statement_result_set_type(stmt)
    }

    fn statement_update_count(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Option<u64>> {
        chain.statement_update_count(stmt)
    }

    fn statement_warnings(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Vec<Warning>> {
        chain.statement_warnings(stmt)
    }

    fn statement_is_closed(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<bool> {
        chain.statement_is_closed(stmt)
    }

    fn statement_is_poolable(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<bool> {
        chain.statement_is_poolable(stmt)
    }

    fn statement_set_poolable(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        poolable: bool,
    ) -> Result<()> {
        chain.statement_set_poolable(stmt, poolable)
    }

    fn statement_set_cursor_name(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        name: &str,
    ) -> Result<()> {
        chain.statement_set_cursor_name(stmt, name)
    }

    fn statement_set_escape_processing(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        enable: bool,
    ) -> Result<()> {
        chain.statement_set_escape_processing(stmt, enable)
    }

    fn prepared_set_parameter(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        index: usize,
        value: Value,
    ) -> Result<()> {
        chain.prepared_set_parameter(stmt, index, value)
    }

    fn prepared_set_null(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        index: usize,
        sql_type: SqlType,
    ) -> Result<()> {
        chain.prepared_set_null(stmt, index, sql_type)
    }

    fn prepared_clear_parameters(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<()> {
        chain.prepared_clear_parameters(stmt)
    }

    fn prepared_execute(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<bool> {
        chain.prepared_execute(stmt)
    }

    fn prepared_execute_query(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Box<dyn RawResultSet>> {
        chain.prepared_execute_query(stmt)
    }

    fn prepared_execute_update(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<u64> {
        chain.prepared_execute_update(stmt)
    }

    fn prepared_add_batch(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<()> {
        chain.prepared_add_batch(stmt)
    }

    fn prepared_metadata(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Vec<ColumnDescription>> {
        chain.prepared_metadata(stmt)
    }

    fn prepared_parameter_count(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<usize> {
        chain.prepared_parameter_count(stmt)
    }

    fn callable_register_out_parameter(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        index: usize,
        sql_type: SqlType,
    ) -> Result<()> {
        chain.callable_register_out_parameter(stmt, index, sql_type)
    }

    fn callable_register_out_parameter_by_name(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        name: &str,
        sql_type: SqlType,
    ) -> Result<()> {
        chain.callable_register_out_parameter_by_name(stmt, name, sql_type)
    }

    fn callable_set_parameter_by_name(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        name: &str,
        value: Value,
    ) -> Result<()> {
        chain.callable_set_parameter_by_name(stmt, name, value)
    }

    fn callable_out_value(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        index: usize,
    ) -> Result<Value> {
        chain.callable_out_value(stmt, index)
    }

    fn callable_out_value_by_name(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        name: &str,
    ) -> Result<Value> {
        chain.callable_out_value_by_name(stmt, name)
    }

    fn callable_was_null(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<bool> {
        chain.callable_was_null(stmt)
    }
}
