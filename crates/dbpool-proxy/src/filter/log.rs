//! Tracing filter for statement execution

use std::time::Instant;

use super::{Filter, FilterChain};
use crate::driver::{AutoGeneratedKeys, RawResultSet};
use crate::error::Result;
use crate::statement::StatementProxy;

/// Filter that wraps executions and closes in tracing spans.
///
/// Uses debug-level spans. SQL text is left out of logs unless enabled with
/// [`with_sql`](Self::with_sql), since statements may embed literals.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    log_sql: bool,
}

/// Fields logged for one call, captured before the chain borrows the statement.
struct CallSite {
    statement_id: u64,
    connection_id: u64,
    sql_len: usize,
    sql: Option<String>,
}

impl LogFilter {
    pub const fn new() -> Self {
        Self { log_sql: false }
    }

    #[must_use]
    pub const fn with_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    fn site(&self, stmt: &StatementProxy, sql: Option<&str>) -> CallSite {
        let sql = sql.or_else(|| stmt.sql());
        CallSite {
            statement_id: stmt.id(),
            connection_id: stmt.connection_id(),
            sql_len: sql.map_or(0, str::len),
            sql: if self.log_sql {
                sql.map(ToString::to_string)
            } else {
                None
            },
        }
    }

    fn traced<T>(
        operation: &'static str,
        site: &CallSite,
        call: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let span = tracing::debug_span!(
            "statement",
            otel.name = operation,
            statement.id = site.statement_id,
            connection.id = site.connection_id,
            sql.len = site.sql_len,
            sql = site.sql.as_deref(),
        );
        let _guard = span.enter();

        let start = Instant::now();
        let result = call();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => {
                tracing::debug!(statement.operation = operation, elapsed_ms, "statement ok");
            }
            Err(e) => {
                tracing::warn!(
                    statement.operation = operation,
                    elapsed_ms,
                    error = %e,
                    "statement failed"
                );
            }
        }

        result
    }
}

impl Filter for LogFilter {
    fn name(&self) -> &str {
        "log"
    }

    fn statement_close(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<()> {
        let site = self.site(stmt, None);
        Self::traced("statement.close", &site, || chain.statement_close(stmt))
    }

    fn statement_execute(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<bool> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute", &site, || chain.statement_execute(stmt, sql))
    }

    fn statement_execute_with_generated_keys(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<bool> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute", &site, || {
            chain.statement_execute_with_generated_keys(stmt, sql, keys)
        })
    }

    fn statement_execute_with_column_indexes(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[u32],
    ) -> Result<bool> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute", &site, || {
            chain.statement_execute_with_column_indexes(stmt, sql, columns)
        })
    }

    fn statement_execute_with_column_names(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[&str],
    ) -> Result<bool> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute", &site, || {
            chain.statement_execute_with_column_names(stmt, sql, columns)
        })
    }

    fn statement_execute_batch(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Vec<i64>> {
        let batch = stmt.batch_sql();
        let site = self.site(stmt, Some(&batch));
        Self::traced("statement.execute_batch", &site, || {
            chain.statement_execute_batch(stmt)
        })
    }

    fn statement_execute_query(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<Box<dyn RawResultSet>> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute_query", &site, || {
            chain.statement_execute_query(stmt, sql)
        })
    }

    fn statement_execute_update(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
    ) -> Result<u64> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute_update", &site, || {
            chain.statement_execute_update(stmt, sql)
        })
    }

    fn statement_execute_update_with_generated_keys(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        keys: AutoGeneratedKeys,
    ) -> Result<u64> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute_update", &site, || {
            chain.statement_execute_update_with_generated_keys(stmt, sql, keys)
        })
    }

    fn statement_execute_update_with_column_indexes(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[u32],
    ) -> Result<u64> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute_update", &site, || {
            chain.statement_execute_update_with_column_indexes(stmt, sql, columns)
        })
    }

    fn statement_execute_update_with_column_names(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
        sql: &str,
        columns: &[&str],
    ) -> Result<u64> {
        let site = self.site(stmt, Some(sql));
        Self::traced("statement.execute_update", &site, || {
            chain.statement_execute_update_with_column_names(stmt, sql, columns)
        })
    }

    fn prepared_execute(&self, chain: &mut FilterChain<'_>, stmt: &mut StatementProxy) -> Result<bool> {
        let site = self.site(stmt, None);
        Self::traced("prepared.execute", &site, || chain.prepared_execute(stmt))
    }

    fn prepared_execute_query(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<Box<dyn RawResultSet>> {
        let site = self.site(stmt, None);
        Self::traced("prepared.execute_query", &site, || {
            chain.prepared_execute_query(stmt)
        })
    }

    fn prepared_execute_update(
        &self,
        chain: &mut FilterChain<'_>,
        stmt: &mut StatementProxy,
    ) -> Result<u64> {
        let site = self.site(stmt, None);
        Self::traced("prepared.execute_update", &site, || {
            chain.prepared_execute_update(stmt)
        })
    }
}
