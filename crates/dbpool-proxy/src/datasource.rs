//! The pool side of a pooled connection.
//!
//! A connection pool implements [`DataSource`] and hands out
//! [`PooledConnection`](crate::PooledConnection)s wrapping its
//! [`ConnectionHolder`]s. Everything global (filters, counters, recycling,
//! fault policy) is reached through this trait.

use std::sync::Arc;

use crate::config::DataSourceConfig;
use crate::driver::RawStatement;
use crate::error::{DriverResult, Error, Result};
use crate::filter::Filter;
use crate::holder::ConnectionHolder;
use crate::stats::PoolCounters;
use crate::transaction::TransactionInfo;

/// What the connection should do after a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultAction {
    /// Keep using the connection.
    #[default]
    Keep,
    /// The physical connection is broken; disable the handle and discard it.
    Discard,
}

pub trait DataSource: Send + Sync {
    fn config(&self) -> &DataSourceConfig;

    /// Interceptors applied to every statement operation, outermost first.
    fn filters(&self) -> &[Arc<dyn Filter>];

    fn counters(&self) -> &dyn PoolCounters;

    /// Take back a slot from a closed pooled connection.
    fn recycle(&self, holder: ConnectionHolder) -> Result<()>;

    /// Drop a slot whose connection was disabled after a fatal error.
    fn discard(&self, holder: ConnectionHolder) {
        let id = holder.id();
        if let Err(e) = holder.close() {
            tracing::warn!(connection.id = id, error = %e, "failed to close discarded connection");
        }
    }

    /// Apply data source wide settings to a freshly created or reused statement.
    fn init_statement(&self, statement: &mut dyn RawStatement) -> DriverResult<()> {
        if let Some(timeout) = self.config().query_timeout() {
            statement.set_query_timeout(timeout)?;
        }
        Ok(())
    }

    /// Called with every failure before it reaches the caller.
    fn handle_connection_exception(&self, _connection_id: u64, _error: &Error) -> FaultAction {
        FaultAction::Keep
    }

    fn create_transaction_id(&self) -> u64;

    /// Receives every finished transaction.
    fn log_transaction(&self, transaction: &TransactionInfo) {
        tracing::debug!(
            transaction.id = transaction.id(),
            transaction.statements = transaction.sql_list().len(),
            transaction.duration_ms = transaction.duration_millis(),
            "transaction finished"
        );
    }
}
