//! Pooled connection proxy with filter chains and a per-connection prepared
//! statement cache.
//!
//! A pool hands out [`PooledConnection`]s wrapping a physical connection it
//! owns (a [`ConnectionHolder`]). The proxy layer:
//!
//! - reuses compiled statements per connection through an LRU
//!   [`StatementPool`], keyed by SQL, catalog and statement shape
//! - routes every statement operation through the data source's
//!   [`Filter`]s
//! - tracks explicit transactions and reports them to the data source
//! - gives the holder back to the pool on close instead of closing it
//!
//! The driver itself is abstracted by the traits in [`driver`].
//!
//! # Example
//!
//! ```rust,ignore
//! use dbpool_proxy::{ConnectionHolder, PooledConnection};
//!
//! let holder = ConnectionHolder::new(Box::new(raw_connection), data_source.config());
//! let conn = PooledConnection::new(data_source.clone(), holder);
//!
//! let mut stmt = conn.prepare_statement("SELECT name FROM users WHERE id = ?")?;
//! stmt.set_parameter(1, 42_i64)?;
//! let mut rows = stmt.execute_query_prepared()?;
//! while rows.next()? {
//!     println!("{:?}", rows.value(1)?);
//! }
//! stmt.close()?; // back into the connection's statement cache
//! conn.close()?; // holder goes back to the pool
//! ```

pub mod config;
mod connection;
pub mod datasource;
pub mod driver;
mod error;
pub mod event;
pub mod filter;
mod holder;
pub mod observability;
pub mod statement;
pub mod statement_cache;
pub mod stats;
mod transaction;

#[cfg(test)]
mod testing;

pub use config::{DataSourceConfig, DataSourceConfigBuilder, LoggingConfig};
pub use connection::PooledConnection;
pub use datasource::{DataSource, FaultAction};
pub use error::{DriverError, DriverResult, Error, Result};
pub use event::{ConnectionEvent, ConnectionEventListener, StatementEvent, StatementEventListener};
pub use filter::{Filter, FilterChain, LogFilter};
pub use holder::{ConnectionHolder, UnderlyingState};
pub use statement::{
    PooledCallableStatement, PooledPreparedStatement, PooledResultSet, PooledStatement,
    StatementProxy, StatementState,
};
pub use statement_cache::{PreparedStatementHolder, StatementKey, StatementPool, StatementVariant};
pub use stats::{AtomicPoolCounters, CounterSnapshot, Histogram, PoolCounters};
pub use transaction::TransactionInfo;
