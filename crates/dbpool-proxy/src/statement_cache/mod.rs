//! Prepared statement caching
//!
//! Each pooled connection keeps its own [`StatementPool`] of compiled
//! statements keyed by [`StatementKey`]. Closing a pooled statement returns
//! its compiled handle here instead of destroying it, so re-preparing the same
//! SQL with the same call shape skips the driver round trip.

mod key;
mod pool;

pub use key::{StatementKey, StatementVariant};
pub use pool::{CompiledStatement, PreparedStatementHolder, StatementPool};
