use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::driver::{RawResultSet, Value};
use crate::error::Result;

/// Result set returned by a pooled statement.
///
/// Counts the rows read through [`next`](Self::next) and folds the count into
/// the owning statement's fetch-row peak when closed or dropped.
pub struct PooledResultSet {
    raw: Box<dyn RawResultSet>,
    fetched_rows: u64,
    peak: Arc<AtomicU64>,
    closed: bool,
}

impl fmt::Debug for PooledResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResultSet")
            .field("fetched_rows", &self.fetched_rows)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl PooledResultSet {
    pub(crate) fn new(raw: Box<dyn RawResultSet>, peak: Arc<AtomicU64>) -> Self {
        Self {
            raw,
            fetched_rows: 0,
            peak,
            closed: false,
        }
    }

    pub fn next(&mut self) -> Result<bool> {
        let more = self.raw.next()?;
        if more {
            self.fetched_rows += 1;
        }
        Ok(more)
    }

    pub fn column_count(&self) -> usize {
        self.raw.column_count()
    }

    /// Value of column `index` (1-based) in the current row.
    pub fn value(&self, index: usize) -> Result<Value> {
        Ok(self.raw.value(index)?)
    }

    pub const fn fetched_rows(&self) -> u64 {
        self.fetched_rows
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.peak.fetch_max(self.fetched_rows, Ordering::Relaxed);
        Ok(self.raw.close()?)
    }

    /// The driver's own result set.
    pub fn raw(&self) -> &dyn RawResultSet {
        self.raw.as_ref()
    }
}

impl Drop for PooledResultSet {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close result set on drop");
        }
    }
}
