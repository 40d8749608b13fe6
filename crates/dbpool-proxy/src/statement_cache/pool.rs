//! Per-connection LRU cache of compiled statements.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::Instant;

use lru::LruCache;

use super::key::StatementKey;
use crate::driver::{RawCallableStatement, RawPreparedStatement, RawStatement};
use crate::error::DriverResult;

/// A compiled raw statement, prepared or callable.
pub enum CompiledStatement {
    Prepared(Box<dyn RawPreparedStatement>),
    Callable(Box<dyn RawCallableStatement>),
}

impl CompiledStatement {
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }

    pub fn as_statement(&self) -> &dyn RawStatement {
        match self {
            Self::Prepared(stmt) => stmt.as_ref(),
            Self::Callable(stmt) => stmt.as_ref(),
        }
    }

    pub fn as_statement_mut(&mut self) -> &mut dyn RawStatement {
        match self {
            Self::Prepared(stmt) => stmt.as_mut(),
            Self::Callable(stmt) => stmt.as_mut(),
        }
    }

    pub fn as_prepared_mut(&mut self) -> &mut dyn RawPreparedStatement {
        match self {
            Self::Prepared(stmt) => stmt.as_mut(),
            Self::Callable(stmt) => stmt.as_mut(),
        }
    }

    pub fn as_callable_mut(&mut self) -> Option<&mut dyn RawCallableStatement> {
        match self {
            Self::Prepared(_) => None,
            Self::Callable(stmt) => Some(stmt.as_mut()),
        }
    }
}

impl fmt::Debug for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepared(_) => f.write_str("CompiledStatement::Prepared"),
            Self::Callable(_) => f.write_str("CompiledStatement::Callable"),
        }
    }
}

/// Cache entry: one compiled statement plus its reuse statistics.
#[derive(Debug)]
pub struct PreparedStatementHolder {
    key: StatementKey,
    statement: CompiledStatement,
    hit_count: u64,
    fetch_row_peak: u64,
    created_at: Instant,
}

impl PreparedStatementHolder {
    pub fn new(key: StatementKey, statement: CompiledStatement) -> Self {
        Self {
            key,
            statement,
            hit_count: 0,
            fetch_row_peak: 0,
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &StatementKey {
        &self.key
    }

    #[must_use]
    pub const fn statement(&self) -> &CompiledStatement {
        &self.statement
    }

    pub const fn statement_mut(&mut self) -> &mut CompiledStatement {
        &mut self.statement
    }

    #[must_use]
    pub const fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub const fn increment_hit_count(&mut self) {
        self.hit_count += 1;
    }

    /// Largest number of rows fetched through this statement in one result.
    #[must_use]
    pub const fn fetch_row_peak(&self) -> u64 {
        self.fetch_row_peak
    }

    pub fn record_fetch_row_peak(&mut self, rows: u64) {
        self.fetch_row_peak = self.fetch_row_peak.max(rows);
    }

    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Physically close the raw statement.
    pub fn close(&mut self) -> DriverResult<()> {
        self.statement.as_statement_mut().close()
    }
}

/// Bounded LRU of idle compiled statements.
///
/// [`take`](Self::take) removes the entry, so a borrowed statement can never
/// be handed out twice. [`put`](Self::put) returns whatever entry it
/// displaced; the caller is responsible for closing it.
pub struct StatementPool {
    cache: LruCache<StatementKey, PreparedStatementHolder>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl fmt::Debug for StatementPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementPool")
            .field("len", &self.cache.len())
            .field("capacity", &self.cache.cap())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("evictions", &self.evictions)
            .finish()
    }
}

impl StatementPool {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub const fn hits(&self) -> u64 {
        self.hits
    }

    pub const fn misses(&self) -> u64 {
        self.misses
    }

    pub const fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn contains(&self, key: &StatementKey) -> bool {
        self.cache.contains(key)
    }

    /// Keys from most to least recently returned.
    pub fn keys(&self) -> impl Iterator<Item = &StatementKey> {
        self.cache.iter().map(|(key, _)| key)
    }

    /// Borrow the entry for `key`, removing it from the pool.
    pub fn take(&mut self, key: &StatementKey) -> Option<PreparedStatementHolder> {
        if let Some(mut holder) = self.cache.pop(key) {
            self.hits += 1;
            holder.increment_hit_count();
            Some(holder)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Return an entry to the pool.
    ///
    /// Yields the least recently used entry when the pool is full, or the
    /// previous entry under the same key.
    pub fn put(&mut self, holder: PreparedStatementHolder) -> Option<PreparedStatementHolder> {
        let key = holder.key().clone();
        self.cache.push(key, holder).map(|(_, displaced)| {
            self.evictions += 1;
            displaced
        })
    }

    /// Remove every idle entry so the caller can close them.
    pub fn drain(&mut self) -> Vec<PreparedStatementHolder> {
        std::iter::from_fn(|| self.cache.pop_lru().map(|(_, holder)| holder)).collect()
    }
}
