//! Connection and statement lifecycle listeners.

use std::sync::Arc;

/// Emitted when a pooled connection is closed or fails fatally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub connection_id: u64,
    pub error: Option<String>,
}

impl ConnectionEvent {
    pub const fn closed(connection_id: u64) -> Self {
        Self {
            connection_id,
            error: None,
        }
    }

    pub fn error(connection_id: u64, error: &impl ToString) -> Self {
        Self {
            connection_id,
            error: Some(error.to_string()),
        }
    }
}

/// Emitted when a pooled prepared statement goes back to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementEvent {
    pub connection_id: u64,
    pub statement_id: u64,
    pub sql: String,
}

pub trait ConnectionEventListener: Send + Sync {
    fn connection_closed(&self, event: &ConnectionEvent);

    fn connection_error_occurred(&self, _event: &ConnectionEvent) {}
}

pub trait StatementEventListener: Send + Sync {
    fn statement_closed(&self, event: &StatementEvent);
}

/// Registration list compared by pointer identity.
pub(crate) struct Listeners<L: ?Sized> {
    entries: Vec<Arc<L>>,
}

impl<L: ?Sized> Listeners<L> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: Arc<L>) {
        self.entries.push(listener);
    }

    /// Removes the first registration of `listener`.
    pub(crate) fn remove(&mut self, listener: &Arc<L>) -> bool {
        self.entries
            .iter()
            .position(|entry| Arc::ptr_eq(entry, listener))
            .map(|index| self.entries.remove(index))
            .is_some()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<L: ?Sized> std::fmt::Debug for Listeners<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}
