//! Per-connection transaction record.

use std::time::{Duration, Instant, SystemTime};

/// Statements executed inside one explicit transaction.
///
/// Created lazily when a statement runs with auto-commit off, finished on
/// commit or rollback.
#[derive(Debug, Clone)]
pub struct TransactionInfo {
    id: u64,
    started_at: SystemTime,
    start: Instant,
    ended_at: Option<SystemTime>,
    duration: Option<Duration>,
    sql_list: Vec<String>,
}

impl TransactionInfo {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            started_at: SystemTime::now(),
            start: Instant::now(),
            ended_at: None,
            duration: None,
            sql_list: Vec::new(),
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub const fn ended_at(&self) -> Option<SystemTime> {
        self.ended_at
    }

    pub const fn is_finished(&self) -> bool {
        self.duration.is_some()
    }

    /// SQL texts in execution order.
    pub fn sql_list(&self) -> &[String] {
        &self.sql_list
    }

    pub(crate) fn record(&mut self, sql: &str) {
        self.sql_list.push(sql.to_string());
    }

    /// Stamp the end time. Later calls keep the first stamp.
    pub(crate) fn finish(&mut self) {
        if self.duration.is_none() {
            self.ended_at = Some(SystemTime::now());
            self.duration = Some(self.start.elapsed());
        }
    }

    /// Elapsed time so far, or the final duration once finished.
    pub fn duration(&self) -> Duration {
        self.duration.unwrap_or_else(|| self.start.elapsed())
    }

    pub fn duration_millis(&self) -> u64 {
        u64::try_from(self.duration().as_millis()).unwrap_or(u64::MAX)
    }
}
