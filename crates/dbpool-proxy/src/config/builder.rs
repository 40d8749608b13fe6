//! Configuration builder

use std::num::NonZeroUsize;
use std::time::Duration;

/// Settings a data source hands to every connection it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceConfig {
    pub pool_prepared_statements: bool,
    pub max_pool_prepared_statement_per_connection: NonZeroUsize,
    pub dup_close_log_enable: bool,
    pub query_timeout: Option<Duration>,
    pub logging: LoggingConfig,
}

impl DataSourceConfig {
    #[must_use]
    pub const fn builder() -> DataSourceConfigBuilder {
        DataSourceConfigBuilder::new()
    }

    /// Whether closed prepared statements are kept for reuse.
    #[must_use]
    pub const fn pool_prepared_statements(&self) -> bool {
        self.pool_prepared_statements
    }

    #[must_use]
    pub const fn max_pool_prepared_statement_per_connection(&self) -> NonZeroUsize {
        self.max_pool_prepared_statement_per_connection
    }

    /// Whether closing an already closed connection is logged.
    #[must_use]
    pub const fn dup_close_log_enable(&self) -> bool {
        self.dup_close_log_enable
    }

    /// Timeout applied to every new statement, if any.
    #[must_use]
    pub const fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    #[must_use]
    pub const fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        DataSourceConfigBuilder::new().build()
    }
}

/// Log output settings used by [`crate::observability::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl LoggingConfig {
    pub const DEFAULT_LOG_LEVEL: &'static str = "info";
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

/// Builder for [`DataSourceConfig`]
#[derive(Debug, Clone)]
pub struct DataSourceConfigBuilder {
    pool_prepared_statements: bool,
    max_pool_prepared_statement_per_connection: NonZeroUsize,
    dup_close_log_enable: bool,
    query_timeout: Option<Duration>,
    log_level: Option<String>,
    json_logs: bool,
}

impl DataSourceConfigBuilder {
    const DEFAULT_MAX_POOLED_STATEMENTS: NonZeroUsize = NonZeroUsize::MIN.saturating_add(9); // 10

    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool_prepared_statements: false,
            max_pool_prepared_statement_per_connection: Self::DEFAULT_MAX_POOLED_STATEMENTS,
            dup_close_log_enable: false,
            query_timeout: None,
            log_level: None,
            json_logs: false,
        }
    }

    #[must_use]
    pub const fn pool_prepared_statements(mut self, enabled: bool) -> Self {
        self.pool_prepared_statements = enabled;
        self
    }

    #[must_use]
    pub const fn max_pool_prepared_statement_per_connection(mut self, max: NonZeroUsize) -> Self {
        self.max_pool_prepared_statement_per_connection = max;
        self
    }

    #[must_use]
    pub const fn dup_close_log_enable(mut self, enabled: bool) -> Self {
        self.dup_close_log_enable = enabled;
        self
    }

    #[must_use]
    pub const fn query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> DataSourceConfig {
        DataSourceConfig {
            pool_prepared_statements: self.pool_prepared_statements,
            max_pool_prepared_statement_per_connection: self
                .max_pool_prepared_statement_per_connection,
            dup_close_log_enable: self.dup_close_log_enable,
            query_timeout: self.query_timeout,
            logging: LoggingConfig {
                log_level: self
                    .log_level
                    .unwrap_or_else(|| LoggingConfig::DEFAULT_LOG_LEVEL.to_string()),
                json_logs: self.json_logs,
            },
        }
    }
}

impl Default for DataSourceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
