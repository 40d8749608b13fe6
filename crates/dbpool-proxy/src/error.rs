//! Error types for the pooled connection layer.
//!
//! Two levels: [`DriverError`] is what a raw driver reports, [`Error`] is what
//! the proxy surfaces. Driver failures are carried through unchanged inside
//! [`Error::Driver`].

use thiserror::Error;

/// Failure reported by a raw driver handle.
///
/// Carries the vendor code and SQLSTATE when the driver provides them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.code.as_ref(), .sql_state.as_deref(), .message))]
pub struct DriverError {
    message: String,
    sql_state: Option<String>,
    code: Option<i32>,
}

fn render(code: Option<&i32>, sql_state: Option<&str>, message: &str) -> String {
    match (code, sql_state) {
        (Some(code), Some(state)) => format!("[{code}] [{state}] {message}"),
        (Some(code), None) => format!("[{code}] {message}"),
        (None, Some(state)) => format!("[{state}] {message}"),
        (None, None) => message.to_string(),
    }
}

/// SQLSTATE class for connection exceptions.
const CONNECTION_EXCEPTION_CLASS: &str = "08";

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            code: None,
        }
    }

    #[must_use]
    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    #[must_use]
    pub const fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Connection-level failure (SQLSTATE class `08`).
    #[must_use]
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::new(message).with_sql_state("08006")
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        self.code
    }

    /// Returns true when the SQLSTATE marks a broken connection.
    #[must_use]
    pub fn is_connection_exception(&self) -> bool {
        self.sql_state
            .as_deref()
            .is_some_and(|state| state.starts_with(CONNECTION_EXCEPTION_CLASS))
    }
}

/// Errors surfaced by pooled connections and statements.
#[derive(Error, Debug)]
pub enum Error {
    #[error("connection is closed")]
    ConnectionClosed,

    #[error("statement is closed")]
    StatementClosed,

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("feature not supported: {0}")]
    NotSupported(&'static str),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("filter '{filter}' rejected the operation: {message}")]
    Filter { filter: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Filter {
            filter: filter.into(),
            message: message.into(),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }

    /// Operation on a closed or disabled connection, or a released statement.
    #[must_use]
    pub const fn is_closed_handle(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::StatementClosed)
    }

    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }

    #[must_use]
    pub const fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }

    #[must_use]
    pub const fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState(_))
    }

    #[must_use]
    pub const fn is_filter(&self) -> bool {
        matches!(self, Self::Filter { .. })
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The underlying driver error, if this is a driver failure.
    #[must_use]
    pub const fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Driver(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by raw driver handles.
pub type DriverResult<T> = std::result::Result<T, DriverError>;
