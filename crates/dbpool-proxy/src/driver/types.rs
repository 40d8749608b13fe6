//! Value types exchanged with raw driver handles.

use std::fmt;

/// A bound parameter or fetched column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Declared SQL type for null binds and output parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Decimal,
    Varchar,
    Binary,
    Date,
    Timestamp,
    /// Vendor specific type code.
    Other(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultSetType {
    #[default]
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Concurrency {
    #[default]
    ReadOnly,
    Updatable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Holdability {
    HoldCursorsOverCommit,
    #[default]
    CloseCursorsAtCommit,
}

/// Whether generated keys are made available after an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoGeneratedKeys {
    Return,
    #[default]
    NoReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchDirection {
    #[default]
    Forward,
    Reverse,
    Unknown,
}

/// What happens to the current result set when moving to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MoreResults {
    #[default]
    CloseCurrent,
    KeepCurrent,
    CloseAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionIsolation {
    None,
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Warning reported by a connection or statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub sql_state: Option<String>,
    pub code: i32,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            code: 0,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql_state {
            Some(state) => write!(f, "[{state}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Savepoint handle returned by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Savepoint {
    Unnamed(i32),
    Named(String),
}

impl Savepoint {
    #[must_use]
    pub const fn id(&self) -> Option<i32> {
        match self {
            Self::Unnamed(id) => Some(*id),
            Self::Named(_) => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unnamed(_) => None,
            Self::Named(name) => Some(name),
        }
    }
}

/// Result or parameter column description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable,
        }
    }
}

/// Database and driver identification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseMetadata {
    pub product_name: String,
    pub product_version: String,
    pub driver_name: String,
    pub driver_version: String,
    pub url: Option<String>,
    pub user_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(5), Value::Int(5));
        assert_eq!(Value::from("a"), Value::Text("a".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(true)), Value::Bool(true));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_savepoint_accessors() {
        assert_eq!(Savepoint::Unnamed(3).id(), Some(3));
        assert_eq!(Savepoint::Unnamed(3).name(), None);
        assert_eq!(Savepoint::Named("sp".into()).name(), Some("sp"));
    }

    #[test]
    fn test_warning_display() {
        let mut warning = Warning::new("truncated");
        assert_eq!(warning.to_string(), "truncated");
        warning.sql_state = Some("01004".into());
        assert_eq!(warning.to_string(), "[01004] truncated");
    }
}
