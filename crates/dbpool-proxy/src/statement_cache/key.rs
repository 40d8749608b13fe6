//! Statement cache key types

use std::fmt;

use crate::driver::{AutoGeneratedKeys, Concurrency, Holdability, ResultSetType};

/// Call shape a statement was prepared with.
///
/// Each variant carries the parameters of that shape, so the same SQL
/// prepared two different ways never shares a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementVariant {
    /// Prepared with defaults
    Plain,
    /// Prepared with result set type and concurrency
    ResultSet {
        result_set_type: ResultSetType,
        concurrency: Concurrency,
    },
    /// Prepared with result set type, concurrency and holdability
    ResultSetHoldability {
        result_set_type: ResultSetType,
        concurrency: Concurrency,
        holdability: Holdability,
    },
    /// Prepared returning the listed generated columns by index
    ColumnIndexes(Vec<u32>),
    /// Prepared returning the listed generated columns by name
    ColumnNames(Vec<String>),
    /// Prepared with a generated keys flag
    GeneratedKeys(AutoGeneratedKeys),
    /// Stored procedure call with defaults
    Call,
    /// Stored procedure call with result set type and concurrency
    CallResultSet {
        result_set_type: ResultSetType,
        concurrency: Concurrency,
    },
    /// Stored procedure call with result set type, concurrency and holdability
    CallResultSetHoldability {
        result_set_type: ResultSetType,
        concurrency: Concurrency,
        holdability: Holdability,
    },
}

impl StatementVariant {
    /// Whether this variant compiles a callable statement.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(
            self,
            Self::Call | Self::CallResultSet { .. } | Self::CallResultSetHoldability { .. }
        )
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::ResultSet { .. } => "result_set",
            Self::ResultSetHoldability { .. } => "result_set_holdability",
            Self::ColumnIndexes(_) => "column_indexes",
            Self::ColumnNames(_) => "column_names",
            Self::GeneratedKeys(_) => "generated_keys",
            Self::Call => "call",
            Self::CallResultSet { .. } => "call_result_set",
            Self::CallResultSetHoldability { .. } => "call_result_set_holdability",
        }
    }
}

/// Identity of a compiled statement within one connection.
///
/// Two keys are equal iff SQL text, catalog scope and variant (with all of
/// its parameters) are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    sql: String,
    catalog: Option<String>,
    variant: StatementVariant,
}

impl StatementKey {
    pub fn new(sql: impl Into<String>, catalog: Option<String>, variant: StatementVariant) -> Self {
        Self {
            sql: sql.into(),
            catalog,
            variant,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    #[must_use]
    pub const fn variant(&self) -> &StatementVariant {
        &self.variant
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.catalog {
            Some(catalog) => write!(f, "{}:{}:{}", self.variant.as_str(), catalog, self.sql),
            None => write!(f, "{}:{}", self.variant.as_str(), self.sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(sql: &str, catalog: Option<&str>, variant: StatementVariant) -> StatementKey {
        StatementKey::new(sql, catalog.map(ToString::to_string), variant)
    }

    #[test]
    fn test_equal_keys() {
        let a = key("SELECT 1", Some("app"), StatementVariant::Plain);
        let b = key("SELECT 1", Some("app"), StatementVariant::Plain);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_sql_distinguishes() {
        assert_ne!(
            key("SELECT 1", None, StatementVariant::Plain),
            key("SELECT 2", None, StatementVariant::Plain)
        );
    }

    #[test]
    fn test_catalog_distinguishes() {
        assert_ne!(
            key("SELECT 1", Some("a"), StatementVariant::Plain),
            key("SELECT 1", Some("b"), StatementVariant::Plain)
        );
        assert_ne!(
            key("SELECT 1", None, StatementVariant::Plain),
            key("SELECT 1", Some("a"), StatementVariant::Plain)
        );
    }

    #[test]
    fn test_variants_partition_same_sql() {
        let sql = "SELECT * FROM t";
        let variants = [
            StatementVariant::Plain,
            StatementVariant::ResultSet {
                result_set_type: ResultSetType::ForwardOnly,
                concurrency: Concurrency::ReadOnly,
            },
            StatementVariant::ResultSetHoldability {
                result_set_type: ResultSetType::ForwardOnly,
                concurrency: Concurrency::ReadOnly,
                holdability: Holdability::CloseCursorsAtCommit,
            },
            StatementVariant::ColumnIndexes(vec![1]),
            StatementVariant::ColumnNames(vec!["id".into()]),
            StatementVariant::GeneratedKeys(AutoGeneratedKeys::Return),
            StatementVariant::Call,
            StatementVariant::CallResultSet {
                result_set_type: ResultSetType::ForwardOnly,
                concurrency: Concurrency::ReadOnly,
            },
            StatementVariant::CallResultSetHoldability {
                result_set_type: ResultSetType::ForwardOnly,
                concurrency: Concurrency::ReadOnly,
                holdability: Holdability::CloseCursorsAtCommit,
            },
        ];

        let keys: HashSet<_> = variants
            .iter()
            .cloned()
            .map(|variant| key(sql, None, variant))
            .collect();
        assert_eq!(keys.len(), variants.len());
    }

    #[test]
    fn test_variant_parameters_distinguish() {
        assert_ne!(
            key("x", None, StatementVariant::ColumnIndexes(vec![1, 2])),
            key("x", None, StatementVariant::ColumnIndexes(vec![2, 1]))
        );
        assert_ne!(
            key(
                "x",
                None,
                StatementVariant::ResultSet {
                    result_set_type: ResultSetType::ScrollInsensitive,
                    concurrency: Concurrency::ReadOnly,
                }
            ),
            key(
                "x",
                None,
                StatementVariant::ResultSet {
                    result_set_type: ResultSetType::ForwardOnly,
                    concurrency: Concurrency::ReadOnly,
                }
            )
        );
    }

    #[test]
    fn test_is_callable() {
        assert!(StatementVariant::Call.is_callable());
        assert!(!StatementVariant::Plain.is_callable());
        assert!(!StatementVariant::GeneratedKeys(AutoGeneratedKeys::NoReturn).is_callable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            key("SELECT 1", Some("app"), StatementVariant::Plain).to_string(),
            "plain:app:SELECT 1"
        );
        assert_eq!(
            key("{call p}", None, StatementVariant::Call).to_string(),
            "call:{call p}"
        );
    }
}
