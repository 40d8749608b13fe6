//! Statement kind markers.
//!
//! [`PooledStatement`](super::PooledStatement) is parameterized by one of
//! these markers so prepared and callable operations only exist on handles
//! that can perform them. The traits are sealed: the set of kinds is fixed.

use crate::driver::RawConnection;
use crate::error::DriverResult;
use crate::statement_cache::{CompiledStatement, StatementKey};

pub(crate) mod private {
    /// Marker trait that seals the kind traits.
    pub trait Sealed {}
}

/// Any statement kind.
pub trait StatementKind: private::Sealed {
    const NAME: &'static str;
}

/// Kinds backed by a compiled, cacheable statement.
pub trait PreparedKind: StatementKind {
    /// Compile `key` on the raw connection.
    fn compile(connection: &mut dyn RawConnection, key: &StatementKey)
    -> DriverResult<CompiledStatement>;
}

/// Kinds backed by a compiled stored procedure call.
pub trait CallableKind: PreparedKind {}

/// Uncompiled statement created by `create_statement`.
#[derive(Debug)]
pub enum Plain {}

/// Compiled statement created by `prepare_statement`.
#[derive(Debug)]
pub enum Prepared {}

/// Compiled call created by `prepare_call`.
#[derive(Debug)]
pub enum Callable {}

impl private::Sealed for Plain {}
impl private::Sealed for Prepared {}
impl private::Sealed for Callable {}

impl StatementKind for Plain {
    const NAME: &'static str = "statement";
}

impl StatementKind for Prepared {
    const NAME: &'static str = "prepared";
}

impl StatementKind for Callable {
    const NAME: &'static str = "callable";
}

impl PreparedKind for Prepared {
    fn compile(
        connection: &mut dyn RawConnection,
        key: &StatementKey,
    ) -> DriverResult<CompiledStatement> {
        connection
            .prepare_statement(key.sql(), key.variant())
            .map(CompiledStatement::Prepared)
    }
}

impl PreparedKind for Callable {
    fn compile(
        connection: &mut dyn RawConnection,
        key: &StatementKey,
    ) -> DriverResult<CompiledStatement> {
        connection
            .prepare_call(key.sql(), key.variant())
            .map(CompiledStatement::Callable)
    }
}

impl CallableKind for Callable {}
