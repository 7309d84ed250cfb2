//! The seam between the executor and a concrete database client.
//!
//! A [`Connector`] opens [`Connection`]s; a connection starts a [`Transaction`] that borrows
//! it. Transactions are only made durable by [`Transaction::commit`]: dropping one without
//! committing must roll it back, and dropping a connection must release it.
use crate::errors::BoxError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Transaction isolation level requested when a transaction begins.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum IsolationLevel {
    /// Lets later batches see earlier, not yet committed, work. The default for deployments.
    #[default]
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Statement that applies this isolation level to the transaction that was just opened.
    pub fn set_transaction_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

impl Display for IsolationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IsolationLevel::ReadUncommitted => "read uncommitted",
            IsolationLevel::ReadCommitted => "read committed",
            IsolationLevel::RepeatableRead => "repeatable read",
            IsolationLevel::Serializable => "serializable",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum DriverError {
    /// a structured error reported by the database engine
    #[error("{message}")]
    Engine {
        /// line inside the executed text, when the engine reports a position
        line: Option<u32>,
        /// procedure or context the error was raised from
        procedure: Option<String>,
        /// engine error number or SQLSTATE
        code: Option<String>,
        message: String,
        #[source]
        source: BoxError,
    },

    /// anything the engine did not report itself
    #[error("{0}")]
    Other(#[source] BoxError),
}

impl DriverError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        DriverError::Other(err.into())
    }

    pub fn is_engine(&self) -> bool {
        matches!(self, DriverError::Engine { .. })
    }
}

pub trait Connector {
    type Connection: Connection;

    /// Open a connection. The connection string is passed through untouched.
    fn open(&self, connection_string: &str) -> Result<Self::Connection, DriverError>;
}

pub trait Connection {
    type Transaction<'c>: Transaction
    where
        Self: 'c;

    fn begin(&mut self, isolation: IsolationLevel) -> Result<Self::Transaction<'_>, DriverError>;
}

pub trait Transaction {
    /// Execute `sql` without reading result rows. Returns the number of affected rows.
    fn execute(&mut self, sql: &str) -> Result<u64, DriverError>;

    fn commit(self) -> Result<(), DriverError>;
}
