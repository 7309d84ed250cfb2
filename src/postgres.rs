//! Blocking Postgres driver built on `sqlx`.
//!
//! Every connection owns a current-thread tokio runtime and blocks the calling thread on it,
//! so a script execution never yields to other tasks.
use crate::driver::{Connection, Connector, DriverError, IsolationLevel, Transaction};
use log::{debug, warn};
use sqlx::error::DatabaseError;
use sqlx::postgres::{PgConnection, PgDatabaseError, PgErrorPosition};
use sqlx::{Connection as _, Postgres};
use tokio::runtime::{Builder, Handle, Runtime};

/// Opens [`PgBlockingConnection`]s from a Postgres connection URL.
///
/// Connections block the calling thread, so [`Connector::open`] refuses to run on a thread
/// that is already driving an async runtime and returns [`DriverError::Other`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

impl Connector for PgConnector {
    type Connection = PgBlockingConnection;

    fn open(&self, connection_string: &str) -> Result<Self::Connection, DriverError> {
        if Handle::try_current().is_ok() {
            return Err(DriverError::other(
                "sqldeploy must not be called from within an async runtime",
            ));
        }
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DriverError::other)?;
        let connection = runtime
            .block_on(PgConnection::connect(connection_string))
            .map_err(|err| driver_error(err, None))?;
        debug!("opened postgres connection");
        Ok(PgBlockingConnection {
            runtime,
            connection: Some(connection),
        })
    }
}

#[derive(Debug)]
pub struct PgBlockingConnection {
    runtime: Runtime,
    connection: Option<PgConnection>,
}

impl Connection for PgBlockingConnection {
    type Transaction<'c> = PgBlockingTransaction<'c>
    where
        Self: 'c;

    fn begin(&mut self, isolation: IsolationLevel) -> Result<Self::Transaction<'_>, DriverError> {
        let runtime = &self.runtime;
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| DriverError::other("connection is closed"))?;
        let transaction = runtime
            .block_on(connection.begin())
            .map_err(|err| driver_error(err, None))?;

        let mut transaction = PgBlockingTransaction {
            runtime,
            transaction: Some(transaction),
        };
        transaction.execute(isolation.set_transaction_sql())?;
        debug!("began transaction at {isolation} isolation");
        Ok(transaction)
    }
}

impl Drop for PgBlockingConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(err) = self.runtime.block_on(connection.close()) {
                warn!("failed to close postgres connection: {err}");
            }
        }
    }
}

/// An open transaction. Rolled back on drop unless [`Transaction::commit`] was called.
pub struct PgBlockingTransaction<'c> {
    runtime: &'c Runtime,
    transaction: Option<sqlx::Transaction<'c, Postgres>>,
}

impl Transaction for PgBlockingTransaction<'_> {
    fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        let transaction = self
            .transaction
            .as_mut()
            .ok_or_else(|| DriverError::other("transaction is finished"))?;
        let result = self
            .runtime
            .block_on(sqlx::Executor::execute(&mut **transaction, sql))
            .map_err(|err| driver_error(err, Some(sql)))?;
        Ok(result.rows_affected())
    }

    fn commit(mut self) -> Result<(), DriverError> {
        let transaction = self
            .transaction
            .take()
            .ok_or_else(|| DriverError::other("transaction is finished"))?;
        self.runtime
            .block_on(transaction.commit())
            .map_err(|err| driver_error(err, None))
    }
}

impl Drop for PgBlockingTransaction<'_> {
    fn drop(&mut self) {
        if let Some(transaction) = self.transaction.take() {
            debug!("rolling back uncommitted transaction");
            if let Err(err) = self.runtime.block_on(transaction.rollback()) {
                warn!("failed to roll back transaction: {err}");
            }
        }
    }
}

/// Classify a `sqlx` error. Errors raised by the server keep their SQLSTATE, message,
/// context and, when `sql` is the text that was sent, the line the server pointed at.
fn driver_error(err: sqlx::Error, sql: Option<&str>) -> DriverError {
    let sqlx::Error::Database(db_err) = &err else {
        return DriverError::other(err);
    };

    let (line, procedure) = match db_err.try_downcast_ref::<PgDatabaseError>() {
        Some(pg_err) => {
            let line = match (sql, pg_err.position()) {
                (Some(sql), Some(PgErrorPosition::Original(position))) => line_at(sql, position),
                _ => None,
            };
            let procedure = pg_err
                .r#where()
                .or_else(|| pg_err.routine())
                .map(str::to_owned);
            (line, procedure)
        }
        None => (None, None),
    };
    let code = db_err.code().map(|code| code.into_owned());
    let message = db_err.message().to_owned();

    DriverError::Engine {
        line,
        procedure,
        code,
        message,
        source: Box::new(err),
    }
}

/// One-based line holding the one-based character `position` of `sql`.
fn line_at(sql: &str, position: usize) -> Option<u32> {
    let preceding = position.checked_sub(1)?;
    let newlines = sql
        .chars()
        .take(preceding)
        .filter(|c| *c == '\n')
        .count();
    u32::try_from(newlines + 1).ok()
}
