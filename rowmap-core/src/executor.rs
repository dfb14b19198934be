use crate::{
    Driver, Error, QueryResult, Result, RowLabeled, RowsAffected, SqlWriter, Statement,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Capability to run statements on one logical connection.
///
/// A connection serves one caller at a time, every method takes `&mut self`.
/// Transactions are flat: [`Executor::begin`] while one is active fails.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Whether a physical connection was already established.
    fn connected(&self) -> bool;

    /// Name of the database (schema) this connection works on.
    fn database_name(&self) -> Option<&str>;

    fn in_transaction(&self) -> bool;

    #[doc(hidden)]
    fn set_in_transaction(&mut self, value: bool);

    /// General method to send any statement and return any result type (either row or count).
    fn run(&mut self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the statement and returns the rows.
    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(statement).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the statement and return the total number of rows affected.
    fn execute(&mut self, statement: Statement) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(statement)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if self.in_transaction() {
                return Err(Error::msg(
                    "A transaction is already active on this connection, nested transactions are not supported",
                ));
            }
            let mut sql = String::new();
            self.driver().sql_writer().write_transaction_begin(&mut sql);
            self.execute(sql.into()).await?;
            self.set_in_transaction(true);
            Ok(())
        }
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if !self.in_transaction() {
                return Err(Error::msg("There is no active transaction to commit"));
            }
            let mut sql = String::new();
            self.driver().sql_writer().write_transaction_commit(&mut sql);
            let result = self.execute(sql.into()).await;
            self.set_in_transaction(false);
            result.map(|_| ())
        }
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if !self.in_transaction() {
                return Err(Error::msg("There is no active transaction to roll back"));
            }
            let mut sql = String::new();
            self.driver().sql_writer().write_transaction_rollback(&mut sql);
            let result = self.execute(sql.into()).await;
            self.set_in_transaction(false);
            result.map(|_| ())
        }
    }
}
