use crate::{Executor, Result, SqlWriter};

/// Backend family: its SQL dialect and the way to open connections.
pub trait Driver: Default + Send + Sync {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}

pub trait Connection: Executor {
    /// Creates a connection to `url`. The backend is contacted only when the first
    /// statement runs.
    fn connect(url: &str) -> Result<Self>
    where
        Self: Sized;
}
