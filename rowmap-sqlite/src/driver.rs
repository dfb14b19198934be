use crate::{SQLiteConnection, SQLiteSqlWriter};
use rowmap_core::Driver;

#[derive(Default, Debug, Clone, Copy)]
pub struct SQLiteDriver {}

impl SQLiteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SQLiteDriver {
    type Connection = SQLiteConnection;
    type SqlWriter = SQLiteSqlWriter;

    const NAME: &'static str = "sqlite";
    fn sql_writer(&self) -> SQLiteSqlWriter {
        SQLiteSqlWriter {}
    }
}
