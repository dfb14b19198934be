use rowmap_core::SqlWriter;

/// The provided [`SqlWriter`] methods already speak MySQL and MariaDB.
#[derive(Default, Clone, Copy)]
pub struct MySQLSqlWriter;

impl SqlWriter for MySQLSqlWriter {}
