use rowmap_core::{Column, ColumnSize, ColumnType, SqlWriter};
use std::fmt::Write;

/// SQLite dialect. Integer primary keys are rowid aliases so they need no
/// auto increment keyword, there is no separate date or time storage class.
#[derive(Default, Debug, Clone, Copy)]
pub struct SQLiteSqlWriter {}

impl SqlWriter for SQLiteSqlWriter {
    fn write_column_type_keyword(&self, out: &mut String, column: &Column) {
        match (&column.column_type, &column.size) {
            (ColumnType::Int | ColumnType::Long | ColumnType::Bool, _) => {
                out.push_str("integer")
            }
            (ColumnType::Float | ColumnType::Double, _) => out.push_str("real"),
            (ColumnType::Numeric, ColumnSize::List(list)) => match list.as_slice() {
                [precision, scale] => {
                    let _ = write!(out, "numeric({precision}, {scale})");
                }
                _ => out.push_str("numeric"),
            },
            (ColumnType::Numeric, _) => out.push_str("numeric"),
            (ColumnType::String, ColumnSize::Length(size)) if column.fixed_size => {
                let _ = write!(out, "char({size})");
            }
            (ColumnType::String, ColumnSize::Length(size)) => {
                let _ = write!(out, "varchar({size})");
            }
            (ColumnType::String, _) => out.push_str("text"),
            (ColumnType::Date | ColumnType::Time | ColumnType::DateTime, _) => {
                out.push_str("text")
            }
            (ColumnType::Blob, _) => out.push_str("blob"),
        }
    }

    fn write_auto_increment(&self, _out: &mut String) {}

    fn write_current_timestamp(&self, out: &mut String) {
        out.push_str("current_timestamp");
    }

    fn write_default_expression(&self, out: &mut String, expression: &str) {
        out.push('(');
        out.push_str(expression);
        out.push(')');
    }

    fn write_is_table_exist(&self, out: &mut String, _db_name: &str, table_name: &str) {
        let _ = write!(
            out,
            "select count(1) from sqlite_master where type = 'table' and name = {table_name}"
        );
    }

    fn write_list_tables(&self, out: &mut String) {
        out.push_str(
            "select name from sqlite_master where type = 'table' and name not like 'sqlite\\_%' escape '\\'",
        );
    }

    fn write_table_columns(&self, out: &mut String, table_name: &str) {
        let _ = write!(out, "select name from pragma_table_info({table_name}) order by cid");
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("begin");
    }
}
