use crate::{
    Action, Column, ColumnSize, ColumnType, DefaultValue, Field, MappingError, Query, Registry,
    Result, Source, Value, separated_by,
};
use std::fmt::Write;
use time::{Date, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let mut buffer = ryu::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Upper bound of the row count rendered in a `limit` clause.
pub const MAX_LIMIT: i64 = 1000;

/// Alias given to a nested query used as a source.
pub const SUBQUERY_ALIAS: &str = "subquery";

/// Dialect printer turning column metadata and [`Query`] specifications into SQL text.
///
/// The provided methods speak the MySQL/MariaDB family: backtick quoted identifiers,
/// `:name` placeholders and `limit offset, count`. Other dialects override the
/// fragments that differ. Nothing here touches a connection.
pub trait SqlWriter: Send + Sync {
    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote one identifier segment (`name`) doubling inner quotes.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    /// Quote a possibly dotted name, every segment separately: `db`.`table`.
    fn write_name(&self, out: &mut String, name: &str) {
        separated_by(
            out,
            name.split('.'),
            |out, v| self.write_identifier_quoted(out, v),
            ".",
        );
    }

    fn escape_name(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);
        self.write_name(&mut out, name);
        out
    }

    fn write_table_name(&self, out: &mut String, registry: &Registry, entity: &str) -> Result<()> {
        self.write_name(out, &registry.table_name(entity)?);
        Ok(())
    }

    /// Render a literal. Non finite floats have no SQL literal and are rejected.
    fn write_value(&self, out: &mut String, value: &Value) -> Result<()> {
        match value {
            Value::Null
            | Value::Boolean(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None) => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) if v.is_finite() => write_float!(out, *v),
            Value::Float64(Some(v)) if v.is_finite() => write_float!(out, *v),
            Value::Float32(Some(..)) | Value::Float64(Some(..)) => {
                return Err(MappingError::invalid_spec(format!(
                    "Cannot write the non finite float {value} as a literal"
                )));
            }
            Value::Decimal(Some(v)) => {
                let _ = write!(out, "{}", v);
            }
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v.as_ref()),
            Value::Date(Some(v)) => self.write_value_date(out, v),
            Value::Time(Some(v)) => self.write_value_time(out, v),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(out, v),
        }
        Ok(())
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("null");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push(['0', '1'][value as usize]);
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("x'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "'{:04}-{:02}-{:02}'",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "'{:02}:{:02}:{:02}'",
            value.hour(),
            value.minute(),
            value.second()
        );
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        let _ = write!(
            out,
            "'{:04}-{:02}-{:02} {:02}:{:02}:{:02}'",
            value.year(),
            value.month() as u8,
            value.day(),
            value.hour(),
            value.minute(),
            value.second()
        );
    }

    /// Expression of the current timestamp used by `default now`.
    fn write_current_timestamp(&self, out: &mut String) {
        out.push_str("utc_timestamp()");
    }

    /// Type keyword for `column`, including its size suffix.
    ///
    /// Validates the size first, dialects only override [`SqlWriter::write_column_type_keyword`].
    fn write_column_type(&self, out: &mut String, column: &Column) -> Result<()> {
        match (&column.column_type, &column.size) {
            (ColumnType::Numeric, ColumnSize::List(list)) if list.len() != 2 => {
                Err(MappingError::invalid_spec(format!(
                    "Numeric size must be [precision, scale], got {list:?}"
                )))
            }
            (ColumnType::Numeric, _) | (_, ColumnSize::Unsized | ColumnSize::Length(..)) => {
                self.write_column_type_keyword(out, column);
                Ok(())
            }
            (t, ColumnSize::List(list)) => Err(MappingError::invalid_spec(format!(
                "Only numeric columns take a size list, `{t}` got {list:?}"
            ))),
        }
    }

    /// Dialect keyword of an already validated column type.
    fn write_column_type_keyword(&self, out: &mut String, column: &Column) {
        let size = match &column.size {
            ColumnSize::List(list) => {
                if let [precision, scale] = list.as_slice() {
                    let _ = write!(out, "decimal({precision}, {scale})");
                }
                return;
            }
            ColumnSize::Length(size) => Some(*size),
            ColumnSize::Unsized => None,
        };
        match column.column_type {
            ColumnType::Int => out.push_str("int"),
            ColumnType::Long => out.push_str("bigint"),
            ColumnType::Float => out.push_str("float"),
            ColumnType::Double => out.push_str("double"),
            ColumnType::Numeric => out.push_str("decimal"),
            ColumnType::String => match size {
                None => out.push_str("longtext"),
                Some(..) if column.fixed_size => out.push_str("char"),
                Some(..) => out.push_str("varchar"),
            },
            ColumnType::Bool => {
                out.push_str("tinyint(1)");
                return;
            }
            ColumnType::Date => out.push_str("date"),
            ColumnType::Time => out.push_str("time"),
            ColumnType::DateTime => out.push_str("datetime"),
            ColumnType::Blob => out.push_str("blob"),
        }
        if let Some(size) = size {
            if !matches!(
                column.column_type,
                ColumnType::Date | ColumnType::Time | ColumnType::DateTime
            ) {
                out.push('(');
                write_integer!(out, size);
                out.push(')');
            }
        }
    }

    fn write_auto_increment(&self, out: &mut String) {
        out.push_str(" auto_increment");
    }

    /// Renders ` default ...`, nothing for a null literal.
    fn write_column_default(&self, out: &mut String, column: &Column) -> Result<()> {
        match &column.default {
            None => {}
            Some(DefaultValue::Value(v)) if v.is_null() => {}
            Some(DefaultValue::Value(v)) => {
                let large = match column.column_type {
                    ColumnType::Blob => true,
                    ColumnType::String => column.size == ColumnSize::Unsized,
                    _ => false,
                };
                if large {
                    return Err(MappingError::invalid_spec(format!(
                        "A `{}` column without size cannot have a literal default ({v})",
                        column.column_type
                    )));
                }
                out.push_str(" default ");
                self.write_value(out, v)?;
            }
            Some(DefaultValue::Now) => {
                out.push_str(" default ");
                self.write_current_timestamp(out);
            }
            Some(DefaultValue::Raw(expression)) => {
                out.push_str(" default ");
                self.write_default_expression(out, expression);
            }
        }
        Ok(())
    }

    /// Raw default expression, emitted verbatim.
    fn write_default_expression(&self, out: &mut String, expression: &str) {
        out.push_str(expression);
    }

    /// One DDL column clause: `` `name` type [not null] [auto_increment] [default ...] ``.
    fn write_column_definition(&self, out: &mut String, name: &str, column: &Column) -> Result<()> {
        if column.auto_increment && !column.column_type.is_integer() {
            return Err(MappingError::invalid_spec(format!(
                "Column `{name}` of type `{}` cannot be auto increment",
                column.column_type
            )));
        }
        self.write_identifier_quoted(out, name);
        out.push(' ');
        self.write_column_type(out, column)?;
        if column.not_null {
            out.push_str(" not null");
        }
        if column.auto_increment {
            self.write_auto_increment(out);
        }
        self.write_column_default(out, column)
    }

    fn write_references_action(&self, out: &mut String, action: &Action) {
        out.push_str(action.as_sql());
    }

    /// `foreign key (...) references ...` clause, nothing when the column has no foreign key.
    fn write_foreign_key_definition(
        &self,
        out: &mut String,
        registry: &Registry,
        name: &str,
        column: &Column,
    ) -> Result<()> {
        let Some(target) = &column.foreign_key else {
            return Ok(());
        };
        let [entity, target_column] = target.as_slice() else {
            return Err(MappingError::invalid_spec(format!(
                "Foreign key of `{name}` must be [entity, column], got {target:?}"
            )));
        };
        out.push_str("foreign key (");
        self.write_identifier_quoted(out, name);
        out.push_str(") references ");
        self.write_table_name(out, registry, entity)?;
        out.push_str(" (");
        self.write_identifier_quoted(out, target_column);
        out.push(')');
        if let Some(action) = &column.on_delete {
            out.push_str(" on delete ");
            self.write_references_action(out, action);
        }
        if let Some(action) = &column.on_update {
            out.push_str(" on update ");
            self.write_references_action(out, action);
        }
        Ok(())
    }

    /// `primary key (...)`, nothing when the entity has no primary key.
    fn write_primary_key_definition(
        &self,
        out: &mut String,
        registry: &Registry,
        entity: &str,
    ) -> Result<()> {
        let Some(primary_key) = registry.primary_key(entity)? else {
            return Ok(());
        };
        out.push_str("primary key (");
        separated_by(
            out,
            primary_key.fields(),
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push(')');
        Ok(())
    }

    fn write_create_table(
        &self,
        out: &mut String,
        registry: &Registry,
        entity: &str,
        if_not_exists: bool,
    ) -> Result<()> {
        let columns = registry.table_columns(entity)?;
        out.reserve(64 + columns.len() * 48);
        out.push_str("create table ");
        if if_not_exists {
            out.push_str("if not exists ");
        }
        self.write_table_name(out, registry, entity)?;
        out.push_str(" (\n");
        let mut clauses = Vec::with_capacity(columns.len() + 1);
        for (name, column) in columns {
            let mut clause = String::new();
            self.write_column_definition(&mut clause, name, column)?;
            clauses.push(clause);
        }
        for (name, column) in columns {
            let mut clause = String::new();
            self.write_foreign_key_definition(&mut clause, registry, name, column)?;
            clauses.push(clause);
        }
        let mut clause = String::new();
        self.write_primary_key_definition(&mut clause, registry, entity)?;
        clauses.push(clause);
        out.push_str(
            &clauses
                .into_iter()
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(",\n"),
        );
        out.push_str("\n)");
        Ok(())
    }

    fn write_drop_table(
        &self,
        out: &mut String,
        registry: &Registry,
        entity: &str,
        if_exists: bool,
    ) -> Result<()> {
        out.push_str("drop table ");
        if if_exists {
            out.push_str("if exists ");
        }
        self.write_table_name(out, registry, entity)
    }

    /// Selected field list entry.
    fn write_field(&self, out: &mut String, field: &Field) {
        match field {
            Field::Named(name) => self.write_name(out, name),
            Field::Aliased { alias, field } => {
                self.write_name(out, field);
                out.push_str(" as ");
                self.write_identifier_quoted(out, alias);
            }
            Field::Raw { alias, expression } => {
                out.push_str(expression);
                out.push_str(" as ");
                self.write_identifier_quoted(out, alias);
            }
        }
    }

    /// Table name of an entity, or a nested query as a derived table.
    fn write_source(&self, out: &mut String, registry: &Registry, source: &Source) -> Result<()> {
        match source {
            Source::Entity(entity) => self.write_table_name(out, registry, entity),
            Source::Query(query) => {
                out.push('(');
                self.write_find_all(out, registry, query)?;
                out.push_str(") as ");
                self.write_identifier_quoted(out, SUBQUERY_ALIAS);
                Ok(())
            }
        }
    }

    /// `from`, joins, `where` and `group by` shared by the select statements.
    fn write_select_body(&self, out: &mut String, registry: &Registry, query: &Query) -> Result<()> {
        out.push_str("\nfrom ");
        self.write_source(out, registry, &query.source)?;
        for join in &query.joins {
            out.push('\n');
            out.push_str(join.join_type.as_sql());
            out.push_str(" join ");
            self.write_source(out, registry, &join.source)?;
            out.push_str(" on (");
            out.push_str(&join.on);
            out.push(')');
        }
        if !query.conditions.is_empty() {
            out.push_str("\nwhere ");
            separated_by(
                out,
                &query.conditions,
                |out, v| {
                    out.push('(');
                    out.push_str(v);
                    out.push(')');
                },
                " and ",
            );
        }
        if !query.group_by.is_empty() {
            out.push_str("\ngroup by ");
            out.push_str(&query.group_by.join(", "));
        }
        Ok(())
    }

    /// Names the result set exposes, used to filter the `order by` entries.
    fn selected_fields(&self, registry: &Registry, query: &Query) -> Result<Vec<Field>> {
        if !query.fields.is_empty() {
            return Ok(query.fields.clone());
        }
        Ok(match &query.source {
            Source::Entity(entity) => registry
                .table_columns(entity)?
                .iter()
                .map(|(name, _)| Field::Named(name.clone()))
                .collect(),
            Source::Query(..) => Vec::new(),
        })
    }

    fn write_limit(&self, out: &mut String, offset: i64, max: i64) {
        let offset = offset.max(0);
        let max = max.clamp(1, MAX_LIMIT);
        out.push_str("\nlimit ");
        write_integer!(out, offset);
        out.push_str(", ");
        write_integer!(out, max);
    }

    fn write_find_all(&self, out: &mut String, registry: &Registry, query: &Query) -> Result<()> {
        let fields = self.selected_fields(registry, query)?;
        out.push_str("select ");
        if fields.is_empty() {
            out.push('*');
        }
        separated_by(out, &fields, |out, v| self.write_field(out, v), ", ");
        self.write_select_body(out, registry, query)?;
        let order_by = query
            .order_by
            .iter()
            .filter(|(field, _)| fields.iter().any(|f| f.selected_name() == field.as_str()))
            .collect::<Vec<_>>();
        if !order_by.is_empty() {
            out.push_str("\norder by ");
            separated_by(
                out,
                order_by,
                |out, (field, order)| {
                    self.write_name(out, field);
                    out.push(' ');
                    out.push_str(order.as_sql());
                },
                ", ",
            );
        }
        if let Some(max) = query.max {
            self.write_limit(out, query.offset.unwrap_or(0), max);
        }
        Ok(())
    }

    fn write_find_all_count(&self, out: &mut String, registry: &Registry, query: &Query) -> Result<()> {
        out.push_str("select count(1)");
        self.write_select_body(out, registry, query)
    }

    /// Statement counting the tables named by the two placeholders.
    fn write_is_table_exist(&self, out: &mut String, db_name: &str, table_name: &str) {
        let _ = write!(
            out,
            "select count(1) from information_schema.tables where table_schema = {db_name} and table_name = {table_name}"
        );
    }

    fn write_list_tables(&self, out: &mut String) {
        out.push_str("show tables");
    }

    /// Statement selecting the column names of the table bound to `table_name`.
    fn write_table_columns(&self, out: &mut String, table_name: &str) {
        let _ = write!(
            out,
            "select column_name from information_schema.columns where table_schema = database() and table_name = {table_name} order by ordinal_position"
        );
    }

    /// `insert into` binding every field to the `:field` parameter.
    fn write_insert<'a>(&self, out: &mut String, table: &str, fields: impl IntoIterator<Item = &'a str> + Clone)
    where
        Self: Sized,
    {
        out.push_str("insert into ");
        self.write_name(out, table);
        out.push_str(" (");
        separated_by(
            out,
            fields.clone(),
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push_str(") values (");
        separated_by(
            out,
            fields,
            |out, v| {
                out.push(':');
                out.push_str(v);
            },
            ", ",
        );
        out.push(')');
    }

    /// `update` binding every field to the `:set_field` parameter.
    fn write_update<'a>(
        &self,
        out: &mut String,
        table: &str,
        fields: impl IntoIterator<Item = &'a str>,
        condition: Option<&str>,
    ) where
        Self: Sized,
    {
        out.push_str("update ");
        self.write_name(out, table);
        out.push_str(" set ");
        separated_by(
            out,
            fields,
            |out, v| {
                self.write_identifier_quoted(out, v);
                out.push_str(" = :set_");
                out.push_str(v);
            },
            ", ",
        );
        if let Some(condition) = condition {
            out.push_str(" where ");
            out.push_str(condition);
        }
    }

    fn write_delete(&self, out: &mut String, table: &str, condition: Option<&str>) {
        out.push_str("delete from ");
        self.write_name(out, table);
        if let Some(condition) = condition {
            out.push_str(" where ");
            out.push_str(condition);
        }
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("start transaction");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("commit");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("rollback");
    }
}
