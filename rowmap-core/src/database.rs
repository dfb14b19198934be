use crate::{
    AsValue, DataMap, Driver, Entity, Executor, Params, Registry, Result, RowLabeled,
    RowsAffected, SqlWriter, Statement, Value, future::BoxFuture, stream::TryStreamExt,
};
use std::sync::Arc;

type Writer<X> = <<X as Executor>::Driver as Driver>::SqlWriter;

/// Execution layer over one connection.
///
/// Every statement goes through [`Database::resolve_table_names`] first, so raw
/// SQL can refer to tables as `#EntityName`. Parameters are named, keys carry the
/// leading colon.
pub struct Database<X: Executor> {
    executor: X,
    registry: Arc<Registry>,
    writer: Writer<X>,
    last_insert_id: Option<i64>,
}

impl<X: Executor> Database<X> {
    pub fn new(executor: X, registry: Arc<Registry>) -> Self {
        let writer = executor.driver().sql_writer();
        Self {
            executor,
            registry,
            writer,
            last_insert_id: None,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn writer(&self) -> &Writer<X> {
        &self.writer
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    pub fn into_executor(self) -> X {
        self.executor
    }

    pub fn connected(&self) -> bool {
        self.executor.connected()
    }

    pub fn database_name(&self) -> Option<&str> {
        self.executor.database_name()
    }

    pub fn in_transaction(&self) -> bool {
        self.executor.in_transaction()
    }

    /// Identifier generated by the last insert that reported one.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Replaces `#EntityName` tokens with the table of the registered entity.
    ///
    /// Tokens inside single quoted literals, or directly followed by a quote, are kept.
    /// Unknown names are kept as well.
    pub fn resolve_table_names(&self, sql: &str) -> String {
        if !sql.contains('#') {
            return sql.to_string();
        }
        let mut out = String::with_capacity(sql.len() + 16);
        let mut quoted = false;
        let mut chars = sql.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\'' => {
                    quoted = !quoted;
                    out.push(c);
                }
                '\\' if quoted => {
                    out.push(c);
                    if let Some((_, c)) = chars.next() {
                        out.push(c);
                    }
                }
                '#' if !quoted => {
                    let start = i + 1;
                    let len = sql[start..]
                        .bytes()
                        .take_while(|c| c.is_ascii_alphanumeric() || *c == b'_')
                        .count();
                    let name = &sql[start..start + len];
                    let table = if len > 0 && !sql[start + len..].starts_with('\'') {
                        self.registry
                            .entity_by_simple_name(name)
                            .and_then(|entity| self.registry.table_name_by_type(entity, true).ok())
                    } else {
                        None
                    };
                    match table {
                        Some(table) => {
                            out.push_str(&table);
                            for _ in 0..len {
                                chars.next();
                            }
                        }
                        None => out.push(c),
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }

    fn statement(&self, sql: &str, params: Params) -> Statement {
        let statement = Statement::new(self.resolve_table_names(sql), params);
        log::debug!("{}", statement);
        statement
    }

    /// Runs a statement and returns every row.
    pub async fn query(&mut self, sql: &str, params: Params) -> Result<Vec<RowLabeled>> {
        let statement = self.statement(sql, params);
        self.executor.fetch(statement).try_collect().await
    }

    /// Runs a statement and returns the affected rows.
    pub async fn execute(&mut self, sql: &str, params: Params) -> Result<RowsAffected> {
        let statement = self.statement(sql, params);
        let result = self.executor.execute(statement).await?;
        if result.last_affected_id.is_some() {
            self.last_insert_id = result.last_affected_id;
        }
        Ok(result)
    }

    /// First row, `None` when nothing matched.
    pub async fn fetch(&mut self, sql: &str, params: Params) -> Result<Option<DataMap>> {
        Ok(self
            .query(sql, params)
            .await?
            .into_iter()
            .next()
            .map(RowLabeled::into_data_map))
    }

    pub async fn fetch_all(&mut self, sql: &str, params: Params) -> Result<Vec<DataMap>> {
        Ok(self
            .query(sql, params)
            .await?
            .into_iter()
            .map(RowLabeled::into_data_map)
            .collect())
    }

    /// First row turned into an entity marked as persisted.
    pub async fn fetch_entity<E: Entity>(&mut self, sql: &str, params: Params) -> Result<Option<E>> {
        match self.fetch(sql, params).await? {
            Some(row) => Ok(Some(self.hydrate(row)?)),
            None => Ok(None),
        }
    }

    pub async fn fetch_all_entities<E: Entity>(&mut self, sql: &str, params: Params) -> Result<Vec<E>> {
        let rows = self.fetch_all(sql, params).await?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// First column of every row.
    pub async fn fetch_column(&mut self, sql: &str, params: Params) -> Result<Vec<Value>> {
        Ok(self
            .query(sql, params)
            .await?
            .into_iter()
            .filter_map(|row| row.values.into_vec().into_iter().next())
            .collect())
    }

    /// First column of the first row.
    pub async fn fetch_one(&mut self, sql: &str, params: Params) -> Result<Option<Value>> {
        Ok(self.fetch_column(sql, params).await?.into_iter().next())
    }

    /// [`Database::fetch_one`] converted to `T`.
    pub async fn fetch_scalar<T: AsValue>(&mut self, sql: &str, params: Params) -> Result<Option<T>> {
        match self.fetch_one(sql, params).await? {
            Some(v) if !v.is_null() => Ok(Some(T::try_from_value(v)?)),
            _ => Ok(None),
        }
    }

    /// Builds an entity out of a row and marks it as persisted.
    pub fn hydrate<E: Entity>(&self, row: DataMap) -> Result<E> {
        let mut entity = E::default();
        self.registry.set_by_data_array(&mut entity, row)?;
        entity.set_new(false);
        Ok(entity)
    }

    /// Inserts `data` into `table` and returns the generated identifier, if any.
    pub async fn insert(&mut self, table: &str, data: &DataMap) -> Result<Option<i64>> {
        let mut sql = String::new();
        self.writer.write_insert(&mut sql, table, data.keys());
        let params = data
            .iter()
            .map(|(k, v)| (format!(":{k}"), v.clone()))
            .collect();
        Ok(self.execute(&sql, params).await?.last_affected_id)
    }

    /// Updates the rows of `table` matching `condition`, every row without one.
    pub async fn update(
        &mut self,
        table: &str,
        data: &DataMap,
        condition: Option<&str>,
        params: Params,
    ) -> Result<RowsAffected> {
        let mut sql = String::new();
        self.writer.write_update(&mut sql, table, data.keys(), condition);
        let mut all = data
            .iter()
            .map(|(k, v)| (format!(":set_{k}"), v.clone()))
            .collect::<Params>();
        all.extend(params);
        self.execute(&sql, all).await
    }

    pub async fn delete(&mut self, table: &str, condition: Option<&str>, params: Params) -> Result<RowsAffected> {
        let mut sql = String::new();
        self.writer.write_delete(&mut sql, table, condition);
        self.execute(&sql, params).await
    }

    /// `:in0, :in1, ...` fragment with its parameters, for `field in (...)`.
    pub fn in_condition<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> (String, Params) {
        self.in_condition_with_prefix("in", values)
    }

    pub fn in_condition_with_prefix<V: Into<Value>>(
        &self,
        prefix: &str,
        values: impl IntoIterator<Item = V>,
    ) -> (String, Params) {
        let params = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!(":{prefix}{i}"), v.into()))
            .collect::<Params>();
        (params.keys().collect::<Vec<_>>().join(","), params)
    }

    pub fn escape_name(&self, name: &str) -> String {
        self.writer.escape_name(name)
    }

    /// Escapes the `like` wildcards, the pattern is meant to be used with the default `\` escape.
    pub fn escape_like(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 4);
        for c in value.chars() {
            if matches!(c, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    pub async fn begin_transaction(&mut self) -> Result<()> {
        self.executor.begin().await
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.executor.commit().await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.executor.rollback().await
    }

    /// Runs `work` inside a transaction.
    ///
    /// Commits when `work` succeeds. On failure rolls back and returns the error of
    /// `work` unchanged, a failing rollback is only logged.
    ///
    /// ```ignore
    /// db.run_in_transaction(|db| async move {
    ///     db.execute("delete from #TestUser", Params::new()).await?;
    ///     Ok(())
    /// }.boxed()).await?;
    /// ```
    pub async fn run_in_transaction<T, F>(&mut self, work: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T>>,
    {
        self.begin_transaction().await?;
        match work(self).await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(e) = self.rollback().await {
                    log::error!("{:#}", e.context("While rolling back a failed transaction"));
                }
                Err(error)
            }
        }
    }
}
