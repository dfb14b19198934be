use crate::{
    AsValue, Database, DataMap, Executor, Field, Params, Query, Registry, Result, SqlWriter, Value,
};
use std::sync::Arc;

/// Runs [`Query`] specifications and the schema statements of registered entities.
#[derive(Clone)]
pub struct QueryExecutor {
    registry: Arc<Registry>,
}

impl QueryExecutor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn is_table_exist<X: Executor>(&self, db: &mut Database<X>, entity: &str) -> Result<bool> {
        let mut sql = String::new();
        db.writer().write_is_table_exist(&mut sql, ":dbName", ":tableName");
        let mut params = Params::new();
        params.insert(":dbName", db.database_name().map(str::to_string));
        params.insert(":tableName", self.registry.table_name_by_type(entity, true)?);
        let count = db.fetch_scalar::<i64>(&sql, params).await?;
        Ok(count.unwrap_or(0) > 0)
    }

    pub async fn create_table<X: Executor>(
        &self,
        db: &mut Database<X>,
        entity: &str,
        if_not_exists: bool,
    ) -> Result<()> {
        let mut sql = String::new();
        db.writer()
            .write_create_table(&mut sql, &self.registry, entity, if_not_exists)?;
        db.execute(&sql, Params::new()).await.map(|_| ())
    }

    pub async fn drop_table<X: Executor>(
        &self,
        db: &mut Database<X>,
        entity: &str,
        if_exists: bool,
    ) -> Result<()> {
        let mut sql = String::new();
        db.writer()
            .write_drop_table(&mut sql, &self.registry, entity, if_exists)?;
        db.execute(&sql, Params::new()).await.map(|_| ())
    }

    pub async fn list_tables<X: Executor>(&self, db: &mut Database<X>) -> Result<Vec<String>> {
        let mut sql = String::new();
        db.writer().write_list_tables(&mut sql);
        db.fetch_column(&sql, Params::new())
            .await?
            .into_iter()
            .map(String::try_from_value)
            .collect()
    }

    pub async fn find_all<X: Executor>(&self, db: &mut Database<X>, query: &Query) -> Result<Vec<DataMap>> {
        let mut sql = String::new();
        db.writer().write_find_all(&mut sql, &self.registry, query)?;
        db.fetch_all(&sql, query.all_params()).await
    }

    /// Values of `column` across the rows matching `query`.
    pub async fn find_all_column<X: Executor>(
        &self,
        db: &mut Database<X>,
        query: &Query,
        column: &str,
    ) -> Result<Vec<Value>> {
        let mut query = query.clone();
        query.set_fields([Field::named(column)]);
        let mut sql = String::new();
        db.writer().write_find_all(&mut sql, &self.registry, &query)?;
        db.fetch_column(&sql, query.all_params()).await
    }

    /// Number of rows matching `query`, ordering and limits are ignored.
    pub async fn find_all_count<X: Executor>(&self, db: &mut Database<X>, query: &Query) -> Result<i64> {
        let mut sql = String::new();
        db.writer()
            .write_find_all_count(&mut sql, &self.registry, query)?;
        Ok(db
            .fetch_scalar::<i64>(&sql, query.all_params())
            .await?
            .unwrap_or(0))
    }

    /// Column names of the table of `entity` as reported by the backend catalogue.
    pub async fn find_columns<X: Executor>(&self, db: &mut Database<X>, entity: &str) -> Result<Vec<String>> {
        let mut sql = String::new();
        db.writer().write_table_columns(&mut sql, ":tableName");
        let mut params = Params::new();
        params.insert(":tableName", self.registry.table_name_by_type(entity, true)?);
        db.fetch_column(&sql, params)
            .await?
            .into_iter()
            .map(String::try_from_value)
            .collect()
    }
}
