use crate::{
    DataMap, Database, Entity, EventEmitter, Executor, KeyValue, MappingError, NoopEvents, Params,
    PrimaryKey, Query, Registry, Result, RowsAffected, SqlWriter, Value,
};
use std::sync::Arc;

/// Maps entity instances to rows: save, lookup and removal by primary key.
///
/// The manager holds no connection, every operation receives the [`Database`] to
/// run on. It is cheap to clone.
#[derive(Clone)]
pub struct EntityManager {
    registry: Arc<Registry>,
    events: Arc<dyn EventEmitter>,
}

impl EntityManager {
    pub fn new(registry: Arc<Registry>, events: Arc<dyn EventEmitter>) -> Self {
        Self { registry, events }
    }

    pub fn without_events(registry: Arc<Registry>) -> Self {
        Self::new(registry, Arc::new(NoopEvents))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn table_name(&self, entity: &str) -> Result<String> {
        self.registry.table_name(entity)
    }

    /// Quoted [`EntityManager::table_name`].
    pub fn safe_table_name<X: Executor>(&self, db: &Database<X>, entity: &str) -> Result<String> {
        Ok(db.escape_name(&self.table_name(entity)?))
    }

    pub fn fetch_data_array<E: Entity>(&self, entity: &E) -> Result<DataMap> {
        self.registry.fetch_data_array(entity)
    }

    pub fn set_by_data_array<E: Entity>(&self, entity: &mut E, data: DataMap) -> Result<()> {
        self.registry.set_by_data_array(entity, data)
    }

    /// Inserts a new entity or writes the changed fields of a persisted one.
    ///
    /// A new entity gets its auto increment key back filled. A persisted entity
    /// without changes sends no statement. Both `before_save` and `after_save` are
    /// emitted either way.
    pub async fn save<X: Executor, E: Entity>(&self, db: &mut Database<X>, entity: &mut E) -> Result<()> {
        let name = E::entity_name();
        let data = self.registry.fetch_data_array(entity)?;
        self.events.emit(&E::before_save_event(), &data);
        if entity.is_new() {
            self.save_new(db, entity, data).await?;
        } else {
            self.save_dirty(db, entity, data).await?;
        }
        let data = self.registry.fetch_data_array(entity)?;
        self.events.emit(&E::after_save_event(), &data);
        log::trace!("Saved an instance of `{name}`");
        Ok(())
    }

    async fn save_new<X: Executor, E: Entity>(
        &self,
        db: &mut Database<X>,
        entity: &mut E,
        mut data: DataMap,
    ) -> Result<()> {
        let name = E::entity_name();
        let auto_increment = match self.registry.primary_key(name)? {
            Some(PrimaryKey::Single(field)) if self.registry.is_primary_key_auto_increment(name)? => {
                Some(field.clone())
            }
            _ => None,
        };
        if let Some(field) = &auto_increment {
            if data.get(field).is_some_and(Value::is_unset_key) {
                data.remove(field);
            }
        }
        let id = self.insert(db, name, data).await?;
        if let (Some(field), Some(id)) = (auto_increment, id) {
            if entity.field_value(&field).is_some_and(|v| v.is_unset_key()) {
                entity.set_field_value(&field, Value::Int64(Some(id)))?;
            }
        }
        entity.set_new(false);
        let data = self.registry.fetch_data_array(entity)?;
        entity.take_snapshot(data);
        Ok(())
    }

    async fn save_dirty<X: Executor, E: Entity>(
        &self,
        db: &mut Database<X>,
        entity: &mut E,
        data: DataMap,
    ) -> Result<()> {
        let name = E::entity_name();
        let dirty = entity.dirty_fields(&data);
        if dirty.is_empty() {
            log::trace!("Nothing changed on `{name}`, skipping the update");
            return Ok(());
        }
        // Matches the row as it was persisted, the key itself may be among the changes.
        let key_source = entity.snapshot().unwrap_or(&data);
        let key = self
            .registry
            .primary_key_value(name, key_source)?
            .ok_or_else(|| MappingError::invalid_spec(format!("Entity `{name}` has no primary key")))?;
        let condition = self.registry.primary_key_condition(db.writer(), name)?;
        let params = self.registry.primary_key_condition_params(name, &key)?;
        self.update(db, name, dirty, Some(&condition), params).await?;
        entity.take_snapshot(data);
        Ok(())
    }

    /// Row with the given primary key, `None` when there is none.
    pub async fn find_by_id<X: Executor, E: Entity>(
        &self,
        db: &mut Database<X>,
        id: impl Into<KeyValue>,
    ) -> Result<Option<E>> {
        let name = E::entity_name();
        let mut query = Query::new(name);
        query.add_condition(
            self.registry.primary_key_condition(db.writer(), name)?,
            self.registry.primary_key_condition_params(name, &id.into())?,
        );
        let mut sql = String::new();
        db.writer().write_find_all(&mut sql, &self.registry, &query)?;
        db.fetch_entity(&sql, query.variables).await
    }

    pub async fn delete_by_id<X: Executor>(
        &self,
        db: &mut Database<X>,
        entity: &str,
        id: impl Into<KeyValue>,
    ) -> Result<RowsAffected> {
        let table = self.registry.table_name(entity)?;
        let condition = self.registry.primary_key_condition(db.writer(), entity)?;
        let params = self.registry.primary_key_condition_params(entity, &id.into())?;
        db.delete(&table, Some(&condition), params).await
    }

    /// Deletes every row whose primary key is in `ids`.
    pub async fn delete_by_ids<X: Executor, K: Into<KeyValue>>(
        &self,
        db: &mut Database<X>,
        entity: &str,
        ids: impl IntoIterator<Item = K>,
    ) -> Result<RowsAffected> {
        let ids = ids.into_iter().map(Into::into).collect::<Vec<KeyValue>>();
        if ids.is_empty() {
            return Ok(RowsAffected::default());
        }
        let table = self.registry.table_name(entity)?;
        let (condition, params) = match self.registry.primary_key(entity)? {
            Some(PrimaryKey::Single(field)) => {
                let values = ids
                    .into_iter()
                    .map(|id| match id {
                        KeyValue::Single(v) => Ok(v),
                        KeyValue::Composite(mut v) if v.len() == 1 => Ok(v.remove(0)),
                        KeyValue::Composite(v) => Err(MappingError::invalid_spec(format!(
                            "Primary key `{field}` of `{entity}` cannot be matched with {v:?}"
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let (list, params) = db.in_condition(values);
                (format!("{} in ({list})", db.escape_name(field)), params)
            }
            _ => {
                let single = self.registry.primary_key_condition(db.writer(), entity)?;
                let mut conditions = Vec::with_capacity(ids.len());
                let mut params = Params::new();
                for (i, id) in ids.iter().enumerate() {
                    let prefix = format!(":pk{i}_");
                    conditions.push(format!("({})", single.replace(":pkValue", &prefix)));
                    for (k, v) in self.registry.primary_key_condition_params(entity, id)? {
                        params.insert(k.replacen(":pkValue", &prefix, 1), v);
                    }
                }
                (conditions.join(" or "), params)
            }
        };
        db.delete(&table, Some(&condition), params).await
    }

    /// Inserts raw row data for `entity`, returns the generated identifier if any.
    pub async fn insert<X: Executor>(
        &self,
        db: &mut Database<X>,
        entity: &str,
        data: DataMap,
    ) -> Result<Option<i64>> {
        let table = self.registry.table_name(entity)?;
        db.insert(&table, &data).await
    }

    /// Updates raw row data of `entity`, every row when `condition` is `None`.
    pub async fn update<X: Executor>(
        &self,
        db: &mut Database<X>,
        entity: &str,
        data: DataMap,
        condition: Option<&str>,
        params: Params,
    ) -> Result<RowsAffected> {
        let table = self.registry.table_name(entity)?;
        db.update(&table, &data, condition, params).await
    }
}
