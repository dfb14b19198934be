use crate::{AsValue, Column, DataMap, Entity, MappingError, Params, Result, SqlWriter, Value};
use std::sync::OnceLock;

/// Naming options of a [`Registry`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Prepended to every derived table name.
    pub table_prefix: String,
    /// Emit `#SimpleName` placeholders instead of table names, the
    /// [`Database`](crate::Database) resolves them before running a statement.
    pub use_entity_hash_name: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn fields(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(field) => vec![field.as_str()],
            PrimaryKey::Composite(fields) => fields.iter().map(String::as_str).collect(),
        }
    }
}

/// Primary key value of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Single(Value),
    Composite(Vec<Value>),
}

impl KeyValue {
    pub fn single(value: impl Into<Value>) -> Self {
        KeyValue::Single(value.into())
    }

    pub fn composite<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        KeyValue::Composite(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[Value] {
        match self {
            KeyValue::Single(v) => std::slice::from_ref(v),
            KeyValue::Composite(v) => v,
        }
    }
}

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        KeyValue::Single(value)
    }
}

impl<T: AsValue> From<T> for KeyValue {
    fn from(value: T) -> Self {
        KeyValue::Single(value.as_value())
    }
}

impl From<Vec<Value>> for KeyValue {
    fn from(value: Vec<Value>) -> Self {
        KeyValue::Composite(value)
    }
}

#[derive(Debug)]
struct EntityMetadata {
    name: String,
    columns: Vec<(String, Column)>,
    primary_key: OnceLock<Option<PrimaryKey>>,
}

/// Last `::` segment of an entity type identity.
pub fn simple_name(entity: &str) -> &str {
    entity.rsplit("::").next().unwrap_or(entity)
}

/// Mapping from entity types to their tables and columns.
///
/// Populated once at startup through [`Registry::add_column`], then shared
/// read only (usually behind an `Arc`) by the components that generate and run
/// SQL. Entity types are identified by their full name, lookups also accept the
/// simple name when it is unambiguous.
#[derive(Default, Debug)]
pub struct Registry {
    config: RegistryConfig,
    entities: Vec<EntityMetadata>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            entities: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers `field` of `entity`. Fields keep the registration order, registering
    /// the same field again replaces its column in place.
    pub fn add_column(&mut self, entity: &str, field: impl Into<String>, column: Column) {
        let field = field.into();
        let index = match self.entities.iter().position(|e| e.name == entity) {
            Some(index) => index,
            None => {
                self.entities.push(EntityMetadata {
                    name: entity.to_string(),
                    columns: Vec::new(),
                    primary_key: OnceLock::new(),
                });
                self.entities.len() - 1
            }
        };
        let metadata = &mut self.entities[index];
        match metadata.columns.iter_mut().find(|(f, _)| *f == field) {
            Some((_, c)) => *c = column,
            None => metadata.columns.push((field, column)),
        }
        metadata.primary_key = OnceLock::new();
    }

    /// [`Registry::add_column`] keyed by the entity type.
    pub fn add_entity_column<E: Entity>(&mut self, field: impl Into<String>, column: Column) {
        self.add_column(E::entity_name(), field, column);
    }

    fn entry(&self, entity: &str) -> Result<&EntityMetadata> {
        if let Some(metadata) = self.entities.iter().find(|e| e.name == entity) {
            return Ok(metadata);
        }
        if entity.contains("::") {
            return Err(MappingError::unregistered(entity));
        }
        let mut candidates = self.entities.iter().filter(|e| simple_name(&e.name) == entity);
        match (candidates.next(), candidates.next()) {
            (Some(metadata), None) => Ok(metadata),
            _ => Err(MappingError::unregistered(entity)),
        }
    }

    pub fn is_registered(&self, entity: &str) -> bool {
        self.entry(entity).is_ok()
    }

    /// Full name of the registered entity whose simple name is `simple_name`.
    pub fn entity_by_simple_name(&self, name: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| simple_name(&e.name) == name)
            .map(|e| e.name.as_str())
    }

    /// Table name as used in generated SQL, a `#SimpleName` placeholder in hash mode.
    pub fn table_name(&self, entity: &str) -> Result<String> {
        let metadata = self.entry(entity)?;
        if self.config.use_entity_hash_name {
            return Ok(format!("#{}", simple_name(&metadata.name)));
        }
        self.table_name_by_type(entity, true)
    }

    /// Physical table name, regardless of the hash mode.
    pub fn table_name_by_type(&self, entity: &str, with_prefix: bool) -> Result<String> {
        let metadata = self.entry(entity)?;
        let name = simple_name(&metadata.name).to_lowercase();
        Ok(if with_prefix {
            format!("{}{}", self.config.table_prefix, name)
        } else {
            name
        })
    }

    /// Entity name and [`Registry::table_name`] of every registered entity.
    pub fn table_names(&self) -> Result<Vec<(&str, String)>> {
        self.entities
            .iter()
            .map(|e| Ok((e.name.as_str(), self.table_name(&e.name)?)))
            .collect()
    }

    pub fn table_columns(&self, entity: &str) -> Result<&[(String, Column)]> {
        Ok(&self.entry(entity)?.columns)
    }

    pub fn all_table_columns(&self) -> Vec<(&str, &[(String, Column)])> {
        self.entities
            .iter()
            .map(|e| (e.name.as_str(), e.columns.as_slice()))
            .collect()
    }

    pub fn column(&self, entity: &str, field: &str) -> Result<&Column> {
        self.table_columns(entity)?
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, c)| c)
            .ok_or_else(|| MappingError::unknown_column(entity, field))
    }

    pub fn primary_key(&self, entity: &str) -> Result<Option<&PrimaryKey>> {
        let metadata = self.entry(entity)?;
        let primary_key = metadata.primary_key.get_or_init(|| {
            let mut fields = metadata
                .columns
                .iter()
                .filter(|(_, c)| c.primary_key)
                .map(|(f, _)| f.clone())
                .collect::<Vec<_>>();
            match fields.len() {
                0 => None,
                1 => fields.pop().map(PrimaryKey::Single),
                _ => Some(PrimaryKey::Composite(fields)),
            }
        });
        Ok(primary_key.as_ref())
    }

    fn require_primary_key(&self, entity: &str) -> Result<&PrimaryKey> {
        self.primary_key(entity)?.ok_or_else(|| {
            MappingError::invalid_spec(format!("Entity `{entity}` has no primary key"))
        })
    }

    pub fn is_primary_key_auto_increment(&self, entity: &str) -> Result<bool> {
        Ok(match self.primary_key(entity)? {
            Some(PrimaryKey::Single(field)) => self.column(entity, field)?.auto_increment,
            _ => false,
        })
    }

    /// Condition matching one row by primary key, `` `id` = :pkValue `` or
    /// `` `a` = :pkValue0 and `b` = :pkValue1 `` with names quoted by `writer`.
    pub fn primary_key_condition<W: SqlWriter + ?Sized>(
        &self,
        writer: &W,
        entity: &str,
    ) -> Result<String> {
        Ok(match self.require_primary_key(entity)? {
            PrimaryKey::Single(field) => format!("{} = :pkValue", writer.escape_name(field)),
            PrimaryKey::Composite(fields) => fields
                .iter()
                .enumerate()
                .map(|(i, f)| format!("{} = :pkValue{i}", writer.escape_name(f)))
                .collect::<Vec<_>>()
                .join(" and "),
        })
    }

    /// Parameters of [`Registry::primary_key_condition`] bound to `value`.
    pub fn primary_key_condition_params(&self, entity: &str, value: &KeyValue) -> Result<Params> {
        let mut params = Params::new();
        match (self.require_primary_key(entity)?, value) {
            (PrimaryKey::Single(..), KeyValue::Single(v)) => {
                params.insert(":pkValue", v.clone());
            }
            (PrimaryKey::Single(..), KeyValue::Composite(v)) if v.len() == 1 => {
                params.insert(":pkValue", v[0].clone());
            }
            (PrimaryKey::Composite(fields), KeyValue::Composite(v)) if fields.len() == v.len() => {
                for (i, v) in v.iter().enumerate() {
                    params.insert(format!(":pkValue{i}"), v.clone());
                }
            }
            (key, value) => {
                return Err(MappingError::invalid_spec(format!(
                    "Primary key {:?} of `{entity}` cannot be matched with {:?}",
                    key.fields(),
                    value.values(),
                )));
            }
        }
        Ok(params)
    }

    /// Primary key value contained in a row shaped map, missing fields read as NULL.
    pub fn primary_key_value(&self, entity: &str, data: &DataMap) -> Result<Option<KeyValue>> {
        let get = |field: &str| data.get(field).cloned().unwrap_or_default();
        Ok(match self.primary_key(entity)? {
            None => None,
            Some(PrimaryKey::Single(field)) => Some(KeyValue::Single(get(field))),
            Some(PrimaryKey::Composite(fields)) => {
                Some(KeyValue::Composite(fields.iter().map(|f| get(f)).collect()))
            }
        })
    }

    /// Values of every registered column read off `entity`.
    pub fn fetch_data_array<E: Entity>(&self, entity: &E) -> Result<DataMap> {
        let name = E::entity_name();
        let columns = self.table_columns(name)?;
        let mut result = DataMap::with_capacity(columns.len());
        for (field, _) in columns {
            let value = entity
                .field_value(field)
                .ok_or_else(|| MappingError::unknown_column(name, field.as_str()))?;
            result.insert(field.as_str(), value);
        }
        Ok(result)
    }

    /// Writes `data` onto `entity` and snapshots the result, so the entity reads as clean.
    ///
    /// Every key must be a registered column of the entity. When a key is unknown or a
    /// value does not convert, the entity is left as it was.
    pub fn set_by_data_array<E: Entity>(&self, entity: &mut E, data: DataMap) -> Result<()> {
        let name = E::entity_name();
        let columns = self.table_columns(name)?;
        let mut previous = DataMap::with_capacity(data.len());
        for field in data.keys() {
            let current = columns
                .iter()
                .any(|(f, _)| f == field)
                .then(|| entity.field_value(field))
                .flatten()
                .ok_or_else(|| MappingError::unknown_column(name, field))?;
            previous.insert(field, current);
        }
        for (field, value) in data {
            if let Err(error) = entity.set_field_value(&field, value) {
                for (field, value) in previous {
                    let _ = entity.set_field_value(&field, value);
                }
                return Err(error);
            }
        }
        let snapshot = self.fetch_data_array(entity)?;
        entity.take_snapshot(snapshot);
        Ok(())
    }
}
