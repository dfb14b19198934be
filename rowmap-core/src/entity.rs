use crate::{DataMap, Result, Value};

/// Lifecycle state carried by every entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    new: bool,
    snapshot: Option<DataMap>,
}

impl Default for EntityState {
    fn default() -> Self {
        Self {
            new: true,
            snapshot: None,
        }
    }
}

/// Object mapped to one table row.
///
/// Implementors expose their fields by name and embed an [`EntityState`], the
/// provided methods build the mutation tracking on top of that. The
/// [`impl_entity!`](crate::impl_entity) macro writes the accessors for plain
/// structs. The columns themselves are registered separately on the
/// [`Registry`](crate::Registry).
pub trait Entity: Default + Send + Sync + 'static {
    /// Type identity of the entity, the last `::` segment is its simple name.
    fn entity_name() -> &'static str;

    /// Current value of `field`, `None` when the entity has no such field.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Writes `value` into `field`. Returns `false` when the entity has no such field.
    fn set_field_value(&mut self, field: &str, value: Value) -> Result<bool>;

    fn state(&self) -> &EntityState;

    fn state_mut(&mut self) -> &mut EntityState;

    fn is_new(&self) -> bool {
        self.state().new
    }

    fn set_new(&mut self, new: bool) {
        self.state_mut().new = new;
    }

    fn snapshot(&self) -> Option<&DataMap> {
        self.state().snapshot.as_ref()
    }

    fn take_snapshot(&mut self, data: DataMap) {
        self.state_mut().snapshot = Some(data);
    }

    fn clear_snapshot(&mut self) {
        self.state_mut().snapshot = None;
    }

    /// Subset of `data` that differs from the last snapshot.
    ///
    /// Without a snapshot every field is dirty. Keys present only in the snapshot
    /// are never reported.
    fn dirty_fields(&self, data: &DataMap) -> DataMap {
        let Some(snapshot) = self.snapshot() else {
            return data.clone();
        };
        data.iter()
            .filter(|(k, v)| snapshot.get(k) != Some(*v))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn is_dirty(&self, data: &DataMap) -> bool {
        !self.dirty_fields(data).is_empty()
    }

    fn before_save_event() -> String {
        format!("{}.before_save", Self::entity_name())
    }

    fn after_save_event() -> String {
        format!("{}.after_save", Self::entity_name())
    }
}

/// Implements [`Entity`](crate::Entity) for a struct whose mapped fields implement
/// [`AsValue`](crate::AsValue) and `Clone`.
///
/// ```rust
/// use rowmap_core::{EntityState, impl_entity};
///
/// #[derive(Default)]
/// struct Account {
///     id: Option<i64>,
///     owner: String,
///     state: EntityState,
/// }
/// impl_entity!(Account, state, [id, owner]);
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($name:ident, $state:ident, [$($field:ident),* $(,)?]) => {
        impl $crate::Entity for $name {
            fn entity_name() -> &'static str {
                concat!(module_path!(), "::", stringify!($name))
            }
            fn field_value(&self, field: &str) -> Option<$crate::Value> {
                match field {
                    $(stringify!($field) => Some($crate::AsValue::as_value(self.$field.clone())),)*
                    _ => None,
                }
            }
            fn set_field_value(&mut self, field: &str, value: $crate::Value) -> $crate::Result<bool> {
                match field {
                    $(stringify!($field) => {
                        self.$field = $crate::ErrorContext::with_context(
                            $crate::AsValue::try_from_value(value),
                            || format!("While setting `{}::{}`", stringify!($name), field),
                        )?;
                        Ok(true)
                    })*
                    _ => Ok(false),
                }
            }
            fn state(&self) -> &$crate::EntityState {
                &self.$state
            }
            fn state_mut(&mut self) -> &mut $crate::EntityState {
                &mut self.$state
            }
        }
    };
}
