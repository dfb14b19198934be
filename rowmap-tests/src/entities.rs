use rowmap::{Action, Column, ColumnType, Entity, EntityState, Registry, RegistryConfig, impl_entity};
use time::{Date, PrimitiveDateTime};

#[derive(Default, Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub created_at: Option<PrimitiveDateTime>,
    pub state: EntityState,
}
impl_entity!(TestUser, state, [id, name, email, active, created_at]);

impl TestUser {
    pub fn new(name: &str, email: &str, active: bool) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            active,
            ..Default::default()
        }
    }
}

#[derive(Default, Debug, Clone)]
pub struct TestPost {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub published_at: Option<Date>,
    pub state: EntityState,
}
impl_entity!(TestPost, state, [id, user_id, title, body, published_at]);

/// Registry with [`TestUser`] and [`TestPost`], in this order.
pub fn test_registry(config: RegistryConfig) -> Registry {
    let mut registry = Registry::new(config);
    register_user(&mut registry);
    register_post(&mut registry);
    registry
}

pub fn register_user(registry: &mut Registry) {
    registry.add_entity_column::<TestUser>(
        "id",
        Column::new(ColumnType::Int)
            .primary_key()
            .auto_increment()
            .not_null(),
    );
    registry.add_entity_column::<TestUser>(
        "name",
        Column::new(ColumnType::String).size(100).not_null(),
    );
    registry.add_entity_column::<TestUser>("email", Column::new(ColumnType::String).size(150));
    registry.add_entity_column::<TestUser>("active", Column::new(ColumnType::Bool).default(false));
    registry.add_entity_column::<TestUser>(
        "created_at",
        Column::new(ColumnType::DateTime).default_now(),
    );
}

pub fn register_post(registry: &mut Registry) {
    registry.add_entity_column::<TestPost>(
        "id",
        Column::new(ColumnType::Int)
            .primary_key()
            .auto_increment()
            .not_null(),
    );
    registry.add_entity_column::<TestPost>(
        "user_id",
        Column::new(ColumnType::Int)
            .not_null()
            .foreign_key([TestUser::entity_name(), "id"])
            .on_delete(Action::Cascade),
    );
    registry.add_entity_column::<TestPost>(
        "title",
        Column::new(ColumnType::String).size(200).not_null(),
    );
    registry.add_entity_column::<TestPost>("body", Column::new(ColumnType::String));
    registry.add_entity_column::<TestPost>("published_at", Column::new(ColumnType::Date));
}
