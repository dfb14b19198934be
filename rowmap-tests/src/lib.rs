mod database;
mod entities;
mod entity_manager;
mod events;
mod query_executor;
#[cfg(not(feature = "disable-transactions"))]
mod transaction;

pub use entities::*;
pub use events::*;

use crate::{database::database, entity_manager::entity_manager, query_executor::query_executor};
use log::LevelFilter;
use rowmap::{Connection, Database, Entity, QueryExecutor, RegistryConfig};
use std::{env, sync::Arc};
#[cfg(not(feature = "disable-transactions"))]
use transaction::transaction;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole suite on `connection`, which must not have been used yet.
pub async fn execute_tests<C: Connection>(connection: C) {
    assert!(
        !connection.connected(),
        "The connection must only be established by the first statement"
    );
    let registry = Arc::new(test_registry(RegistryConfig::default()));
    let mut db = Database::new(connection, registry);
    database(&mut db).await;
    assert!(db.connected());
    #[cfg(not(feature = "disable-transactions"))]
    transaction(&mut db).await;
    query_executor(&mut db).await;
    entity_manager(&mut db).await;

    // Same scenarios again, with prefixed tables referred to by `#SimpleName`
    let registry = Arc::new(test_registry(RegistryConfig {
        table_prefix: "rm_".into(),
        use_entity_hash_name: true,
    }));
    let mut db = Database::new(db.into_executor(), registry);
    query_executor(&mut db).await;
    entity_manager(&mut db).await;
}

/// Drops and creates the tables of [`TestUser`] and [`TestPost`], posts reference users.
pub(crate) async fn recreate_tables<C: Connection>(db: &mut Database<C>, qe: &QueryExecutor) {
    qe.drop_table(db, TestPost::entity_name(), true)
        .await
        .expect("Failed to drop the TestPost table");
    qe.drop_table(db, TestUser::entity_name(), true)
        .await
        .expect("Failed to drop the TestUser table");
    qe.create_table(db, TestUser::entity_name(), false)
        .await
        .expect("Failed to create the TestUser table");
    qe.create_table(db, TestPost::entity_name(), false)
        .await
        .expect("Failed to create the TestPost table");
}

/// Drops the tables created by [`recreate_tables`].
pub(crate) async fn drop_tables<C: Connection>(db: &mut Database<C>, qe: &QueryExecutor) {
    qe.drop_table(db, TestPost::entity_name(), true)
        .await
        .expect("Failed to drop the TestPost table");
    qe.drop_table(db, TestUser::entity_name(), true)
        .await
        .expect("Failed to drop the TestUser table");
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
