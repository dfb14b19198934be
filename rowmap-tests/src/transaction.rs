use crate::{
    TestUser,
    database::{clear_users, count_users, insert_user},
    drop_tables, recreate_tables, silent_logs,
};
use rowmap::{Connection, Database, Entity, Error, QueryExecutor, data_map, future::FutureExt};

pub async fn transaction<C: Connection>(db: &mut Database<C>) {
    let qe = QueryExecutor::new(db.registry().clone());
    recreate_tables(db, &qe).await;
    let table = db
        .registry()
        .table_name(TestUser::entity_name())
        .expect("TestUser is registered");

    // Commit
    db.begin_transaction()
        .await
        .expect("Could not begin a transaction");
    assert!(db.in_transaction());
    insert_user(db, &table, "Alice", "", false).await;
    db.commit().await.expect("Failed to commit the transaction");
    assert!(!db.in_transaction());
    assert_eq!(count_users(db).await, 1);
    clear_users(db).await;

    // Rollback
    db.begin_transaction()
        .await
        .expect("Could not begin a transaction");
    insert_user(db, &table, "Alice", "", false).await;
    db.rollback()
        .await
        .expect("Failed to roll back the transaction");
    assert!(!db.in_transaction());
    assert_eq!(count_users(db).await, 0);

    // Transactions are flat
    db.begin_transaction()
        .await
        .expect("Could not begin a transaction");
    assert!(db.begin_transaction().await.is_err());
    db.rollback()
        .await
        .expect("Failed to roll back the transaction");
    assert!(db.commit().await.is_err());
    assert!(db.rollback().await.is_err());

    // Closure committed
    let name = table.clone();
    let id = db
        .run_in_transaction(move |db| {
            async move {
                let id = db.insert(&name, &data_map! { "name" => "Alice" }).await?;
                Ok::<_, Error>(id)
            }
            .boxed()
        })
        .await
        .expect("Transaction did not succeed");
    assert!(id.is_some_and(|v| v > 0));
    assert!(!db.in_transaction());
    assert_eq!(count_users(db).await, 1);
    clear_users(db).await;

    // Closure failing
    let name = table.clone();
    let result = db
        .run_in_transaction(move |db| {
            async move {
                db.insert(&name, &data_map! { "name" => "Alice" }).await?;
                Err::<(), _>(Error::msg("Forced failure"))
            }
            .boxed()
        })
        .await;
    let error = result.expect_err("The transaction must fail");
    assert_eq!(error.to_string(), "Forced failure");
    assert!(!db.in_transaction());
    assert_eq!(count_users(db).await, 0);

    // Backend failing, `name` cannot be null
    let name = table.clone();
    let result;
    silent_logs! {
        result = db
            .run_in_transaction(move |db| {
                async move {
                    db.insert(&name, &data_map! { "name" => "Alice" }).await?;
                    db.insert(&name, &data_map! { "email" => "nobody@test.com" }).await?;
                    Ok::<_, Error>(())
                }
                .boxed()
            })
            .await;
    }
    assert!(result.is_err());
    assert!(!db.in_transaction());
    assert_eq!(count_users(db).await, 0);

    drop_tables(db, &qe).await;
}
