use crate::{
    RecordingEvents, TestPost, TestUser,
    database::{clear_users, count_users},
    drop_tables, recreate_tables,
};
use rowmap::{
    AsValue, Connection, Database, Entity, EntityManager, KeyValue, Params, QueryExecutor,
    data_map,
};
use std::sync::Arc;
use time::macros::date;

pub async fn entity_manager<C: Connection>(db: &mut Database<C>) {
    let qe = QueryExecutor::new(db.registry().clone());
    let events = Arc::new(RecordingEvents::default());
    let em = EntityManager::new(db.registry().clone(), events.clone());
    let user = TestUser::entity_name();
    recreate_tables(db, &qe).await;
    let safe = em.safe_table_name(db, user).expect("TestUser is registered");

    // Save new
    let mut alice = TestUser::new("Alice", "alice@test.com", true);
    em.save(db, &mut alice).await.expect("Failed to save Alice");
    assert_eq!(count_users(db).await, 1);
    assert!(alice.id > 0, "The auto increment key was not back filled");
    assert!(!alice.is_new());
    let data = em.fetch_data_array(&alice).expect("Failed to read Alice");
    assert!(!alice.is_dirty(&data));
    assert_eq!(
        events.emitted(),
        [TestUser::before_save_event(), TestUser::after_save_event()]
    );

    // Save dirty
    alice.name = "Bob".into();
    let data = em.fetch_data_array(&alice).expect("Failed to read Alice");
    assert_eq!(
        alice.dirty_fields(&data),
        data_map! { "name" => "Bob" },
        "Only the renamed field must be dirty"
    );
    em.save(db, &mut alice).await.expect("Failed to save Alice again");
    let saved: TestUser = em
        .find_by_id(db, alice.id)
        .await
        .expect("Failed to find Alice")
        .expect("Alice was not found");
    assert_eq!(saved.name, "Bob");
    assert_eq!(saved.email, "alice@test.com");
    assert!(saved.active);
    assert!(!saved.is_new());
    let data = em.fetch_data_array(&saved).expect("Failed to read the saved user");
    assert!(!saved.is_dirty(&data));

    // Save clean
    let before = db.last_insert_id();
    em.save(db, &mut alice).await.expect("Failed to save an unchanged user");
    assert_eq!(db.last_insert_id(), before);
    assert_eq!(events.emitted().len(), 6);
    let found: Option<TestUser> = em
        .find_by_id(db, alice.id)
        .await
        .expect("Failed to find Alice");
    assert_eq!(found.map(|v| v.name).as_deref(), Some("Bob"));

    // Not found is not an error
    let missing: Option<TestUser> = em
        .find_by_id(db, alice.id + 1000)
        .await
        .expect("Looking up a missing user must not fail");
    assert!(missing.is_none());

    // Related entity
    let mut post = TestPost {
        user_id: alice.id,
        title: "Hello".into(),
        body: "First post".into(),
        published_at: Some(date!(2024 - 03 - 01)),
        ..Default::default()
    };
    em.save(db, &mut post).await.expect("Failed to save the post");
    assert!(post.id > 0);
    let found: TestPost = em
        .find_by_id(db, KeyValue::single(post.id))
        .await
        .expect("Failed to find the post")
        .expect("The post was not found");
    assert_eq!(found.published_at, Some(date!(2024 - 03 - 01)));
    assert_eq!(found.user_id, alice.id);
    em.delete_by_id(db, TestPost::entity_name(), post.id)
        .await
        .expect("Failed to delete the post");

    // Delete by id
    em.delete_by_id(db, user, alice.id)
        .await
        .expect("Failed to delete Alice");
    assert_eq!(count_users(db).await, 0);

    // Delete by ids
    let mut ids = Vec::new();
    for name in ["Alice", "Bob", "Charlie"] {
        let mut user = TestUser::new(name, "", false);
        em.save(db, &mut user).await.expect("Failed to save a user");
        ids.push(user.id);
    }
    let result = em
        .delete_by_ids(db, user, [ids[0], ids[1]])
        .await
        .expect("Failed to delete two users");
    assert_eq!(result.rows_affected, 2);
    assert_eq!(count_users(db).await, 1);
    let remaining = db
        .fetch_scalar::<String>(&format!("select `name` from {safe}"), Params::new())
        .await
        .expect("Failed to read the remaining user");
    assert_eq!(remaining.as_deref(), Some("Charlie"));
    clear_users(db).await;

    // Raw insert and update
    let id = em
        .insert(db, user, data_map! { "name" => "Alice" })
        .await
        .expect("Failed to insert Alice")
        .expect("Insert did not report an identifier");
    assert!(id > 0);
    em.update(
        db,
        user,
        data_map! { "name" => "Bob" },
        Some("`name` = :oldName"),
        data_map! { ":oldName" => "Alice" },
    )
    .await
    .expect("Failed to rename Alice");
    let name = db
        .fetch_one(
            &format!("select `name` from {safe} where `name` = 'Bob'"),
            Params::new(),
        )
        .await
        .expect("Failed to read Bob")
        .map(String::try_from_value)
        .transpose()
        .expect("The name must be a string");
    assert_eq!(name.as_deref(), Some("Bob"));

    drop_tables(db, &qe).await;
}
