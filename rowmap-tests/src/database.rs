use crate::{TestUser, drop_tables, recreate_tables};
use rowmap::{AsValue, Connection, Database, Entity, Params, QueryExecutor, Value, data_map};

pub(crate) async fn insert_user<C: Connection>(
    db: &mut Database<C>,
    table: &str,
    name: &str,
    email: &str,
    active: bool,
) {
    db.insert(
        table,
        &data_map! {
            "name" => name.to_string(),
            "email" => email.to_string(),
            "active" => active as i32,
        },
    )
    .await
    .expect("Failed to insert a user");
}

pub(crate) async fn count_users<C: Connection>(db: &mut Database<C>) -> i64 {
    db.fetch_scalar::<i64>("select count(1) from #TestUser", Params::new())
        .await
        .expect("Failed to count the users")
        .expect("Count returned no row")
}

pub(crate) async fn clear_users<C: Connection>(db: &mut Database<C>) {
    db.execute("delete from #TestUser", Params::new())
        .await
        .expect("Failed to delete the users");
}

fn as_string(value: Option<&Value>) -> String {
    String::try_from_value(value.cloned().unwrap_or_default()).expect("Expected a string value")
}

pub async fn database<C: Connection>(db: &mut Database<C>) {
    let qe = QueryExecutor::new(db.registry().clone());
    recreate_tables(db, &qe).await;
    let table = db
        .registry()
        .table_name(TestUser::entity_name())
        .expect("TestUser is registered");
    let safe = db.escape_name(&table);
    assert_eq!(safe, "`testuser`");

    // Substitution
    assert_eq!(count_users(db).await, 0);
    let literal = db
        .fetch_scalar::<String>("select '#TestUser' as t", Params::new())
        .await
        .expect("Failed to select a literal");
    assert_eq!(literal.as_deref(), Some("#TestUser"));

    let rows = db
        .query("select 1", Params::new())
        .await
        .expect("Failed to select 1");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values()[0].as_i64(), Some(1));

    // Fetch
    insert_user(db, &table, "Alice", "alice@test.com", false).await;
    insert_user(db, &table, "Bob", "", false).await;
    let select_by_name = format!("select * from {safe} where `name` = :name");
    let row = db
        .fetch(&select_by_name, data_map! { ":name" => "Alice" })
        .await
        .expect("Failed to fetch Alice")
        .expect("Alice was not found");
    assert_eq!(as_string(row.get("name")), "Alice");
    assert_eq!(as_string(row.get("email")), "alice@test.com");
    let row = db
        .fetch(
            &select_by_name,
            data_map! { ":name" => "Alice", ":ignored" => 5 },
        )
        .await
        .expect("Failed to fetch Alice with an extra parameter")
        .expect("Alice was not found");
    assert_eq!(as_string(row.get("name")), "Alice");
    let rows = db
        .query("select 1", data_map! { ":ignored" => 1 })
        .await
        .expect("Failed to select 1 with an unreferenced parameter");
    assert_eq!(rows.len(), 1);

    let user = db
        .fetch_entity::<TestUser>(&select_by_name, data_map! { ":name" => "Bob" })
        .await
        .expect("Failed to fetch Bob")
        .expect("Bob was not found");
    assert_eq!(user.name, "Bob");
    assert!(user.id > 0);
    assert!(!user.is_new());
    assert!(user.created_at.is_some());

    let nobody = db
        .fetch(&select_by_name, data_map! { ":name" => "Nobody" })
        .await
        .expect("Failed to fetch Nobody");
    assert!(nobody.is_none());

    let rows = db
        .fetch_all(&format!("select * from {safe}"), Params::new())
        .await
        .expect("Failed to fetch all the users");
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains_key("email"));
    let users = db
        .fetch_all_entities::<TestUser>(&format!("select * from {safe}"), Params::new())
        .await
        .expect("Failed to fetch all the users as entities");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| !u.is_new() && u.snapshot().is_some()));

    let names = db
        .fetch_column(&format!("select `name` from {safe} order by `name`"), Params::new())
        .await
        .expect("Failed to fetch the names")
        .into_iter()
        .map(String::try_from_value)
        .collect::<Result<Vec<_>, _>>()
        .expect("Names must be strings");
    assert_eq!(names, ["Alice", "Bob"]);
    assert_eq!(count_users(db).await, 2);

    // Insert
    let id = db
        .insert(&table, &data_map! { "name" => "Charlie" })
        .await
        .expect("Failed to insert Charlie")
        .expect("Insert did not report an identifier");
    assert!(id > 0);
    assert_eq!(db.last_insert_id(), Some(id));

    // Update
    let result = db
        .update(
            &table,
            &data_map! { "name" => "Dave" },
            Some("`name` = :oldName"),
            data_map! { ":oldName" => "Alice" },
        )
        .await
        .expect("Failed to rename Alice");
    assert_eq!(result.rows_affected, 1);
    let names = db
        .fetch_column(&format!("select `name` from {safe} order by `name`"), Params::new())
        .await
        .expect("Failed to fetch the names");
    let names = names
        .into_iter()
        .map(String::try_from_value)
        .collect::<Result<Vec<_>, _>>()
        .expect("Names must be strings");
    assert_eq!(names, ["Bob", "Charlie", "Dave"]);

    db.update(
        &table,
        &data_map! { "email" => "updated@test.com" },
        None,
        Params::new(),
    )
    .await
    .expect("Failed to update every user");
    let updated = db
        .fetch_scalar::<i64>(
            &format!("select count(1) from {safe} where `email` = :email"),
            data_map! { ":email" => "updated@test.com" },
        )
        .await
        .expect("Failed to count the updated users");
    assert_eq!(updated, Some(3));

    // Delete
    let result = db
        .delete(&table, Some("`name` = :name"), data_map! { ":name" => "Bob" })
        .await
        .expect("Failed to delete Bob");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(count_users(db).await, 2);

    // Helpers
    let (condition, params) = db.in_condition([1, 2, 3]);
    assert_eq!(condition, ":in0,:in1,:in2");
    assert_eq!(params, data_map! { ":in0" => 1, ":in1" => 2, ":in2" => 3 });
    assert_eq!(db.escape_like("%foo%"), "\\%foo\\%");

    drop_tables(db, &qe).await;
}
