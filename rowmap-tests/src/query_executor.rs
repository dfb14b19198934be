use crate::{
    TestUser,
    database::{clear_users, insert_user},
    drop_tables,
};
use rowmap::{
    AsValue, Connection, Database, Entity, Field, Order, Query, QueryExecutor, Value, data_map,
};

fn names(rows: Vec<Value>) -> Vec<String> {
    let mut result = rows
        .into_iter()
        .map(String::try_from_value)
        .collect::<Result<Vec<_>, _>>()
        .expect("Names must be strings");
    result.sort();
    result
}

pub async fn query_executor<C: Connection>(db: &mut Database<C>) {
    let qe = QueryExecutor::new(db.registry().clone());
    let user = TestUser::entity_name();
    let table = db.registry().table_name(user).expect("TestUser is registered");
    let physical = db
        .registry()
        .table_name_by_type(user, true)
        .expect("TestUser is registered");

    // Schema
    drop_tables(db, &qe).await;
    let exists = qe
        .is_table_exist(db, user)
        .await
        .expect("Failed to check the TestUser table");
    assert!(!exists);
    qe.create_table(db, user, false)
        .await
        .expect("Failed to create the TestUser table");
    assert!(qe.is_table_exist(db, user).await.expect("Failed to check the TestUser table"));
    qe.create_table(db, user, true)
        .await
        .expect("Creating an existing table with `if not exists` must succeed");
    assert!(qe.is_table_exist(db, user).await.expect("Failed to check the TestUser table"));
    let tables = qe.list_tables(db).await.expect("Failed to list the tables");
    assert!(
        tables.contains(&physical),
        "Table `{physical}` was not listed in {tables:?}"
    );
    let columns = qe
        .find_columns(db, user)
        .await
        .expect("Failed to read the columns of TestUser");
    assert_eq!(columns, ["id", "name", "email", "active", "created_at"]);

    // Find all
    insert_user(db, &table, "Alice", "alice@test.com", false).await;
    insert_user(db, &table, "Bob", "bob@test.com", true).await;
    let rows = qe
        .find_all(db, &Query::new(user))
        .await
        .expect("Failed to find all the users");
    assert_eq!(rows.len(), 2);
    assert_eq!(
        names(rows.iter().filter_map(|r| r.get("name").cloned()).collect()),
        ["Alice", "Bob"]
    );

    let mut query = Query::new(user);
    query.add_condition("`active` = :active", data_map! { ":active" => 1 });
    let rows = qe
        .find_all(db, &query)
        .await
        .expect("Failed to find the active users");
    assert_eq!(rows.len(), 1);
    assert_eq!(names(rows[0].get("name").cloned().into_iter().collect()), ["Bob"]);

    let mut query = Query::new(user);
    query
        .add_fields([Field::named("id"), Field::aliased("user_name", "name")])
        .add_order_by("user_name", Order::Desc)
        .set_limit(0, 1);
    let rows = qe
        .find_all(db, &query)
        .await
        .expect("Failed to find the last user by name");
    assert_eq!(rows.len(), 1);
    assert_eq!(names(rows[0].get("user_name").cloned().into_iter().collect()), ["Bob"]);

    let mut inner = Query::new(user);
    inner.add_condition("`active` = :active", data_map! { ":active" => 0 });
    let rows = qe
        .find_all(db, &Query::new(inner))
        .await
        .expect("Failed to select from a nested query");
    assert_eq!(rows.len(), 1);
    assert_eq!(names(rows[0].get("name").cloned().into_iter().collect()), ["Alice"]);

    // Columns and count
    let values = qe
        .find_all_column(db, &Query::new(user), "name")
        .await
        .expect("Failed to find the names");
    assert_eq!(names(values), ["Alice", "Bob"]);
    insert_user(db, &table, "Charlie", "", false).await;
    let mut query = Query::new(user);
    query.set_limit(0, 1);
    let count = qe
        .find_all_count(db, &query)
        .await
        .expect("Failed to count the users");
    assert_eq!(count, 3);

    clear_users(db).await;
    drop_tables(db, &qe).await;
}
