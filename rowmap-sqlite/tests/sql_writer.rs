#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rowmap_core::{
        Column, ColumnType, Driver, Entity, Query, RegistryConfig, SqlWriter, Value,
    };
    use rowmap_sqlite::SQLiteDriver;
    use rowmap_tests::{TestPost, TestUser, test_registry};

    #[test]
    fn create_tables() {
        let writer = SQLiteDriver::default().sql_writer();
        let registry = test_registry(RegistryConfig::default());
        let mut out = String::new();
        writer
            .write_create_table(&mut out, &registry, TestUser::entity_name(), true)
            .expect("Could not write the TestUser table");
        assert_eq!(
            out,
            indoc! {"
                create table if not exists `testuser` (
                `id` integer not null,
                `name` varchar(100) not null,
                `email` varchar(150),
                `active` integer default 0,
                `created_at` text default current_timestamp,
                primary key (`id`)
                )"}
        );
        let mut out = String::new();
        writer
            .write_create_table(&mut out, &registry, TestPost::entity_name(), false)
            .expect("Could not write the TestPost table");
        assert_eq!(
            out,
            indoc! {"
                create table `testpost` (
                `id` integer not null,
                `user_id` integer not null,
                `title` varchar(200) not null,
                `body` text,
                `published_at` text,
                foreign key (`user_id`) references `testuser` (`id`) on delete cascade,
                primary key (`id`)
                )"}
        );
    }

    #[test]
    fn column_types() {
        let writer = SQLiteDriver::default().sql_writer();
        let mut out = String::new();
        writer
            .write_column_definition(
                &mut out,
                "price",
                &Column::new(ColumnType::Numeric).precision(10, 2),
            )
            .expect("Could not write the price column");
        assert_eq!(out, "`price` numeric(10, 2)");
        let mut out = String::new();
        writer
            .write_column_definition(
                &mut out,
                "code",
                &Column::new(ColumnType::String).size(3).fixed_size().not_null(),
            )
            .expect("Could not write the code column");
        assert_eq!(out, "`code` char(3) not null");
        let mut out = String::new();
        writer
            .write_column_definition(
                &mut out,
                "ratio",
                &Column::new(ColumnType::Double).default_raw("1.5 * 2"),
            )
            .expect("Could not write the ratio column");
        assert_eq!(out, "`ratio` real default (1.5 * 2)");
        let mut out = String::new();
        assert!(
            writer
                .write_column_definition(
                    &mut out,
                    "name",
                    &Column::new(ColumnType::String).size_list([10, 2]),
                )
                .is_err(),
            "A size list is only valid on numeric columns"
        );
    }

    #[test]
    fn catalogue_statements() {
        let writer = SQLiteDriver::default().sql_writer();
        let mut out = String::new();
        writer.write_is_table_exist(&mut out, ":dbName", ":tableName");
        assert_eq!(
            out,
            "select count(1) from sqlite_master where type = 'table' and name = :tableName"
        );
        let mut out = String::new();
        writer.write_table_columns(&mut out, ":tableName");
        assert_eq!(
            out,
            "select name from pragma_table_info(:tableName) order by cid"
        );
        let mut out = String::new();
        writer.write_list_tables(&mut out);
        assert!(out.starts_with("select name from sqlite_master"));
        let mut out = String::new();
        writer.write_transaction_begin(&mut out);
        assert_eq!(out, "begin");
    }

    #[test]
    fn find_all_nested() {
        let writer = SQLiteDriver::default().sql_writer();
        let registry = test_registry(RegistryConfig::default());
        let mut inner = Query::new("TestUser");
        inner
            .add_fields(["id", "name"])
            .add_condition("`name` like :pattern", Default::default())
            .add_variable(":pattern", "A%");
        let mut query = Query::new(inner);
        query.set_limit(10, 5);
        let mut out = String::new();
        writer
            .write_find_all(&mut out, &registry, &query)
            .expect("Could not write the nested select");
        assert_eq!(
            out,
            indoc! {"
                select *
                from (select `id`, `name`
                from `testuser`
                where (`name` like :pattern)) as `subquery`
                limit 10, 5"}
        );
        assert_eq!(
            query.all_params().get(":pattern"),
            Some(&Value::Varchar(Some("A%".into())))
        );
    }
}
