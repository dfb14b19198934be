#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rowmap_core::{Driver, Entity, Order, Query, RegistryConfig, SqlWriter, data_map};
    use rowmap_mysql::MySQLDriver;
    use rowmap_tests::{TestPost, TestUser, test_registry};

    #[test]
    fn create_tables() {
        let writer = MySQLDriver::new().sql_writer();
        let registry = test_registry(RegistryConfig::default());
        let mut out = String::new();
        writer
            .write_create_table(&mut out, &registry, TestUser::entity_name(), true)
            .expect("Could not write the TestUser table");
        assert_eq!(
            out,
            indoc! {"
                create table if not exists `testuser` (
                `id` int not null auto_increment,
                `name` varchar(100) not null,
                `email` varchar(150),
                `active` tinyint(1) default 0,
                `created_at` datetime default utc_timestamp(),
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
                `id` int not null auto_increment,
                `user_id` int not null,
                `title` varchar(200) not null,
                `body` longtext,
                `published_at` date,
                foreign key (`user_id`) references `testuser` (`id`) on delete cascade,
                primary key (`id`)
                )"}
        );
    }

    #[test]
    fn prefixed_hash_names() {
        let writer = MySQLDriver::new().sql_writer();
        let registry = test_registry(RegistryConfig {
            table_prefix: "rm_".into(),
            use_entity_hash_name: true,
        });
        let mut out = String::new();
        writer
            .write_drop_table(&mut out, &registry, TestPost::entity_name(), true)
            .expect("Could not write the drop");
        assert_eq!(out, "drop table if exists `#TestPost`");
        let mut out = String::new();
        writer
            .write_foreign_key_definition(
                &mut out,
                &registry,
                "user_id",
                registry
                    .column(TestPost::entity_name(), "user_id")
                    .expect("user_id is registered"),
            )
            .expect("Could not write the foreign key");
        assert_eq!(
            out,
            "foreign key (`user_id`) references `#TestUser` (`id`) on delete cascade"
        );
    }

    #[test]
    fn find_all() {
        let writer = MySQLDriver::new().sql_writer();
        let registry = test_registry(RegistryConfig::default());
        let mut query = Query::new("TestUser");
        query
            .add_fields(["id", "name"])
            .add_condition("`active` = :active", data_map! { ":active" => true })
            .add_order_by("name", Order::Asc)
            .add_order_by("email", Order::Desc)
            .set_limit(-5, 5000);
        let mut out = String::new();
        writer
            .write_find_all(&mut out, &registry, &query)
            .expect("Could not write the select");
        assert_eq!(
            out,
            indoc! {"
                select `id`, `name`
                from `testuser`
                where (`active` = :active)
                order by `name` asc
                limit 0, 1000"}
        );
        let mut out = String::new();
        writer
            .write_find_all_count(&mut out, &registry, &query)
            .expect("Could not write the count");
        assert_eq!(
            out,
            indoc! {"
                select count(1)
                from `testuser`
                where (`active` = :active)"}
        );
    }

    #[test]
    fn statements() {
        let writer = MySQLDriver::new().sql_writer();
        let mut out = String::new();
        writer.write_insert(&mut out, "testuser", ["name", "email"]);
        assert_eq!(out, "insert into `testuser` (`name`, `email`) values (:name, :email)");
        let mut out = String::new();
        writer.write_update(&mut out, "testuser", ["name"], Some("`id` = :pkValue"));
        assert_eq!(out, "update `testuser` set `name` = :set_name where `id` = :pkValue");
        let mut out = String::new();
        writer.write_delete(&mut out, "testuser", None);
        assert_eq!(out, "delete from `testuser`");
        let mut out = String::new();
        writer.write_is_table_exist(&mut out, ":dbName", ":tableName");
        assert_eq!(
            out,
            "select count(1) from information_schema.tables where table_schema = :dbName and table_name = :tableName"
        );
        let mut out = String::new();
        writer.write_transaction_begin(&mut out);
        assert_eq!(out, "start transaction");
    }
}
