#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rowmap_core::{
        Action, Column, ColumnType, Entity, EntityState, Field, MappingError, Order, Query, Registry,
        RegistryConfig, SqlWriter, Value, data_map, impl_entity,
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::macros::{date, datetime, time};

    struct Writer;
    impl SqlWriter for Writer {}

    #[derive(Default)]
    struct Author {
        id: i64,
        name: String,
        state: EntityState,
    }
    impl_entity!(Author, state, [id, name]);

    #[derive(Default)]
    struct Book {
        isbn: String,
        author_id: i64,
        price: Decimal,
        state: EntityState,
    }
    impl_entity!(Book, state, [isbn, author_id, price]);

    fn registry() -> Registry {
        let mut registry = Registry::new(RegistryConfig::default());
        registry.add_entity_column::<Author>(
            "id",
            Column::new(ColumnType::Long)
                .primary_key()
                .auto_increment()
                .not_null(),
        );
        registry.add_entity_column::<Author>(
            "name",
            Column::new(ColumnType::String).size(80).default("anonymous"),
        );
        registry.add_entity_column::<Book>(
            "isbn",
            Column::new(ColumnType::String)
                .size(13)
                .fixed_size()
                .primary_key(),
        );
        registry.add_entity_column::<Book>(
            "author_id",
            Column::new(ColumnType::Long)
                .foreign_key(["Author", "id"])
                .on_delete(Action::SetNull)
                .on_update(Action::Cascade),
        );
        registry.add_entity_column::<Book>(
            "price",
            Column::new(ColumnType::Numeric)
                .precision(8, 2)
                .default_raw("0"),
        );
        registry
    }

    fn column(name: &str, column: Column) -> rowmap_core::Result<String> {
        let mut out = String::new();
        Writer.write_column_definition(&mut out, name, &column)?;
        Ok(out)
    }

    #[test]
    fn literals() {
        let mut out = String::new();
        for value in [
            Value::Null,
            Value::Int32(None),
            true.into(),
            42.into(),
            (-7i64).into(),
            1.5.into(),
            Decimal::from_str("10.25").unwrap().into(),
            "it's".into(),
            vec![0xCA_u8, 0xFE].into(),
            date!(2024 - 03 - 01).into(),
            time!(08:05:09).into(),
            datetime!(2024-03-01 08:05:09).into(),
        ] {
            Writer.write_value(&mut out, &value).unwrap();
            out.push(' ');
        }
        assert_eq!(
            out,
            "null null 1 42 -7 1.5 10.25 'it''s' x'CAFE' '2024-03-01' '08:05:09' '2024-03-01 08:05:09' "
        );
    }

    #[test]
    fn non_finite_floats() {
        for value in [f64::NAN.into(), f64::INFINITY.into(), f32::NEG_INFINITY.into()] {
            let mut out = String::new();
            let error = Writer.write_value(&mut out, &value).unwrap_err();
            assert!(matches!(
                error.downcast_ref::<MappingError>(),
                Some(MappingError::InvalidColumnSpec(..))
            ));
            assert!(out.is_empty());
        }
        assert!(
            column(
                "ratio",
                Column::new(ColumnType::Double).default(f64::NAN)
            )
            .is_err()
        );
    }

    #[test]
    fn names() {
        assert_eq!(Writer.escape_name("users"), "`users`");
        assert_eq!(Writer.escape_name("shop.users"), "`shop`.`users`");
        assert_eq!(Writer.escape_name("we`ird"), "`we``ird`");
    }

    #[test]
    fn column_definitions() {
        assert_eq!(
            column("id", Column::new(ColumnType::Int).not_null().auto_increment()).unwrap(),
            "`id` int not null auto_increment"
        );
        assert_eq!(
            column("code", Column::new(ColumnType::String).size(2).fixed_size()).unwrap(),
            "`code` char(2)"
        );
        assert_eq!(
            column("ratio", Column::new(ColumnType::Float).size(7)).unwrap(),
            "`ratio` float(7)"
        );
        assert_eq!(
            column("day", Column::new(ColumnType::Date).size(10)).unwrap(),
            "`day` date"
        );
        assert_eq!(
            column(
                "updated",
                Column::new(ColumnType::DateTime).not_null().default_now()
            )
            .unwrap(),
            "`updated` datetime not null default utc_timestamp()"
        );
        assert_eq!(
            column("notes", Column::new(ColumnType::String).default(Value::Null)).unwrap(),
            "`notes` longtext"
        );
        assert_eq!(
            column("data", Column::new(ColumnType::Blob)).unwrap(),
            "`data` blob"
        );
    }

    #[test]
    fn invalid_columns() {
        assert!(column("name", Column::new(ColumnType::String).size_list([1, 2])).is_err());
        assert!(column("price", Column::new(ColumnType::Numeric).size_list([8])).is_err());
        assert!(column("notes", Column::new(ColumnType::String).default("none")).is_err());
        assert!(column("data", Column::new(ColumnType::Blob).default("none")).is_err());
        assert!(
            column(
                "name",
                Column::new(ColumnType::String).size(10).auto_increment()
            )
            .is_err()
        );
        let registry = registry();
        let mut out = String::new();
        assert!(
            Writer
                .write_foreign_key_definition(
                    &mut out,
                    &registry,
                    "author_id",
                    &Column::new(ColumnType::Long).foreign_key(["Author"]),
                )
                .is_err()
        );
        assert!(
            Writer
                .write_create_table(&mut out, &registry, "Publisher", false)
                .is_err()
        );
    }

    #[test]
    fn column_names() {
        assert_eq!("DateTime".parse::<ColumnType>().unwrap(), ColumnType::DateTime);
        assert_eq!(ColumnType::Numeric.to_string(), "numeric");
        assert!("varchar".parse::<ColumnType>().is_err());
        assert_eq!("set_null".parse::<Action>().unwrap(), Action::SetNull);
        assert_eq!("CASCADE".parse::<Action>().unwrap(), Action::Cascade);
        let error = "restrict".parse::<Action>().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MappingError>(),
            Some(MappingError::InvalidColumnSpec(..))
        ));
    }

    #[test]
    fn create_table() {
        let registry = registry();
        let mut out = String::new();
        Writer
            .write_create_table(&mut out, &registry, "Book", false)
            .unwrap();
        assert_eq!(
            out,
            indoc! {"
                create table `book` (
                `isbn` char(13),
                `author_id` bigint,
                `price` decimal(8, 2) default 0,
                foreign key (`author_id`) references `author` (`id`) on delete set null on update cascade,
                primary key (`isbn`)
                )"}
        );
        let mut out = String::new();
        Writer
            .write_create_table(&mut out, &registry, Author::entity_name(), true)
            .unwrap();
        assert_eq!(
            out,
            indoc! {"
                create table if not exists `author` (
                `id` bigint not null auto_increment,
                `name` varchar(80) default 'anonymous',
                primary key (`id`)
                )"}
        );
    }

    #[test]
    fn find_all() {
        let registry = registry();
        let query = Query::new("Author");
        let mut out = String::new();
        Writer.write_find_all(&mut out, &registry, &query).unwrap();
        assert_eq!(
            out,
            indoc! {"
                select `id`, `name`
                from `author`"}
        );

        let mut query = Query::new("Book");
        query
            .add_field(Field::aliased("code", "isbn"))
            .add_field(Field::raw("total", "sum(`price`)"))
            .add_inner_join("Author", "`author`.`id` = `book`.`author_id`")
            .add_condition("`price` > :min", data_map! { ":min" => 10 })
            .add_group_by("`isbn`")
            .add_order_by("total", Order::Desc)
            .add_order_by("isbn", Order::Asc)
            .set_limit(20, 0);
        let mut out = String::new();
        Writer.write_find_all(&mut out, &registry, &query).unwrap();
        assert_eq!(
            out,
            indoc! {"
                select `isbn` as `code`, sum(`price`) as `total`
                from `book`
                inner join `author` on (`author`.`id` = `book`.`author_id`)
                where (`price` > :min)
                group by `isbn`
                order by `total` desc
                limit 20, 1"}
        );

        let mut out = String::new();
        Writer
            .write_find_all_count(&mut out, &registry, &query)
            .unwrap();
        assert_eq!(
            out,
            indoc! {"
                select count(1)
                from `book`
                inner join `author` on (`author`.`id` = `book`.`author_id`)
                where (`price` > :min)
                group by `isbn`"}
        );

        let mut query = Query::new("Publisher");
        query.add_field("id");
        let mut out = String::new();
        assert!(Writer.write_find_all(&mut out, &registry, &query).is_err());
    }

    #[test]
    fn nested_params() {
        let mut inner = Query::new("Book");
        inner.add_condition("`price` < :max", data_map! { ":max" => 50 });
        let mut outer = Query::new(inner);
        outer
            .add_condition("`author_id` = :author", data_map! { ":author" => 3 })
            .add_variable(":max", 40);
        assert_eq!(outer.params().len(), 2);
        assert_eq!(
            outer.all_params(),
            data_map! { ":max" => 40, ":author" => 3 }
        );
        outer.set_fields(["isbn"]).clear_limit();
        assert!(!outer.has_limit());
        assert_eq!(outer.fields, [Field::named("isbn")]);
    }

    #[test]
    fn dml() {
        let mut out = String::new();
        Writer.write_insert(&mut out, "shop.book", ["isbn", "price"]);
        assert_eq!(
            out,
            "insert into `shop`.`book` (`isbn`, `price`) values (:isbn, :price)"
        );
        let mut out = String::new();
        Writer.write_update(&mut out, "book", ["price"], None);
        assert_eq!(out, "update `book` set `price` = :set_price");
        let mut out = String::new();
        Writer.write_delete(&mut out, "book", Some("`isbn` = :pkValue"));
        assert_eq!(out, "delete from `book` where `isbn` = :pkValue");
        let mut out = String::new();
        Writer.write_table_columns(&mut out, ":tableName");
        assert!(out.contains("table_name = :tableName"));
    }
}
