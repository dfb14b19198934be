#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rowmap::{
        Column, ColumnType, Entity, EntityState, KeyValue, Order, Query, Registry, RegistryConfig,
        SqlWriter, Value, data_map, impl_entity,
    };
    use rust_decimal::Decimal;
    use time::{PrimitiveDateTime, macros::datetime};

    #[derive(Default, Debug, Clone)]
    pub struct Trade {
        pub trade_id: i64,
        pub execution_time: Option<PrimitiveDateTime>,
        /// Ticker symbol
        pub symbol: String,
        pub price: Decimal,
        pub quantity: i32,
        pub is_internalized: bool,
        /// Exchange
        pub venue: Option<String>,
        pub metadata: Option<Vec<u8>>,
        pub state: EntityState,
    }
    impl_entity!(
        Trade,
        state,
        [
            trade_id,
            execution_time,
            symbol,
            price,
            quantity,
            is_internalized,
            venue,
            metadata,
        ]
    );

    impl Trade {
        pub fn sample() -> Self {
            Self {
                trade_id: 46923,
                execution_time: Some(datetime!(2025-06-07 14:32:00)),
                symbol: "AAPL".to_string(),
                price: Decimal::new(19255, 2),
                quantity: 50,
                is_internalized: true,
                venue: Some("NASDAQ".to_string()),
                metadata: Some(b"Metadata Bytes".to_vec()),
                ..Default::default()
            }
        }
    }

    struct Writer;
    impl SqlWriter for Writer {}

    fn registry() -> Registry {
        let mut registry = Registry::new(RegistryConfig {
            table_prefix: "trading_".into(),
            use_entity_hash_name: false,
        });
        registry.add_entity_column::<Trade>(
            "trade_id",
            Column::new(ColumnType::Long).primary_key().not_null(),
        );
        registry.add_entity_column::<Trade>(
            "execution_time",
            Column::new(ColumnType::DateTime).primary_key().not_null(),
        );
        registry.add_entity_column::<Trade>(
            "symbol",
            Column::new(ColumnType::String).size(8).not_null(),
        );
        registry.add_entity_column::<Trade>("price", Column::new(ColumnType::Numeric).precision(18, 4));
        registry.add_entity_column::<Trade>("quantity", Column::new(ColumnType::Int));
        registry.add_entity_column::<Trade>(
            "is_internalized",
            Column::new(ColumnType::Bool).default(false),
        );
        registry.add_entity_column::<Trade>(
            "venue",
            Column::new(ColumnType::String).size(16).default_raw("'XNAS'"),
        );
        registry.add_entity_column::<Trade>("metadata", Column::new(ColumnType::Blob));
        registry
    }

    #[test]
    fn trade_table() {
        let registry = registry();
        assert_eq!(registry.table_name("Trade").unwrap(), "trading_trade");
        let mut out = String::new();
        Writer
            .write_create_table(&mut out, &registry, Trade::entity_name(), true)
            .unwrap();
        assert_eq!(
            out,
            indoc! {"
                create table if not exists `trading_trade` (
                `trade_id` bigint not null,
                `execution_time` datetime not null,
                `symbol` varchar(8) not null,
                `price` decimal(18, 4),
                `quantity` int,
                `is_internalized` tinyint(1) default 0,
                `venue` varchar(16) default 'XNAS',
                `metadata` blob,
                primary key (`trade_id`, `execution_time`)
                )"}
        );
    }

    #[test]
    fn trade_data() {
        let registry = registry();
        let trade = Trade::sample();
        let data = registry.fetch_data_array(&trade).unwrap();
        assert_eq!(data.len(), 8);
        assert_eq!(data.get("price"), Some(&Value::Decimal(Some(Decimal::new(19255, 2)))));
        assert_eq!(data.get("metadata"), Some(&Value::Blob(Some(b"Metadata Bytes".to_vec().into()))));
        let key = registry.primary_key_value("Trade", &data).unwrap().unwrap();
        assert_eq!(
            key,
            KeyValue::composite([
                Value::Int64(Some(46923)),
                Value::Timestamp(Some(datetime!(2025-06-07 14:32:00))),
            ])
        );
        let condition = registry.primary_key_condition(&Writer, "Trade").unwrap();
        assert_eq!(
            condition,
            "`trade_id` = :pkValue0 and `execution_time` = :pkValue1"
        );

        let mut copy = Trade::default();
        registry.set_by_data_array(&mut copy, data).unwrap();
        copy.quantity = 75;
        copy.venue = None;
        let dirty = copy.dirty_fields(&registry.fetch_data_array(&copy).unwrap());
        assert_eq!(
            dirty,
            data_map! { "quantity" => 75, "venue" => Option::<String>::None }
        );
    }

    #[test]
    fn trade_query() {
        let registry = registry();
        let mut query = Query::new("Trade");
        query
            .add_fields(["symbol", "price"])
            .add_condition(
                "`symbol` = :symbol and `price` >= :price",
                data_map! { ":symbol" => "AAPL", ":price" => Decimal::new(100, 0) },
            )
            .add_order_by("price", Order::Desc)
            .set_limit(0, 25);
        let mut out = String::new();
        Writer.write_find_all(&mut out, &registry, &query).unwrap();
        assert_eq!(
            out,
            indoc! {"
                select `symbol`, `price`
                from `trading_trade`
                where (`symbol` = :symbol and `price` >= :price)
                order by `price` desc
                limit 0, 25"}
        );
        assert_eq!(query.params().len(), 2);
    }
}
