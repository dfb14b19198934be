#[cfg(test)]
mod tests {
    use rowmap_core::{AsValue, DataMap, Value, data_map};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{
        Date, Month, PrimitiveDateTime, Time,
        macros::{date, datetime},
    };

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Int32(None), Value::Varchar(None));
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert!(Value::Timestamp(None).is_null());
        assert!(!Value::Boolean(Some(false)).is_null());
    }

    #[test]
    fn value_integers() {
        assert_eq!(Value::Int32(Some(5)), Value::Int64(Some(5)));
        assert_ne!(Value::Int32(Some(5)), Value::Int64(Some(6)));
        assert_eq!(Value::Int32(Some(-3)), Value::Int32(Some(-3)));
        assert_ne!(Value::Int64(Some(1)), Value::Int64(Some(2)));
        assert_ne!(Value::Int64(Some(1)), Value::Int64(None));
        assert_ne!(Value::Int32(Some(1)), Value::Boolean(Some(true)));
        assert_eq!(i32::try_from_value(Value::Int64(Some(42))).unwrap(), 42);
        assert!(i32::try_from_value(Value::Int64(Some(i64::MAX))).is_err());
        assert_eq!(i64::try_from_value(Value::Varchar(Some(" 17 ".into()))).unwrap(), 17);
        assert_eq!(
            i64::try_from_value(Value::Decimal(Some(Decimal::from(9)))).unwrap(),
            9
        );
        assert!(i64::try_from_value(Value::Decimal(Some(Decimal::from_str("1.5").unwrap()))).is_err());
        assert!(i64::try_from_value(Value::Varchar(Some("abc".into()))).is_err());
    }

    #[test]
    fn value_unset_key() {
        assert!(Value::Null.is_unset_key());
        assert!(Value::Int64(Some(0)).is_unset_key());
        assert!(Value::Int32(None).is_unset_key());
        assert!(!Value::Int64(Some(3)).is_unset_key());
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert!(!bool::try_from_value(Value::Int32(Some(0))).unwrap());
        assert!(bool::try_from_value(Value::Varchar(Some("TRUE".into()))).unwrap());
        assert!(bool::try_from_value(Value::Float64(Some(0.5))).is_err());
    }

    #[test]
    fn value_floats() {
        assert_eq!(f64::try_from_value(Value::Float32(Some(1.5))).unwrap(), 1.5);
        assert_eq!(f32::try_from_value(Value::Int32(Some(2))).unwrap(), 2.0);
        let decimal = Decimal::try_from_value(Value::Varchar(Some("12.30".into()))).unwrap();
        assert_eq!(decimal, Decimal::from_str("12.30").unwrap());
    }

    #[test]
    fn value_text() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        assert_eq!(
            String::try_from_value(Value::Blob(Some(b"bytes".to_vec().into()))).unwrap(),
            "bytes"
        );
        assert!(String::try_from_value(Value::Int32(Some(1))).is_err());
        let blob = Vec::<u8>::try_from_value(Value::Varchar(Some("ab".into()))).unwrap();
        assert_eq!(blob, b"ab");
    }

    #[test]
    fn value_time() {
        let date = Date::try_from_value(Value::Varchar(Some("2024-03-01".into()))).unwrap();
        assert_eq!(date, date!(2024 - 03 - 01));
        assert_eq!(date.month(), Month::March);
        let timestamp =
            PrimitiveDateTime::try_from_value(Value::Varchar(Some("2024-03-01 12:30:45".into())))
                .unwrap();
        assert_eq!(timestamp, datetime!(2024-03-01 12:30:45));
        let timestamp = PrimitiveDateTime::try_from_value(Value::Varchar(Some(
            "2024-03-01T12:30:45.5".into(),
        )))
        .unwrap();
        assert_eq!(timestamp, datetime!(2024-03-01 12:30:45.5));
        let time = Time::try_from_value(Value::Varchar(Some("08:15".into()))).unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (8, 15, 0));
        assert!(Date::try_from_value(Value::Varchar(Some("yesterday".into()))).is_err());
    }

    #[test]
    fn value_option() {
        assert_eq!(Option::<i32>::None.as_value(), Value::Int32(None));
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::try_from_value(Value::Varchar(Some("x".into()))).unwrap(),
            Some("x".into())
        );
    }

    #[test]
    fn data_map_order() {
        let map = data_map! {
            "b" => 1,
            "a" => "two",
            "c" => Option::<bool>::None,
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(map.get("b"), Some(&Value::Int32(Some(1))));
        let mut other = map.clone();
        other.insert("b", 5i64);
        assert_eq!(other.keys().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_ne!(map, other);
        assert_eq!(DataMap::new(), data_map! {});
    }
}
