use mysql_async::{Column, consts::ColumnType};
use rowmap_core::{AsValue, Error, Result, Value};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::str::FromStr;
use time::{Date, Month, PrimitiveDateTime, Time};

/// Charset number MySQL reports for binary columns.
const BINARY_CHARSET: u16 = 63;

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl TryFrom<ValueWrap> for mysql_async::Value {
    type Error = Error;

    fn try_from(value: ValueWrap) -> Result<Self> {
        type MySQLValue = mysql_async::Value;
        macro_rules! ensure_year_range {
            ($date:expr) => {{
                let year = $date.year();
                if year != year.clamp(0, 9999) {
                    return Err(Error::msg(format!("Date {} is out of range for MySQL", $date)));
                }
                year as u16
            }};
        }
        Ok(match value.0 {
            ref v if v.is_null() => MySQLValue::NULL,
            Value::Boolean(Some(v)) => MySQLValue::from(v),
            Value::Int32(Some(v)) => MySQLValue::from(v),
            Value::Int64(Some(v)) => MySQLValue::from(v),
            Value::Float32(Some(v)) => MySQLValue::from(v),
            Value::Float64(Some(v)) => MySQLValue::from(v),
            Value::Decimal(Some(v)) => MySQLValue::Bytes(v.to_string().into_bytes()),
            Value::Varchar(Some(v)) => MySQLValue::Bytes(v.into_bytes()),
            Value::Blob(Some(v)) => MySQLValue::Bytes(v.into_vec()),
            Value::Date(Some(v)) => {
                MySQLValue::Date(ensure_year_range!(v), v.month().into(), v.day(), 0, 0, 0, 0)
            }
            Value::Time(Some(v)) => {
                MySQLValue::Time(false, 0, v.hour(), v.minute(), v.second(), v.microsecond())
            }
            Value::Timestamp(Some(v)) => MySQLValue::Date(
                ensure_year_range!(v),
                v.month().into(),
                v.day(),
                v.hour(),
                v.minute(),
                v.second(),
                v.microsecond(),
            ),
            v => {
                return Err(Error::msg(format!(
                    "rowmap::Value variant `{:?}` is not supported by MySQL",
                    v
                )));
            }
        })
    }
}

fn month(value: u8) -> Result<Month> {
    Month::try_from(value).map_err(|e| Error::msg(format!("Invalid month {value}: {e}")))
}

fn text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(Error::new)
}

/// Decodes a value received from MySQL using the type of its column.
///
/// The text protocol sends everything as bytes, those are parsed back according
/// to the column type.
pub(crate) fn decode_value(value: mysql_async::Value, column: &Column) -> Result<Value> {
    type MySQLValue = mysql_async::Value;
    let column_type = column.column_type();
    Ok(match value {
        MySQLValue::NULL => Value::Null,
        MySQLValue::Int(v) => Value::Int64(Some(v)),
        MySQLValue::UInt(v) => match i64::try_from(v) {
            Ok(v) => Value::Int64(Some(v)),
            Err(..) => Value::Decimal(Some(Decimal::from(v))),
        },
        MySQLValue::Float(v) => Value::Float32(Some(v)),
        MySQLValue::Double(v) => Value::Float64(Some(v)),
        MySQLValue::Date(year, m, day, hour, minute, second, micro) => {
            let date = Date::from_calendar_date(year as _, month(m)?, day)?;
            if column_type == ColumnType::MYSQL_TYPE_DATE {
                Value::Date(Some(date))
            } else {
                let time = Time::from_hms_micro(hour, minute, second, micro)?;
                Value::Timestamp(Some(PrimitiveDateTime::new(date, time)))
            }
        }
        MySQLValue::Time(negative, days, hours, minutes, seconds, micro) => {
            if negative || days > 0 {
                return Err(Error::msg(format!(
                    "Time value outside of a day cannot be represented: {:?}",
                    value
                )));
            }
            Value::Time(Some(Time::from_hms_micro(hours, minutes, seconds, micro)?))
        }
        MySQLValue::Bytes(bytes) => match column_type {
            ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_LONGLONG
            | ColumnType::MYSQL_TYPE_YEAR => {
                let text = text(bytes)?;
                match i64::from_str(&text) {
                    Ok(v) => Value::Int64(Some(v)),
                    Err(..) => Value::Decimal(Some(Decimal::from_str(&text)?)),
                }
            }
            ColumnType::MYSQL_TYPE_FLOAT => Value::Float32(Some(f32::from_str(&text(bytes)?)?)),
            ColumnType::MYSQL_TYPE_DOUBLE => Value::Float64(Some(f64::from_str(&text(bytes)?)?)),
            ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                let text = text(bytes)?;
                Value::Decimal(Some(
                    Decimal::from_str(&text)
                        .or_else(|e| f64::from_str(&text).ok().and_then(Decimal::from_f64).ok_or(e))?,
                ))
            }
            ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
                Value::Date(Some(<Date as AsValue>::parse(&text(bytes)?)?))
            }
            ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => {
                Value::Time(Some(<Time as AsValue>::parse(&text(bytes)?)?))
            }
            ColumnType::MYSQL_TYPE_DATETIME
            | ColumnType::MYSQL_TYPE_DATETIME2
            | ColumnType::MYSQL_TYPE_TIMESTAMP
            | ColumnType::MYSQL_TYPE_TIMESTAMP2 => Value::Timestamp(Some(
                <PrimitiveDateTime as AsValue>::parse(&text(bytes)?)?,
            )),
            _ if column.character_set() == BINARY_CHARSET => Value::Blob(Some(bytes.into())),
            _ => Value::Varchar(Some(text(bytes)?)),
        },
    })
}
