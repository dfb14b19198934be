use crate::error_message_from_ptr;
use libsqlite3_sys::*;
use rowmap_core::{Error, Params, Result, Value, as_c_string, truncate_long};
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{CStr, c_int},
    os::raw::{c_char, c_void},
};
use time::{format_description::BorrowedFormatItem, macros::format_description};

const DATE: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const TIME: &[BorrowedFormatItem] = format_description!("[hour]:[minute]:[second].[subsecond]");
const TIMESTAMP: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

unsafe fn bind_text(statement: *mut sqlite3_stmt, index: c_int, value: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            value.as_ptr() as *const c_char,
            value.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

/// Binds `value` at `index`, dates and times are bound as text.
pub(crate) fn bind_value(statement: *mut sqlite3_stmt, index: c_int, value: Value) -> Result<()> {
    unsafe {
        let rc = match value {
            ref v if v.is_null() => sqlite3_bind_null(statement, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, v),
            Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, v),
            Value::Decimal(Some(v)) => sqlite3_bind_double(
                statement,
                index,
                v.to_f64().ok_or_else(|| {
                    Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                })?,
            ),
            Value::Varchar(Some(ref v)) => bind_text(statement, index, v),
            Value::Blob(Some(ref v)) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Date(Some(v)) => bind_text(statement, index, &v.format(DATE)?),
            Value::Time(Some(v)) => bind_text(statement, index, &v.format(TIME)?),
            Value::Timestamp(Some(v)) => bind_text(statement, index, &v.format(TIMESTAMP)?),
            _ => {
                let error = Error::msg(format!("Cannot use a {:?} as a query parameter", value));
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        if rc != SQLITE_OK {
            let db = sqlite3_db_handle(statement);
            let query = sqlite3_sql(statement);
            let error = Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string())
                .context(format!(
                    "Cannot bind parameter {} to query:\n{}",
                    index,
                    truncate_long!(CStr::from_ptr(query).to_string_lossy())
                ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}

/// Binds every named parameter the statement references, the others are skipped.
pub(crate) fn bind_params(statement: *mut sqlite3_stmt, params: Params) -> Result<()> {
    for (name, value) in params {
        let name = as_c_string(name);
        let index = unsafe { sqlite3_bind_parameter_index(statement, name.as_ptr()) };
        if index == 0 {
            log::trace!("Parameter {:?} is not used by the statement", name);
            continue;
        }
        bind_value(statement, index, value)?;
    }
    Ok(())
}
