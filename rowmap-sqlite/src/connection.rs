use crate::{CBox, SQLiteDriver, bind_params, error_message_from_ptr, extract_name, extract_value};
use async_stream::try_stream;
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_FULLMUTEX,
    SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_close,
    sqlite3_column_count, sqlite3_errmsg, sqlite3_finalize, sqlite3_last_insert_rowid,
    sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt, sqlite3_total_changes64,
};
use rowmap_core::{
    Connection, Driver, Error, ErrorContext, Executor, QueryResult, Result, RowLabeled,
    RowsAffected, Statement, as_c_string,
    stream::{Stream, TryStreamExt},
    truncate_long,
};
use std::{
    ffi::{CStr, c_char, c_int},
    ptr,
    sync::{
        Arc,
        atomic::{AtomicPtr, Ordering},
    },
};
use tokio::task::spawn_blocking;

/// Connection to a SQLite database file, opened on the first statement.
///
/// The url is `sqlite://<path>[?<uri parameters>]`, the part after the scheme is
/// handed to SQLite as a `file:` URI (`sqlite://../data.sqlite?mode=rwc`).
pub struct SQLiteConnection {
    pub(crate) url: String,
    pub(crate) connection: Option<CBox<sqlite3>>,
    pub(crate) transaction: bool,
}

impl SQLiteConnection {
    fn connection(&mut self) -> Result<AtomicPtr<sqlite3>> {
        if let Some(connection) = &self.connection {
            return Ok(AtomicPtr::new(**connection));
        }
        let context = || format!("While trying to open `{}`", truncate_long!(self.url));
        let url = as_c_string(format!("file:{}", self.url));
        let mut connection: CBox<sqlite3> = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                url.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_FULLMUTEX,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                "Out of memory".to_string()
            } else {
                unsafe { error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string() }
            };
            let error = Error::msg(message).context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        log::debug!("Opened `{}`", self.url);
        let result = AtomicPtr::new(*connection);
        self.connection = Some(connection);
        Ok(result)
    }
}

fn prepare(connection: AtomicPtr<sqlite3>, sql: String) -> Result<CBox<sqlite3_stmt>> {
    let connection = connection.load(Ordering::Relaxed);
    let query = as_c_string(sql);
    let mut statement: CBox<sqlite3_stmt> = CBox::new(ptr::null_mut(), |p| unsafe {
        sqlite3_finalize(p);
    });
    let mut tail: *const c_char = ptr::null();
    unsafe {
        let rc = sqlite3_prepare_v2(
            connection,
            query.as_ptr(),
            -1,
            &mut *statement,
            &mut tail,
        );
        if rc != SQLITE_OK {
            return Err(Error::msg(
                error_message_from_ptr(&sqlite3_errmsg(connection)).to_string(),
            ));
        }
        if !tail.is_null() && !CStr::from_ptr(tail).to_bytes().trim_ascii().is_empty() {
            return Err(Error::msg(
                "Cannot prepare more than one statement at a time",
            ));
        }
    }
    if statement.is_null() {
        return Err(Error::msg("The query does not contain any statement"));
    }
    Ok(statement)
}

/// Next row of `statement`, `None` once it is done.
fn step(statement: &CBox<sqlite3_stmt>, count: c_int) -> Result<Option<Box<[rowmap_core::Value]>>> {
    loop {
        match unsafe { sqlite3_step(**statement) } {
            SQLITE_BUSY => continue,
            SQLITE_DONE => return Ok(None),
            SQLITE_ROW => {
                return (0..count)
                    .map(|i| extract_value(**statement, i))
                    .collect::<Result<_>>()
                    .map(Some);
            }
            _ => {
                let db = unsafe { libsqlite3_sys::sqlite3_db_handle(**statement) };
                let errmsg = unsafe { sqlite3_errmsg(db) };
                return Err(Error::msg(
                    unsafe { error_message_from_ptr(&errmsg) }.to_string(),
                ));
            }
        }
    }
}

impl Executor for SQLiteConnection {
    type Driver = SQLiteDriver;

    fn driver(&self) -> &Self::Driver {
        &SQLiteDriver {}
    }

    fn connected(&self) -> bool {
        self.connection.is_some()
    }

    fn database_name(&self) -> Option<&str> {
        Some("main")
    }

    fn in_transaction(&self) -> bool {
        self.transaction
    }

    fn set_in_transaction(&mut self, value: bool) {
        self.transaction = value;
    }

    fn run(&mut self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = Arc::new(format!("While running the query:\n{}", statement));
        try_stream! {
            let Statement { sql, params } = statement;
            let is_insert = sql
                .trim_start()
                .get(..6)
                .is_some_and(|v| v.eq_ignore_ascii_case("insert"));
            let connection = self.connection()?;
            let db = AtomicPtr::new(connection.load(Ordering::Relaxed));
            let prepared = spawn_blocking(move || prepare(connection, sql)).await??;
            bind_params(*prepared, params)?;
            let changes = unsafe { sqlite3_total_changes64(db.load(Ordering::Relaxed)) };
            let count = unsafe { sqlite3_column_count(*prepared) };
            let labels = (0..count)
                .map(|i| extract_name(*prepared, i))
                .collect::<Result<Arc<[_]>>>()?;
            while let Some(values) = step(&prepared, count)? {
                yield RowLabeled::new(labels.clone(), values).into();
            }
            let rows_affected =
                unsafe { sqlite3_total_changes64(db.load(Ordering::Relaxed)) } - changes;
            let last_affected_id = if is_insert && rows_affected > 0 {
                Some(unsafe { sqlite3_last_insert_rowid(db.load(Ordering::Relaxed)) })
            } else {
                None
            };
            yield RowsAffected {
                rows_affected: rows_affected as u64,
                last_affected_id,
            }
            .into();
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for SQLiteConnection {
    fn connect(url: &str) -> Result<SQLiteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(path) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ))
            .context(format!("While trying to connect to `{}`", truncate_long!(url)));
            log::error!("{:#}", error);
            return Err(error);
        };
        if path.is_empty() {
            return Err(Error::msg("The sqlite connection url does not contain a path"))
                .with_context(|| format!("While trying to connect to `{}`", truncate_long!(url)));
        }
        Ok(Self {
            url: path.to_string(),
            connection: None,
            transaction: false,
        })
    }
}
