use crate::{MySQLDriver, RowWrap, ValueWrap};
use async_stream::try_stream;
use mysql_async::{Conn, Opts, prelude::Queryable};
use rowmap_core::{
    Connection, Driver, Error, ErrorContext, Executor, Params, QueryResult, Result, RowsAffected,
    Statement,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use std::{collections::HashMap, sync::Arc};
use url::Url;

/// Connection to a MySQL or MariaDB server, opened on the first statement.
pub struct MySQLConnection {
    pub(crate) opts: Opts,
    pub(crate) connection: Option<Conn>,
    pub(crate) transaction: bool,
}

impl MySQLConnection {
    async fn connection(&mut self) -> Result<&mut Conn> {
        if self.connection.is_none() {
            let context = || {
                format!(
                    "While trying to connect to `{}:{}`",
                    self.opts.ip_or_hostname(),
                    self.opts.tcp_port()
                )
            };
            let connection = Conn::new(self.opts.clone()).await.with_context(context)?;
            log::debug!("Connected to `{}`", self.opts.ip_or_hostname());
            self.connection = Some(connection);
        }
        self.connection
            .as_mut()
            .ok_or_else(|| Error::msg("MySQL connection is not available"))
    }

    /// Closes the physical connection, if one was opened.
    pub async fn disconnect(mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.disconnect().await?;
        }
        Ok(())
    }
}

/// Names of the `:name` placeholders in `sql`, quoted text is skipped.
pub(crate) fn placeholders(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut result = Vec::new();
    let mut quote = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) if c == b'\\' && q != b'`' => i += 1,
            Some(q) if c == q => quote = None,
            Some(..) => {}
            None if matches!(c, b'\'' | b'"' | b'`') => quote = Some(c),
            None if c == b':' && i + 1 < bytes.len() => {
                let start = i + 1;
                let is_start = |b: u8| b.is_ascii_alphabetic() || b == b'_';
                if is_start(bytes[start]) && (i == 0 || bytes[i - 1] != b':') {
                    let end = bytes[start..]
                        .iter()
                        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
                        .map_or(bytes.len(), |n| start + n);
                    result.push(&sql[start..end]);
                    i = end;
                    continue;
                }
            }
            None => {}
        }
        i += 1;
    }
    result
}

/// Named parameters without the leading colon, the way `mysql_async` expects them.
/// Parameters that `sql` does not reference are dropped.
fn params_wrap(sql: &str, params: Params) -> Result<mysql_async::Params> {
    let used = placeholders(sql);
    let named = params
        .into_iter()
        .filter_map(|(k, v)| {
            let key = k.trim_start_matches(':');
            if used.contains(&key) {
                Some((key.as_bytes().to_vec(), v))
            } else {
                log::trace!("Parameter {:?} is not used by the statement", k);
                None
            }
        })
        .map(|(k, v)| Ok((k, mysql_async::Value::try_from(ValueWrap(v))?)))
        .collect::<Result<HashMap<_, _>>>()?;
    if named.is_empty() {
        return Ok(mysql_async::Params::Empty);
    }
    Ok(mysql_async::Params::Named(named))
}

impl Executor for MySQLConnection {
    type Driver = MySQLDriver;

    fn driver(&self) -> &Self::Driver {
        &MySQLDriver {}
    }

    fn connected(&self) -> bool {
        self.connection.is_some()
    }

    fn database_name(&self) -> Option<&str> {
        self.opts.db_name()
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
            let params = params_wrap(&sql, params)?;
            let connection = self.connection().await?;
            if matches!(params, mysql_async::Params::Empty) {
                let mut result = connection.query_iter(sql).await?;
                while let Some(mut stream) = result.stream::<RowWrap>().await? {
                    while let Some(row) = stream.next().await.transpose()? {
                        yield row.0.into()
                    }
                }
                yield RowsAffected {
                    rows_affected: result.affected_rows(),
                    last_affected_id: result.last_insert_id().map(|v| v as i64),
                }
                .into()
            } else {
                let mut result = connection.exec_iter(sql, params).await?;
                while let Some(mut stream) = result.stream::<RowWrap>().await? {
                    while let Some(row) = stream.next().await.transpose()? {
                        yield row.0.into()
                    }
                }
                yield RowsAffected {
                    rows_affected: result.affected_rows(),
                    last_affected_id: result.last_insert_id().map(|v| v as i64),
                }
                .into()
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for MySQLConnection {
    fn connect(url: &str) -> Result<MySQLConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "MySQL connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(url).with_context(context)?;
        let opts = Opts::from_url(url.as_str()).with_context(context)?;
        Ok(MySQLConnection {
            opts,
            connection: None,
            transaction: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn placeholder_names() {
        assert_eq!(
            placeholders("select * from `t` where `a` = :a and `b` in (:in0,:in1)"),
            ["a", "in0", "in1"]
        );
        assert_eq!(
            placeholders("select ':quoted', \"x:y\", `c:d`, '08:05:09', 'it''s :x' from t where id=:pkValue"),
            ["pkValue"]
        );
        assert_eq!(placeholders("select 'a\\':b' = :c"), ["c"]);
        assert!(placeholders("select 1").is_empty());
        assert!(placeholders("select a::int, :9, :").is_empty());
    }
}
