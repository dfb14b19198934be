use crate::decode_value;
use mysql_async::FromRowError;
use rowmap_core::{Row, RowLabeled, RowNames};

pub(crate) struct RowWrap(pub(crate) RowLabeled);

impl mysql_async::prelude::FromRow for RowWrap {
    fn from_row_opt(mut row: mysql_async::Row) -> Result<Self, FromRowError>
    where
        Self: Sized,
    {
        let columns = row.columns();
        let names: RowNames = columns.iter().map(|v| v.name_str().into_owned()).collect();
        let values: Row = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let value = row
                    .take::<mysql_async::Value, _>(i)
                    .unwrap_or(mysql_async::Value::NULL);
                decode_value(value, column).inspect_err(|e| log::error!("{:#}", e))
            })
            .collect::<Result<_, _>>()
            .map_err(|_| FromRowError(row))?;
        Ok(RowWrap(RowLabeled::new(names, values)))
    }
}
