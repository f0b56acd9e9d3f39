//! SQLite value conversion.
//!
//! A declared type only sets an affinity, so decoding looks at the cell's
//! storage class first and uses the declared type to refine it. Date and
//! time text in the recognized layouts becomes a typed value; other text is
//! left for the normalizer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::services::database::traits::{Cell, Row as TraitRow, Value};

const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

const DATETIME_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Converter between SQLite values and the unified `Value` type.
pub struct SqliteValueConverter;

impl SqliteValueConverter {
    pub fn convert_row(row: &SqliteRow) -> TraitRow {
        let cells = row
            .columns()
            .iter()
            .map(|col| {
                let declared = col.type_info().name().to_uppercase();
                Cell::new(col.name(), Self::extract_value(row, col.ordinal(), &declared))
            })
            .collect();

        TraitRow::new(cells)
    }

    fn extract_value(row: &SqliteRow, idx: usize, declared: &str) -> Value {
        let storage = match row.try_get_raw(idx) {
            Ok(raw) if !raw.is_null() => raw.type_info().name().to_string(),
            _ => return Value::Null,
        };

        let refined = match (declared, storage.as_str()) {
            ("BOOLEAN" | "BOOL", "INTEGER") => {
                row.try_get_unchecked::<i64, _>(idx).ok().map(|v| Value::Bool(v != 0))
            }
            ("DATE", "TEXT") => parse_text(row, idx, |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Value::Date)
            }),
            ("TIME", "TEXT") => parse_text(row, idx, |s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok().map(Value::Time)
            }),
            ("DATETIME" | "TIMESTAMP", "TEXT") => parse_text(row, idx, |s| {
                DATETIME_LAYOUTS
                    .iter()
                    .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
                    .map(Value::DateTime)
            }),
            // Unix seconds
            ("DATETIME" | "TIMESTAMP", "INTEGER") => row
                .try_get_unchecked::<i64, _>(idx)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| Value::DateTime(dt.naive_utc())),
            // Julian day number
            ("DATETIME" | "TIMESTAMP", "REAL") => row
                .try_get_unchecked::<f64, _>(idx)
                .ok()
                .and_then(|julian| {
                    let secs = ((julian - UNIX_EPOCH_JULIAN_DAY) * 86_400.0) as i64;
                    DateTime::from_timestamp(secs, 0)
                })
                .map(|dt| Value::DateTime(dt.naive_utc())),
            _ => None,
        };

        refined.unwrap_or_else(|| decode_storage_class(row, idx, &storage))
    }

    /// Bind a unified value as the next positional parameter.
    ///
    /// SQLite has no decimal storage class, so decimals bind as text.
    pub fn bind_value<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        value: &Value,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int64(v) => query.bind(*v),
            Value::Float64(v) => query.bind(*v),
            Value::Decimal(d) => query.bind(d.to_string()),
            Value::Text(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Date(d) => query.bind(*d),
            Value::Time(t) => query.bind(*t),
            Value::DateTime(dt) => query.bind(*dt),
        }
    }
}

fn decode_storage_class(row: &SqliteRow, idx: usize, storage: &str) -> Value {
    let value = match storage {
        "INTEGER" => row.try_get_unchecked::<i64, _>(idx).ok().map(Value::Int64),
        "REAL" => row.try_get_unchecked::<f64, _>(idx).ok().map(Value::Float64),
        "TEXT" => row.try_get_unchecked::<String, _>(idx).ok().map(Value::Text),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(idx).ok().map(Value::Bytes),
        _ => None,
    };
    value.unwrap_or(Value::Null)
}

/// Parse a text cell; text `parse` rejects is kept as `Value::Text`.
fn parse_text<F>(row: &SqliteRow, idx: usize, parse: F) -> Option<Value>
where
    F: FnOnce(&str) -> Option<Value>,
{
    let text = row.try_get_unchecked::<String, _>(idx).ok()?;
    Some(parse(&text).unwrap_or(Value::Text(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn test_declared_types_refine_storage_class() {
        smol::block_on(async {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
                .unwrap();
            sqlx::query(
                "CREATE TABLE t (flag BOOLEAN, born DATE, seen DATETIME, stamp DATETIME, amount DECIMAL, note TEXT)",
            )
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query("INSERT INTO t VALUES (1, '2024-02-29', '2024-01-02 03:04:05', 0, '12.50', NULL)")
                .execute(&pool)
                .await
                .unwrap();

            let row = sqlx::query("SELECT * FROM t").fetch_one(&pool).await.unwrap();
            let row = SqliteValueConverter::convert_row(&row);

            assert_eq!(row.get("flag"), Some(&Value::Bool(true)));
            assert!(matches!(row.get("born"), Some(Value::Date(_))));
            assert_eq!(row.get_string("seen"), "2024-01-02 03:04:05");
            assert_eq!(row.get_string("stamp"), "1970-01-01 00:00:00");
            // NUMERIC affinity stores numeric-looking text as REAL
            assert_eq!(row.get("amount"), Some(&Value::Float64(12.5)));
            assert_eq!(row.get("note"), Some(&Value::Null));
        });
    }
}
