//! MySQL value conversion.
//!
//! Decoding keys off the column type name sqlx reports, which carries an
//! ` UNSIGNED` suffix for unsigned integers.

use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Decode, MySql, Row, Type, TypeInfo, ValueRef};

use crate::services::database::traits::{Cell, Row as TraitRow, Value};

/// Converter between MySQL values and the unified `Value` type.
pub struct MySqlValueConverter;

impl MySqlValueConverter {
    pub fn convert_row(row: &MySqlRow) -> TraitRow {
        let cells = row
            .columns()
            .iter()
            .map(|col| {
                let value = Self::extract_value(row, col.ordinal(), col.type_info().name());
                Cell::new(col.name(), value)
            })
            .collect();

        TraitRow::new(cells)
    }

    /// Render the cell at `index` as text, empty for NULL.
    ///
    /// Catalog statements (`SHOW TABLES`, `DESCRIBE`) report some columns as
    /// blobs depending on server version, so this goes through the full decoder.
    pub fn text_at(row: &MySqlRow, index: usize) -> String {
        match row.columns().get(index) {
            Some(col) => Self::extract_value(row, index, col.type_info().name()).to_cell_string(),
            None => String::new(),
        }
    }

    fn extract_value(row: &MySqlRow, idx: usize, type_name: &str) -> Value {
        if row.try_get_raw(idx).map_or(true, |raw| raw.is_null()) {
            return Value::Null;
        }

        let value = match type_name {
            "BOOLEAN" => decode(row, idx, Value::Bool),
            "TINYINT" => decode(row, idx, |v: i8| Value::Int64(v.into())),
            "TINYINT UNSIGNED" => decode(row, idx, |v: u8| Value::Int64(v.into())),
            "SMALLINT" => decode(row, idx, |v: i16| Value::Int64(v.into())),
            "SMALLINT UNSIGNED" => decode(row, idx, |v: u16| Value::Int64(v.into())),
            "YEAR" => row.try_get_unchecked::<u16, _>(idx).ok().map(|v| Value::Int64(v.into())),
            "MEDIUMINT" | "INT" => decode(row, idx, |v: i32| Value::Int64(v.into())),
            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => {
                decode(row, idx, |v: u32| Value::Int64(v.into()))
            }
            "BIGINT" => decode(row, idx, Value::Int64),
            // Above i64::MAX the digits are kept as text
            "BIGINT UNSIGNED" => decode(row, idx, |v: u64| match i64::try_from(v) {
                Ok(signed) => Value::Int64(signed),
                Err(_) => Value::Text(v.to_string()),
            }),
            "FLOAT" => decode(row, idx, |v: f32| Value::Float64(v.into())),
            "DOUBLE" => decode(row, idx, Value::Float64),
            "DECIMAL" => decode(row, idx, Value::Decimal),
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => {
                decode(row, idx, Value::Text)
            }
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                decode(row, idx, Value::Bytes)
            }
            "DATE" => decode(row, idx, Value::Date),
            "TIME" => decode(row, idx, Value::Time),
            "DATETIME" => decode(row, idx, Value::DateTime),
            // sqlx pins the session to UTC, so the UTC wall clock is what the server shows
            "TIMESTAMP" => decode(row, idx, |v: DateTime<Utc>| Value::DateTime(v.naive_utc()))
                .or_else(|| decode(row, idx, Value::DateTime)),
            // ENUM, SET, JSON and anything newer
            _ => None,
        };

        value
            .or_else(|| row.try_get_unchecked::<String, _>(idx).ok().map(Value::Text))
            .or_else(|| row.try_get_unchecked::<Vec<u8>, _>(idx).ok().map(Value::Bytes))
            .unwrap_or(Value::Null)
    }

    /// Bind a unified value as the next positional parameter.
    pub fn bind_value<'q>(
        query: Query<'q, MySql, MySqlArguments>,
        value: &Value,
    ) -> Query<'q, MySql, MySqlArguments> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int64(v) => query.bind(*v),
            Value::Float64(v) => query.bind(*v),
            Value::Decimal(d) => query.bind(*d),
            Value::Text(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Date(d) => query.bind(*d),
            Value::Time(t) => query.bind(*t),
            Value::DateTime(dt) => query.bind(*dt),
        }
    }
}

/// Decode column `idx` as `T`; `None` on a type mismatch.
fn decode<'r, T, F>(row: &'r MySqlRow, idx: usize, f: F) -> Option<Value>
where
    T: Decode<'r, MySql> + Type<MySql>,
    F: FnOnce(T) -> Value,
{
    row.try_get::<T, _>(idx).ok().map(f)
}
