//! PostgreSQL value conversion.
//!
//! Cells are decoded by the column's reported type name. Names sqlx does not
//! map fall back to their text form.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::services::database::traits::{Cell, Row as TraitRow, Value};

/// Converter between PostgreSQL values and the unified `Value` type.
pub struct PgValueConverter;

impl PgValueConverter {
    pub fn convert_row(row: &PgRow) -> TraitRow {
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

    fn extract_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
        if row.try_get_raw(idx).map_or(true, |raw| raw.is_null()) {
            return Value::Null;
        }

        let value = match type_name {
            "BOOL" => decode(row, idx, Value::Bool),
            "INT2" => decode(row, idx, |v: i16| Value::Int64(v.into())),
            "INT4" => decode(row, idx, |v: i32| Value::Int64(v.into())),
            "INT8" => decode(row, idx, Value::Int64),
            "OID" => decode(row, idx, |v: sqlx::postgres::types::Oid| Value::Int64(v.0.into())),
            "FLOAT4" => decode(row, idx, |v: f32| Value::Float64(v.into())),
            "FLOAT8" => decode(row, idx, Value::Float64),
            "NUMERIC" => decode(row, idx, Value::Decimal),
            "BYTEA" => decode(row, idx, Value::Bytes),
            "DATE" => decode(row, idx, Value::Date),
            "TIME" => decode(row, idx, Value::Time),
            "TIMESTAMP" => decode(row, idx, Value::DateTime),
            // The UTC wall clock is kept, the zone is dropped
            "TIMESTAMPTZ" => decode(row, idx, |v: DateTime<Utc>| Value::DateTime(v.naive_utc())),
            "UUID" => decode(row, idx, |v: Uuid| Value::Text(v.to_string())),
            _ => None,
        };

        value
            .or_else(|| {
                row.try_get_unchecked::<String, _>(idx)
                    .ok()
                    .map(Value::Text)
            })
            .unwrap_or(Value::Null)
    }

    /// Bind a unified value as the next `$n` parameter.
    pub fn bind_value<'q>(
        query: Query<'q, Postgres, PgArguments>,
        value: &Value,
    ) -> Query<'q, Postgres, PgArguments> {
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
fn decode<'r, T, F>(row: &'r PgRow, idx: usize, f: F) -> Option<Value>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
    F: FnOnce(T) -> Value,
{
    row.try_get::<T, _>(idx).ok().map(f)
}

