//! SQL Server type conversion utilities.
//!
//! Tiberius reports the TDS wire type of every column; nullable variants
//! (`Intn`, `Floatn`, ...) may carry any width, so those try each width in turn.

use chrono::{DateTime, FixedOffset};
use tiberius::{ColumnType, FromSql, Query};
use uuid::Uuid;

use crate::services::database::traits::{Cell, Row as TraitRow, Value};

/// Converter between Tiberius values and the unified `Value` type.
pub struct MssqlValueConverter;

impl MssqlValueConverter {
    /// Convert a Tiberius row to a trait Row.
    pub fn convert_row(row: &tiberius::Row) -> TraitRow {
        let cells = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Cell::new(col.name(), Self::extract_value(row, col.column_type(), idx)))
            .collect();

        TraitRow::new(cells)
    }

    fn extract_value(row: &tiberius::Row, column_type: ColumnType, idx: usize) -> Value {
        let value = match column_type {
            ColumnType::Null => None,

            ColumnType::Bit | ColumnType::Bitn => decode(row, idx, Value::Bool),

            ColumnType::Int1 => decode(row, idx, |v: u8| Value::Int64(v as i64)),
            ColumnType::Int2 => decode(row, idx, |v: i16| Value::Int64(v as i64)),
            ColumnType::Int4 => decode(row, idx, |v: i32| Value::Int64(v as i64)),
            ColumnType::Int8 => decode(row, idx, Value::Int64),
            ColumnType::Intn => decode(row, idx, |v: i32| Value::Int64(v as i64))
                .or_else(|| decode(row, idx, Value::Int64))
                .or_else(|| decode(row, idx, |v: i16| Value::Int64(v as i64)))
                .or_else(|| decode(row, idx, |v: u8| Value::Int64(v as i64))),

            ColumnType::Float4 => decode(row, idx, |v: f32| Value::Float64(v as f64)),
            ColumnType::Float8 => decode(row, idx, Value::Float64),
            ColumnType::Floatn => decode(row, idx, Value::Float64)
                .or_else(|| decode(row, idx, |v: f32| Value::Float64(v as f64))),

            ColumnType::Decimaln
            | ColumnType::Numericn
            | ColumnType::Money
            | ColumnType::Money4 => decode(row, idx, Value::Decimal)
                .or_else(|| decode(row, idx, Value::Float64)),

            ColumnType::Datetime
            | ColumnType::Datetime4
            | ColumnType::Datetimen
            | ColumnType::Datetime2 => decode(row, idx, Value::DateTime),
            ColumnType::Daten => decode(row, idx, Value::Date),
            ColumnType::Timen => decode(row, idx, Value::Time),
            // Keep the wall clock the server stored; the offset is dropped
            ColumnType::DatetimeOffsetn => {
                decode(row, idx, |v: DateTime<FixedOffset>| Value::DateTime(v.naive_local()))
            }

            ColumnType::Guid => decode(row, idx, |v: Uuid| Value::Text(v.to_string())),

            ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => {
                decode::<&[u8], _>(row, idx, |v| Value::Bytes(v.to_vec()))
            }

            _ => decode::<&str, _>(row, idx, |v| Value::Text(v.to_string())),
        };

        value.unwrap_or(Value::Null)
    }

    /// Bind a unified value as the next `@Pn` parameter.
    pub fn bind_value(query: &mut Query<'_>, value: &Value) {
        match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Int64(v) => query.bind(*v),
            Value::Float64(v) => query.bind(*v),
            Value::Decimal(d) => query.bind(tiberius::numeric::Numeric::new_with_scale(
                d.mantissa(),
                d.scale() as u8,
            )),
            Value::Text(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Date(d) => query.bind(*d),
            Value::Time(t) => query.bind(*t),
            Value::DateTime(dt) => query.bind(*dt),
        }
    }
}

/// Decode column `idx` as `T`; `None` for NULL or a type mismatch.
fn decode<'a, T, F>(row: &'a tiberius::Row, idx: usize, f: F) -> Option<Value>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> Value,
{
    row.try_get::<T, usize>(idx).ok().flatten().map(f)
}

