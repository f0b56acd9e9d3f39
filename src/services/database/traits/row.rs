//! Result rows and the values that flow through every driver.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical date-time layout: seconds precision, no timezone.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One cell or bind parameter.
///
/// Drivers decode native column types into this enum and bind it back when
/// the import engine runs parameterized statements. Every integer width
/// widens to `Int64`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Decimal(Decimal),
    Text(String),
    /// Raw bytes; text-like payloads are decoded by the normalizer
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Shell rendering: `NULL` for null, otherwise the cell text.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            other => other.to_cell_string(),
        }
    }

    /// File rendering: empty for null.
    ///
    /// Bytes that are not UTF-8 come out as `\x` followed by lowercase hex.
    pub fn to_cell_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => s.to_string(),
                Err(_) => format!("\\x{}", hex::encode(b)),
            },
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }

    /// Integer view of integer and boolean cells.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A named cell in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Column name as the driver reported it
    pub column: String,
    pub value: Value,
}

impl Cell {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// An ordered record of named cells.
///
/// Cells keep the order the driver returned them in. Lookups by name try an
/// exact match first and then ignore case, since dialects fold identifiers
/// differently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| Cell::new(k, v)).collect())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|c| c.column == column)
            .or_else(|| self.cells.iter().find(|c| c.column.eq_ignore_ascii_case(column)))
            .map(|c| &c.value)
    }

    /// Cell text for `column`, empty when missing or NULL.
    pub fn get_string(&self, column: &str) -> String {
        self.get(column).map(Value::to_cell_string).unwrap_or_default()
    }

    /// Column names in driver order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|c| &c.value)
    }
}

impl IntoIterator for Row {
    type Item = Cell;
    type IntoIter = std::vec::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_renders_differently_for_shell_and_file() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Null.to_cell_string(), "");
        assert_eq!(Value::Bool(false).to_display_string(), "false");
        assert_eq!(Value::Float64(3.5).to_cell_string(), "3.5");
    }

    #[test]
    fn test_datetime_drops_fraction() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 678)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_cell_string(), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_bytes_fall_back_to_hex() {
        assert_eq!(Value::Bytes(b"abc".to_vec()).to_cell_string(), "abc");
        assert_eq!(Value::Bytes(vec![0xDE, 0xAD]).to_cell_string(), "\\xdead");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i64)), Value::Int64(42));
        assert_eq!(Value::from(Option::<&str>::None), Value::Null);
    }

    #[test]
    fn test_lookup_prefers_exact_then_ignores_case() {
        let row = Row::from_pairs(vec![
            ("ID", Value::Int64(1)),
            ("id", Value::Int64(2)),
            ("name", Value::from("a")),
        ]);

        assert_eq!(row.len(), 3);
        assert_eq!(row.get("id"), Some(&Value::Int64(2)));
        assert_eq!(row.get("Id"), Some(&Value::Int64(1)));
        assert_eq!(row.get("NAME"), Some(&Value::from("a")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_string("name"), "a");
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["ID", "id", "name"]);
    }
}
