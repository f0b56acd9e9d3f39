//! Mapping between file headers and table columns.
//!
//! A `SchemaMapper` is built from `describe_table` and answers the questions
//! the transfer engines ask: which column does this header mean, which
//! column is the primary key, which columns are generated by the engine, and
//! how should a cell be coerced.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::{DataError, Result};
use crate::services::database::traits::{ColumnDescriptor, DialectDriver};

/// How import coerces a cell for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// `INT`, `NUMBER`: parsed as an integer, falling back to a float
    Integer,
    /// `DECIMAL`, `NUMERIC`, `FLOAT`, `DOUBLE`, `REAL`
    Numeric,
    /// `DATE`, `TIME`: canonicalized to `YYYY-MM-DD[ HH:MM:SS]`
    DateTime,
    Text,
}

impl TypeClass {
    /// Classify a catalog data type name.
    pub fn of(data_type: &str) -> Self {
        let t = data_type.to_uppercase();
        if t.contains("INT") || t.contains("NUMBER") {
            TypeClass::Integer
        } else if ["DECIMAL", "NUMERIC", "FLOAT", "DOUBLE", "REAL"]
            .iter()
            .any(|k| t.contains(k))
        {
            TypeClass::Numeric
        } else if t.contains("DATE") || t.contains("TIME") {
            TypeClass::DateTime
        } else {
            TypeClass::Text
        }
    }
}

/// Header and column lookups for one table.
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    table: String,
    columns: Vec<ColumnDescriptor>,
    /// UPPERCASE(name or comment) -> canonical column name
    field_map: HashMap<String, String>,
    primary_key: Option<String>,
    identity: HashSet<String>,
}

impl SchemaMapper {
    /// Build the mapper from `describe_table` output.
    ///
    /// An empty description means the table does not exist. A composite
    /// primary key is reported as no primary key.
    pub fn new(table: &str, columns: Vec<ColumnDescriptor>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DataError::TableNotFound(table.to_string()));
        }

        let mut field_map = HashMap::new();
        // Column names win over comments that happen to spell another column
        for col in &columns {
            field_map.insert(col.column_name.trim().to_uppercase(), col.column_name.clone());
        }
        for col in &columns {
            if let Some(label) = col.label() {
                field_map
                    .entry(label.to_uppercase())
                    .or_insert_with(|| col.column_name.clone());
            }
        }

        let keys: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.is_primary_key()).collect();
        let primary_key = match keys.as_slice() {
            [only] => Some(only.column_name.clone()),
            [] => None,
            _ => {
                warn!(table, columns = keys.len(), "composite primary key treated as none");
                None
            }
        };

        let identity = columns
            .iter()
            .filter(|c| c.is_identity())
            .map(|c| c.column_name.clone())
            .collect();

        Ok(Self {
            table: table.to_string(),
            columns,
            field_map,
            primary_key,
            identity,
        })
    }

    /// Describe `table` through the driver and build the mapper.
    pub async fn load(driver: &dyn DialectDriver, table: &str) -> Result<Self> {
        let columns = driver.describe_table(table).await?;
        Self::new(table, columns)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column descriptors in declared order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Resolve a file header (column name or comment, any case).
    pub fn resolve(&self, header: &str) -> Option<&str> {
        self.field_map
            .get(&header.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn is_identity(&self, column: &str) -> bool {
        self.identity.contains(column)
    }

    /// Type class of a canonical column; unknown columns are text.
    pub fn type_class(&self, column: &str) -> TypeClass {
        self.descriptor(column)
            .map(|c| TypeClass::of(&c.data_type))
            .unwrap_or(TypeClass::Text)
    }

    /// Catalog data type of a canonical column, empty when unknown.
    pub fn data_type(&self, column: &str) -> &str {
        self.descriptor(column)
            .map(|c| c.data_type.as_str())
            .unwrap_or_default()
    }

    /// Visible header for a column: its comment when usable, else its name.
    pub fn header_label<'a>(&'a self, column: &'a str) -> &'a str {
        self.descriptor(column)
            .and_then(ColumnDescriptor::label)
            .unwrap_or(column)
    }

    fn descriptor(&self, column: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.column_name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.column_name.eq_ignore_ascii_case(column))
            })
    }
}
