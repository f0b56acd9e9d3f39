//! Normalized table metadata.
//!
//! Every dialect's catalog query is aliased to the same seven keys so that
//! `ColumnDescriptor::from_catalog_row` can build descriptors regardless of
//! how the engine folds identifier case.

use serde::{Deserialize, Serialize};

use super::row::{Row, Value};

pub const PRIMARY_KEY: &str = "PRIMARY KEY";
pub const FOREIGN_KEY: &str = "FOREIGN KEY";
pub const UNIQUE: &str = "UNIQUE";
pub const IDENTITY: &str = "IDENTITY";

/// Catalog result keys shared by all dialects.
pub mod keys {
    pub const COLUMN_NAME: &str = "COLUMN_NAME";
    pub const DATA_TYPE: &str = "DATA_TYPE";
    pub const DATA_LENGTH: &str = "DATA_LENGTH";
    pub const NULLABLE: &str = "NULLABLE";
    pub const CONSTRAINT_TYPE: &str = "CONSTRAINT_TYPE";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const IDENTITY_INFO: &str = "IDENTITY_INFO";
}

/// One column of a `DescribeTable` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    /// Declared length, empty when the type has none
    pub length: String,
    /// `Y`/`N` or `YES`/`NO` as the dialect reports it
    pub nullable: String,
    /// `PRIMARY KEY`, `FOREIGN KEY`, `UNIQUE` or empty
    pub constraint_type: String,
    /// Column comment, empty when absent
    pub description: String,
    /// `IDENTITY` or empty
    pub identity_info: String,
}

impl ColumnDescriptor {
    /// Create a descriptor with just a name and type
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = length.into();
        self
    }

    pub fn with_nullable(mut self, nullable: impl Into<String>) -> Self {
        self.nullable = nullable.into();
        self
    }

    pub fn with_constraint(mut self, constraint_type: impl Into<String>) -> Self {
        self.constraint_type = constraint_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_identity(mut self, is_identity: bool) -> Self {
        self.identity_info = if is_identity { IDENTITY.to_string() } else { String::new() };
        self
    }

    /// Build a descriptor from a catalog row aliased to the shared keys.
    pub fn from_catalog_row(row: &Row) -> Self {
        let text = |key: &str| match row.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(v) => v.to_cell_string().trim().to_string(),
        };

        Self {
            column_name: text(keys::COLUMN_NAME),
            data_type: text(keys::DATA_TYPE),
            length: text(keys::DATA_LENGTH),
            nullable: text(keys::NULLABLE),
            constraint_type: text(keys::CONSTRAINT_TYPE),
            description: text(keys::DESCRIPTION),
            identity_info: text(keys::IDENTITY_INFO),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraint_type.to_uppercase().contains(PRIMARY_KEY)
    }

    pub fn is_identity(&self) -> bool {
        self.identity_info.to_uppercase().contains(IDENTITY)
    }

    /// The comment to show instead of the column name, if it is usable.
    pub fn label(&self) -> Option<&str> {
        let d = self.description.trim();
        if d.is_empty() || d == "<nil>" {
            None
        } else {
            Some(d)
        }
    }
}

/// Split a `type(n)` or `type(p,s)` spelling into its base name and length.
pub fn split_type_length(column_type: &str) -> (String, String) {
    match column_type.find('(') {
        Some(open) => {
            let base = column_type[..open].trim().to_string();
            let rest = &column_type[open + 1..];
            let length = rest.split(')').next().unwrap_or_default().trim().to_string();
            (base, length)
        }
        None => (column_type.trim().to_string(), String::new()),
    }
}
