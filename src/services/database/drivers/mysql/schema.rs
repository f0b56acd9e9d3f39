//! MySQL schema introspection.
//!
//! `DescribeTable` combines the `DESCRIBE` output (type, nullability, extra)
//! with the primary-key columns from `KEY_COLUMN_USAGE` and column comments
//! from `INFORMATION_SCHEMA.COLUMNS`.

use std::collections::{HashMap, HashSet};

use sqlx::Row;

use super::connection::MySqlDriver;
use super::types::MySqlValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::traits::schema::split_type_length;
use crate::services::database::traits::{ColumnDescriptor, DialectDriver, PRIMARY_KEY};

/// SQLSTATE for "table doesn't exist".
const NO_SUCH_TABLE: &str = "42S02";

impl MySqlDriver {
    pub(super) async fn fetch_tables(&self) -> Result<Vec<String>> {
        let pool = self.get_pool().await?;

        let rows = sqlx::query("SHOW TABLES")
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(|row| MySqlValueConverter::text_at(row, 0))
            .collect())
    }

    pub(super) async fn fetch_column_descriptors(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let pool = self.get_pool().await?;
        let dbname = &self.connection_config().dbname;

        let describe_sql = format!("DESCRIBE `{}`", table.replace('`', "``"));
        let described = match sqlx::query(&describe_sql).fetch_all(&pool).await {
            Ok(rows) => rows,
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(NO_SUCH_TABLE) => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(DataError::query(e)),
        };

        let pk_query = r#"
            SELECT COLUMN_NAME
            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ?
                AND TABLE_NAME = ?
                AND CONSTRAINT_NAME = 'PRIMARY'
        "#;

        let primary_keys: HashSet<String> = sqlx::query(pk_query)
            .bind(dbname)
            .bind(table)
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?
            .iter()
            .map(|row| MySqlValueConverter::text_at(row, 0))
            .collect();

        let comment_query = r#"
            SELECT COLUMN_NAME, COLUMN_COMMENT
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ?
                AND TABLE_NAME = ?
        "#;

        let comments: HashMap<String, String> = sqlx::query(comment_query)
            .bind(dbname)
            .bind(table)
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?
            .iter()
            .map(|row| {
                (
                    MySqlValueConverter::text_at(row, 0),
                    MySqlValueConverter::text_at(row, 1),
                )
            })
            .collect();

        // DESCRIBE columns: Field, Type, Null, Key, Default, Extra
        Ok(described
            .iter()
            .map(|row| {
                let field = MySqlValueConverter::text_at(row, 0);
                let column_type = MySqlValueConverter::text_at(row, 1);
                let nullable = MySqlValueConverter::text_at(row, 2);
                let extra = if row.len() >= 6 {
                    MySqlValueConverter::text_at(row, 5)
                } else {
                    String::new()
                };
                let is_pk = primary_keys.contains(&field);
                let comment = comments.get(&field).cloned().unwrap_or_default();
                describe_row(field, &column_type, nullable, &extra, is_pk, comment)
            })
            .collect())
    }

    pub(super) async fn fetch_column_names(&self, table: &str) -> Result<Vec<String>> {
        let pool = self.get_pool().await?;

        let query = r#"
            SELECT COLUMN_NAME
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query(query)
            .bind(&self.connection_config().dbname)
            .bind(table)
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(|row| MySqlValueConverter::text_at(row, 0))
            .collect())
    }
}

/// Assemble one descriptor from a `DESCRIBE` row and the side lookups.
fn describe_row(
    field: String,
    column_type: &str,
    nullable: String,
    extra: &str,
    is_primary_key: bool,
    comment: String,
) -> ColumnDescriptor {
    let (data_type, length) = split_type_length(column_type);

    ColumnDescriptor::new(field, data_type)
        .with_length(length)
        .with_nullable(nullable)
        .with_constraint(if is_primary_key { PRIMARY_KEY } else { "" })
        .with_description(comment)
        .with_identity(extra.to_lowercase().contains("auto_increment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_row_auto_increment_pk() {
        let col = describe_row(
            "id".to_string(),
            "int(11)",
            "NO".to_string(),
            "auto_increment",
            true,
            "用户ID".to_string(),
        );

        assert_eq!(col.column_name, "id");
        assert_eq!(col.data_type, "int");
        assert_eq!(col.length, "11");
        assert_eq!(col.nullable, "NO");
        assert!(col.is_primary_key());
        assert!(col.is_identity());
        assert_eq!(col.label(), Some("用户ID"));
    }

    #[test]
    fn test_describe_row_plain_column() {
        let col = describe_row(
            "nick".to_string(),
            "varchar(32)",
            "YES".to_string(),
            "",
            false,
            String::new(),
        );

        assert_eq!(col.data_type, "varchar");
        assert_eq!(col.length, "32");
        assert_eq!(col.constraint_type, "");
        assert_eq!(col.identity_info, "");
        assert_eq!(col.label(), None);
    }

    #[test]
    fn test_describe_row_without_length() {
        let col = describe_row("body".into(), "text", "YES".into(), "", false, String::new());
        assert_eq!(col.data_type, "text");
        assert_eq!(col.length, "");
    }
}
