//! SQL Server schema introspection.
//!
//! Catalog queries are scoped to `TABLE_CATALOG = dbname`. Column comments
//! come from the `MS_Description` extended property of the column in the
//! same schema.

use super::connection::MssqlDriver;
use crate::error::Result;
use crate::services::database::traits::{ColumnDescriptor, DialectDriver, Value};

const TABLES_QUERY: &str = r#"
    SELECT TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_CATALOG = ?
    ORDER BY TABLE_NAME
"#;

const DESCRIBE_QUERY: &str = r#"
    SELECT
        c.COLUMN_NAME AS COLUMN_NAME,
        c.DATA_TYPE AS DATA_TYPE,
        CAST(CASE
            WHEN c.CHARACTER_MAXIMUM_LENGTH IS NOT NULL THEN c.CHARACTER_MAXIMUM_LENGTH
            WHEN c.NUMERIC_PRECISION IS NOT NULL THEN c.NUMERIC_PRECISION
            ELSE NULL
        END AS VARCHAR(20)) AS DATA_LENGTH,
        c.IS_NULLABLE AS NULLABLE,
        CASE
            WHEN pk.COLUMN_NAME IS NOT NULL THEN 'PRIMARY KEY'
            WHEN fk.COLUMN_NAME IS NOT NULL THEN 'FOREIGN KEY'
            ELSE ''
        END AS CONSTRAINT_TYPE,
        CAST(ep.value AS NVARCHAR(4000)) AS DESCRIPTION,
        CASE
            WHEN COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)),
                c.COLUMN_NAME, 'IsIdentity') = 1 THEN 'IDENTITY'
            ELSE ''
        END AS IDENTITY_INFO
    FROM INFORMATION_SCHEMA.COLUMNS c
    LEFT JOIN (
        SELECT ku.TABLE_CATALOG, ku.TABLE_SCHEMA, ku.TABLE_NAME, ku.COLUMN_NAME
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE ku
            ON tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
            AND tc.CONSTRAINT_NAME = ku.CONSTRAINT_NAME
    ) pk
        ON c.TABLE_CATALOG = pk.TABLE_CATALOG
        AND c.TABLE_SCHEMA = pk.TABLE_SCHEMA
        AND c.TABLE_NAME = pk.TABLE_NAME
        AND c.COLUMN_NAME = pk.COLUMN_NAME
    LEFT JOIN (
        SELECT DISTINCT ku.TABLE_CATALOG, ku.TABLE_SCHEMA, ku.TABLE_NAME, ku.COLUMN_NAME
        FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE ku
            ON rc.CONSTRAINT_NAME = ku.CONSTRAINT_NAME
    ) fk
        ON c.TABLE_CATALOG = fk.TABLE_CATALOG
        AND c.TABLE_SCHEMA = fk.TABLE_SCHEMA
        AND c.TABLE_NAME = fk.TABLE_NAME
        AND c.COLUMN_NAME = fk.COLUMN_NAME
    LEFT JOIN (
        SELECT SCHEMA_NAME(t.schema_id) AS SchemaName, t.name AS TableName,
            col.name AS ColumnName, p.value
        FROM sys.tables t
        JOIN sys.columns col ON t.object_id = col.object_id
        JOIN sys.extended_properties p
            ON p.major_id = col.object_id
            AND p.minor_id = col.column_id
            AND p.name = 'MS_Description'
    ) ep
        ON c.TABLE_SCHEMA = ep.SchemaName
        AND c.TABLE_NAME = ep.TableName
        AND c.COLUMN_NAME = ep.ColumnName
    WHERE c.TABLE_CATALOG = ? AND c.TABLE_NAME = ?
    ORDER BY c.ORDINAL_POSITION
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT COLUMN_NAME
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_CATALOG = ? AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

impl MssqlDriver {
    fn catalog(&self) -> Value {
        Value::Text(self.connection_config().dbname.clone())
    }

    pub(super) async fn fetch_tables(&self) -> Result<Vec<String>> {
        let rows = self.fetch_rows(TABLES_QUERY, &[self.catalog()]).await?;
        Ok(rows.iter().map(|row| row.get_string("TABLE_NAME")).collect())
    }

    pub(super) async fn fetch_column_descriptors(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let params = [self.catalog(), Value::Text(table.to_string())];
        let rows = self.fetch_rows(DESCRIBE_QUERY, &params).await?;
        Ok(rows.iter().map(ColumnDescriptor::from_catalog_row).collect())
    }

    pub(super) async fn fetch_column_names(&self, table: &str) -> Result<Vec<String>> {
        let params = [self.catalog(), Value::Text(table.to_string())];
        let rows = self.fetch_rows(COLUMNS_QUERY, &params).await?;
        Ok(rows.iter().map(|row| row.get_string("COLUMN_NAME")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::drivers::placeholders;
    use crate::services::database::traits::Row;

    #[test]
    fn test_describe_query_binds_catalog_then_table() {
        let rewritten = placeholders::to_at_p(DESCRIBE_QUERY);
        assert!(rewritten.contains("c.TABLE_CATALOG = @P1 AND c.TABLE_NAME = @P2"));
        // the '.' literal in the identity lookup is not a placeholder
        assert!(!rewritten.contains("@P3"));
    }

    #[test]
    fn test_comment_join_is_schema_scoped() {
        let join = DESCRIBE_QUERY
            .split(") ep")
            .nth(1)
            .and_then(|rest| rest.split("WHERE").next())
            .unwrap();
        assert!(join.contains("c.TABLE_SCHEMA = ep.SchemaName"));
        assert!(join.contains("c.TABLE_NAME = ep.TableName"));
        assert!(join.contains("c.COLUMN_NAME = ep.ColumnName"));
    }

    #[test]
    fn test_descriptor_from_mssql_catalog_row() {
        let row = Row::from_pairs(vec![
            ("COLUMN_NAME", Value::from("user_id")),
            ("DATA_TYPE", Value::from("int")),
            ("DATA_LENGTH", Value::from("10")),
            ("NULLABLE", Value::from("NO")),
            ("CONSTRAINT_TYPE", Value::from("PRIMARY KEY")),
            ("DESCRIPTION", Value::Null),
            ("IDENTITY_INFO", Value::from("IDENTITY")),
        ]);

        let col = ColumnDescriptor::from_catalog_row(&row);
        assert_eq!(col.column_name, "user_id");
        assert!(col.is_primary_key());
        assert!(col.is_identity());
        assert_eq!(col.description, "");
    }
}
