//! PostgreSQL schema introspection.
//!
//! Only the `public` schema is inspected. PostgreSQL folds unquoted
//! identifiers to lowercase, so table names are lowercased before binding.
//! information_schema columns are domain types; they are cast to `text` so
//! every catalog cell decodes as plain text. Enum columns report their type
//! name so it can be used as a cast target.

use super::connection::PostgresDriver;
use super::types::PgValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::traits::ColumnDescriptor;

const TABLES_QUERY: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = 'public'
        AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const DESCRIBE_QUERY: &str = r#"
    SELECT
        c.column_name::text AS column_name,
        CASE
            WHEN c.data_type = 'USER-DEFINED' THEN quote_ident(c.udt_name::text)
            ELSE c.data_type::text
        END AS data_type,
        COALESCE(c.character_maximum_length::text, '') AS data_length,
        c.is_nullable::text AS nullable,
        CASE
            WHEN pk.column_name IS NOT NULL THEN 'PRIMARY KEY'
            ELSE ''
        END AS constraint_type,
        COALESCE(pgd.description, '') AS description,
        CASE
            WHEN c.column_default LIKE 'nextval%' THEN 'IDENTITY'
            WHEN c.is_identity = 'YES' THEN 'IDENTITY'
            ELSE ''
        END AS identity_info
    FROM information_schema.columns c
    LEFT JOIN (
        SELECT tc.table_schema, tc.table_name, kcu.column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
        WHERE tc.constraint_type = 'PRIMARY KEY'
    ) pk
        ON c.table_schema = pk.table_schema
        AND c.table_name = pk.table_name
        AND c.column_name = pk.column_name
    LEFT JOIN pg_catalog.pg_statio_all_tables st
        ON st.schemaname = c.table_schema
        AND st.relname = c.table_name
    LEFT JOIN pg_catalog.pg_description pgd
        ON pgd.objoid = st.relid
        AND pgd.objsubid = c.ordinal_position
    WHERE c.table_schema = 'public'
        AND c.table_name = $1
    ORDER BY c.ordinal_position
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT column_name::text AS column_name
    FROM information_schema.columns
    WHERE table_schema = 'public'
        AND table_name = $1
    ORDER BY ordinal_position
"#;

impl PostgresDriver {
    pub(super) async fn fetch_tables(&self) -> Result<Vec<String>> {
        let pool = self.get_pool().await?;

        let rows = sqlx::query(TABLES_QUERY)
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(PgValueConverter::convert_row)
            .map(|row| row.get_string("table_name"))
            .collect())
    }

    pub(super) async fn fetch_column_descriptors(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let pool = self.get_pool().await?;

        let rows = sqlx::query(DESCRIBE_QUERY)
            .bind(table.to_lowercase())
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(PgValueConverter::convert_row)
            .map(|row| ColumnDescriptor::from_catalog_row(&row))
            .collect())
    }

    pub(super) async fn fetch_column_names(&self, table: &str) -> Result<Vec<String>> {
        let pool = self.get_pool().await?;

        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(table.to_lowercase())
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(PgValueConverter::convert_row)
            .map(|row| row.get_string("column_name"))
            .collect())
    }
}
