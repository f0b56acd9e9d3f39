//! SQLite schema introspection.
//!
//! Uses the `pragma_table_info` and `pragma_foreign_key_list` table-valued
//! functions. SQLite has no column comments, so descriptions are empty.

use std::collections::HashSet;

use super::connection::SqliteDriver;
use super::types::SqliteValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::traits::schema::split_type_length;
use crate::services::database::traits::{ColumnDescriptor, FOREIGN_KEY, PRIMARY_KEY, Value};

const TABLES_QUERY: &str = r#"
    SELECT name
    FROM sqlite_master
    WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
    ORDER BY name
"#;

const TABLE_INFO_QUERY: &str = r#"
    SELECT name, type, "notnull", pk
    FROM pragma_table_info(?)
    ORDER BY cid
"#;

const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT "from"
    FROM pragma_foreign_key_list(?)
"#;

/// One row of `pragma_table_info`.
#[derive(Debug, Clone)]
struct PragmaColumn {
    name: String,
    declared_type: String,
    not_null: bool,
    /// 1-based position within the primary key, 0 when not part of it
    pk: i64,
}

impl SqliteDriver {
    pub(super) async fn fetch_tables(&self) -> Result<Vec<String>> {
        let pool = self.get_pool().await?;

        let rows = sqlx::query(TABLES_QUERY)
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(SqliteValueConverter::convert_row)
            .map(|row| row.get_string("name"))
            .collect())
    }

    async fn fetch_pragma_columns(&self, table: &str) -> Result<Vec<PragmaColumn>> {
        let pool = self.get_pool().await?;

        let rows = sqlx::query(TABLE_INFO_QUERY)
            .bind(table.to_string())
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(SqliteValueConverter::convert_row)
            .map(|row| PragmaColumn {
                name: row.get_string("name"),
                declared_type: row.get_string("type"),
                not_null: row.get("notnull").and_then(Value::as_i64).unwrap_or(0) != 0,
                pk: row.get("pk").and_then(Value::as_i64).unwrap_or(0),
            })
            .collect())
    }

    pub(super) async fn fetch_column_descriptors(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let columns = self.fetch_pragma_columns(table).await?;
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.get_pool().await?;
        let foreign: HashSet<String> = sqlx::query(FOREIGN_KEYS_QUERY)
            .bind(table.to_string())
            .fetch_all(&pool)
            .await
            .map_err(DataError::query)?
            .iter()
            .map(SqliteValueConverter::convert_row)
            .map(|row| row.get_string("from"))
            .collect();

        Ok(assemble_descriptors(&columns, &foreign))
    }

    pub(super) async fn fetch_column_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .fetch_pragma_columns(table)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }
}

/// Turn pragma rows into descriptors.
///
/// A table whose primary key is a single `INTEGER` column aliases the rowid,
/// so that column is reported as an identity.
fn assemble_descriptors(
    columns: &[PragmaColumn],
    foreign: &HashSet<String>,
) -> Vec<ColumnDescriptor> {
    let pk_count = columns.iter().filter(|c| c.pk > 0).count();

    columns
        .iter()
        .map(|c| {
            let (data_type, length) = split_type_length(&c.declared_type);
            let is_pk = c.pk > 0;
            let constraint = if is_pk {
                PRIMARY_KEY
            } else if foreign.contains(&c.name) {
                FOREIGN_KEY
            } else {
                ""
            };
            let is_rowid_alias = is_pk && pk_count == 1 && data_type.eq_ignore_ascii_case("INTEGER");

            ColumnDescriptor::new(c.name.clone(), data_type)
                .with_length(length)
                .with_nullable(if c.not_null || is_pk { "NO" } else { "YES" })
                .with_constraint(constraint)
                .with_identity(is_rowid_alias)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::traits::{ConnectionConfig, DialectDriver};

    fn col(name: &str, declared_type: &str, not_null: bool, pk: i64) -> PragmaColumn {
        PragmaColumn {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            not_null,
            pk,
        }
    }

    #[test]
    fn test_assemble_rowid_alias_is_identity() {
        let columns = vec![
            col("id", "INTEGER", false, 1),
            col("v", "VARCHAR(20)", false, 0),
            col("owner", "INT", true, 0),
        ];
        let foreign: HashSet<String> = ["owner".to_string()].into_iter().collect();

        let out = assemble_descriptors(&columns, &foreign);
        assert_eq!(out.len(), 3);

        assert!(out[0].is_primary_key());
        assert!(out[0].is_identity());
        assert_eq!(out[0].nullable, "NO");

        assert_eq!(out[1].data_type, "VARCHAR");
        assert_eq!(out[1].length, "20");
        assert_eq!(out[1].nullable, "YES");
        assert_eq!(out[1].constraint_type, "");

        assert_eq!(out[2].constraint_type, FOREIGN_KEY);
        assert_eq!(out[2].nullable, "NO");
        assert!(!out[2].is_identity());
    }

    #[test]
    fn test_assemble_composite_pk_has_no_identity() {
        let columns = vec![col("a", "INTEGER", false, 1), col("b", "INTEGER", false, 2)];
        let out = assemble_descriptors(&columns, &HashSet::new());
        assert!(out.iter().all(|c| c.is_primary_key()));
        assert!(out.iter().all(|c| !c.is_identity()));
    }

    #[test]
    fn test_assemble_int_pk_is_not_rowid_alias() {
        // only the exact INTEGER spelling aliases the rowid
        let out = assemble_descriptors(&[col("id", "INT", false, 1)], &HashSet::new());
        assert!(out[0].is_primary_key());
        assert!(!out[0].is_identity());
    }

    #[test]
    fn test_describe_live_table() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("schema.db");
            let mut driver = SqliteDriver::new(ConnectionConfig::sqlite(
                path.to_string_lossy().to_string(),
            ));
            driver.connect().await.unwrap();

            driver
                .execute("CREATE TABLE parent (id INTEGER PRIMARY KEY, name VARCHAR(32) NOT NULL)")
                .await
                .unwrap();
            driver
                .execute(
                    "CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INT REFERENCES parent(id), note TEXT)",
                )
                .await
                .unwrap();

            assert_eq!(
                driver.get_tables().await.unwrap(),
                vec!["child".to_string(), "parent".to_string()]
            );

            let child = driver.describe_table("child").await.unwrap();
            assert_eq!(child.len(), 3);
            assert!(child[0].is_identity());
            assert_eq!(child[1].constraint_type, FOREIGN_KEY);
            assert_eq!(child[2].data_type, "TEXT");

            let parent = driver.describe_table("parent").await.unwrap();
            assert_eq!(parent[1].length, "32");
            assert_eq!(parent[1].nullable, "NO");

            assert!(driver.describe_table("nope").await.unwrap().is_empty());
            assert!(driver.get_table_columns("nope").await.unwrap().is_empty());

            driver.disconnect().await.unwrap();
        });
    }
}
