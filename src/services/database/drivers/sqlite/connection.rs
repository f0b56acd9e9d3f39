//! SQLite connection implementation.
//!
//! This module implements the `DialectDriver` trait for SQLite
//! using SQLx's SqlitePool. The database file is named by `dbname` and is
//! created when missing.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use super::types::SqliteValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::drivers::slot::ConnectionSlot;
use crate::services::database::normalize::normalize_row;
use crate::services::database::traits::{
    BoxedDriver, ColumnDescriptor, ConnectionConfig, DatabaseType, DialectDriver, DriverState,
    Row, Value,
};

/// SQLite dialect driver.
pub struct SqliteDriver {
    config: ConnectionConfig,
    pool: ConnectionSlot<SqlitePool>,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("config", &self.config)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteDriver {
    /// Create a new SQLite driver from configuration.
    ///
    /// This does not connect immediately - call `connect()` to open the file.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: ConnectionSlot::new(),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    /// Build SqliteConnectOptions from the configuration.
    fn build_connect_options(&self) -> Result<SqliteConnectOptions> {
        let path = self.config.dbname.trim();
        if path.is_empty() {
            return Err(DataError::connect(
                DatabaseType::SQLite,
                "database file path is required",
            ));
        }

        Ok(SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal))
    }

    pub(super) async fn get_pool(&self) -> Result<SqlitePool> {
        self.pool.get().await
    }
}

#[async_trait]
impl DialectDriver for SqliteDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn state(&self) -> DriverState {
        self.pool.state().await
    }

    async fn connect(&mut self) -> Result<()> {
        if !self.pool.should_connect().await? {
            return Ok(());
        }

        let options = self.build_connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| DataError::connect(DatabaseType::SQLite, e))?;

        if let Err(e) = sqlx::query("SELECT 1").fetch_one(&pool).await {
            pool.close().await;
            return Err(DataError::connect(DatabaseType::SQLite, e));
        }

        self.pool.install(pool).await?;
        info!(file = %self.config.dbname, "opened SQLite database");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let pool = self.pool.take().await?;
        pool.close().await;
        info!(file = %self.config.dbname, "SQLite database closed");
        Ok(())
    }

    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let pool = self.get_pool().await?;
        debug!(sql, params = params.len(), "sqlite query");

        let mut query = sqlx::query(sql);
        for param in params {
            query = SqliteValueConverter::bind_value(query, param);
        }

        let rows = query.fetch_all(&pool).await.map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(SqliteValueConverter::convert_row)
            .map(normalize_row)
            .collect())
    }

    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let pool = self.get_pool().await?;
        debug!(sql, params = params.len(), "sqlite execute");

        let mut query = sqlx::query(sql);
        for param in params {
            query = SqliteValueConverter::bind_value(query, param);
        }

        let result = query.execute(&pool).await.map_err(DataError::execute)?;
        Ok(result.rows_affected())
    }

    async fn get_tables(&self) -> Result<Vec<String>> {
        self.fetch_tables().await
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.fetch_column_descriptors(table).await
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<String>> {
        self.fetch_column_names(table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(dir: &tempfile::TempDir) -> ConnectionConfig {
        ConnectionConfig::sqlite(dir.path().join("test.db").to_string_lossy().to_string())
    }

    #[test]
    fn test_build_connect_options() {
        let dir = tempfile::tempdir().unwrap();
        let driver = SqliteDriver::new(temp_config(&dir));
        assert!(driver.build_connect_options().is_ok());

        let driver = SqliteDriver::new(ConnectionConfig::sqlite(""));
        assert!(driver.build_connect_options().is_err());
    }

    #[test]
    fn test_sqlite_lifecycle_and_queries() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut driver = SqliteDriver::new(temp_config(&dir));

            assert_eq!(driver.state().await, DriverState::Unconnected);
            driver.connect().await.unwrap();
            assert_eq!(driver.state().await, DriverState::Connected);
            // connecting twice is a no-op
            driver.connect().await.unwrap();

            driver
                .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, ts TIMESTAMP, name TEXT)")
                .await
                .unwrap();

            let affected = driver
                .execute_with_params(
                    "INSERT INTO t (id, ts, name) VALUES (?, ?, ?)",
                    &[
                        Value::Int64(1),
                        Value::Text("2024-01-02 03:04:05.678".to_string()),
                        Value::Text("a".to_string()),
                    ],
                )
                .await
                .unwrap();
            assert_eq!(affected, 1);

            let rows = driver
                .query_with_params("SELECT id, ts, name FROM t WHERE id = ?", &[Value::Int64(1)])
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "ts", "name"]);
            assert_eq!(rows[0].get("id"), Some(&Value::Int64(1)));
            assert_eq!(rows[0].get_string("ts"), "2024-01-02 03:04:05");
            assert_eq!(rows[0].get_string("name"), "a");

            assert_eq!(driver.get_tables().await.unwrap(), vec!["t".to_string()]);
            assert_eq!(
                driver.get_table_columns("t").await.unwrap(),
                vec!["id".to_string(), "ts".to_string(), "name".to_string()]
            );

            driver.disconnect().await.unwrap();
            assert_eq!(driver.state().await, DriverState::Closed);
            assert!(matches!(driver.query("SELECT 1").await, Err(DataError::NotConnected)));
            assert!(matches!(driver.connect().await, Err(DataError::Closed)));
        });
    }

    #[test]
    fn test_query_error_is_wrapped() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut driver = SqliteDriver::new(temp_config(&dir));
            driver.connect().await.unwrap();

            let err = driver.query("SELECT * FROM missing").await.unwrap_err();
            assert!(matches!(err, DataError::QueryFailed(ref m) if m.contains("missing")));

            let err = driver.execute("INSERT INTO missing VALUES (1)").await.unwrap_err();
            assert!(matches!(err, DataError::ExecuteFailed(_)));

            driver.disconnect().await.unwrap();
        });
    }
}
