//! MySQL connection implementation.
//!
//! This module implements the `DialectDriver` trait for MySQL
//! using SQLx's MySqlPool.

use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use std::time::Duration;
use tracing::{debug, info};

use super::types::MySqlValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::drivers::slot::ConnectionSlot;
use crate::services::database::normalize::normalize_row;
use crate::services::database::traits::{
    BoxedDriver, ColumnDescriptor, ConnectionConfig, DatabaseType, DialectDriver, DriverState,
    Row, Value,
};

/// MySQL dialect driver.
///
/// This struct wraps a SQLx MySqlPool and implements the `DialectDriver` trait.
pub struct MySqlDriver {
    config: ConnectionConfig,
    pool: ConnectionSlot<MySqlPool>,
}

impl std::fmt::Debug for MySqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDriver")
            .field("config", &self.config)
            .field("pool", &"<MySqlPool>")
            .finish()
    }
}

impl MySqlDriver {
    /// Create a new MySQL driver from configuration.
    ///
    /// This does not connect immediately - call `connect()` to establish the connection.
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

    /// Build MySqlConnectOptions from the configuration.
    fn build_connect_options(&self) -> Result<MySqlConnectOptions> {
        let config = &self.config;
        if config.host.trim().is_empty() {
            return Err(DataError::connect(DatabaseType::MySQL, "host is required"));
        }

        Ok(MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.effective_port())
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname)
            .charset("utf8mb4")
            .ssl_mode(MySqlSslMode::Preferred))
    }

    /// Get a clone of the connection pool.
    ///
    /// Returns `NotConnected` outside the connected state.
    pub(super) async fn get_pool(&self) -> Result<MySqlPool> {
        self.pool.get().await
    }
}

#[async_trait]
impl DialectDriver for MySqlDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
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

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| DataError::connect(DatabaseType::MySQL, e))?;

        // Round trip before declaring the connection usable
        if let Err(e) = sqlx::query("SELECT 1").fetch_one(&pool).await {
            pool.close().await;
            return Err(DataError::connect(DatabaseType::MySQL, e));
        }

        self.pool.install(pool).await?;
        info!(connection = %self.display_name(), "connected to MySQL");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let pool = self.pool.take().await?;
        pool.close().await;
        info!("MySQL connection closed");
        Ok(())
    }

    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let pool = self.get_pool().await?;
        debug!(sql, params = params.len(), "mysql query");

        let mut query = sqlx::query(sql);
        for param in params {
            query = MySqlValueConverter::bind_value(query, param);
        }

        let rows = query.fetch_all(&pool).await.map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(MySqlValueConverter::convert_row)
            .map(normalize_row)
            .collect())
    }

    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let pool = self.get_pool().await?;
        debug!(sql, params = params.len(), "mysql execute");

        let mut query = sqlx::query(sql);
        for param in params {
            query = MySqlValueConverter::bind_value(query, param);
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
