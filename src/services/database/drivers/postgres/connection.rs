//! PostgreSQL connection implementation.
//!
//! This module implements the `DialectDriver` trait for PostgreSQL
//! using SQLx's PgPool. Parameterized statements arrive with `?`
//! placeholders and are rewritten to `$n` before they are prepared.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::{debug, info};

use super::types::PgValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::drivers::placeholders;
use crate::services::database::drivers::slot::ConnectionSlot;
use crate::services::database::normalize::normalize_row;
use crate::services::database::traits::{
    BoxedDriver, ColumnDescriptor, ConnectionConfig, DatabaseType, DialectDriver, DriverState,
    Row, Value,
};

/// PostgreSQL dialect driver.
pub struct PostgresDriver {
    config: ConnectionConfig,
    pool: ConnectionSlot<PgPool>,
}

impl std::fmt::Debug for PostgresDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDriver")
            .field("config", &self.config)
            .field("pool", &"<PgPool>")
            .finish()
    }
}

impl PostgresDriver {
    /// Create a new PostgreSQL driver from configuration.
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

    /// Build PgConnectOptions from the configuration.
    fn build_connect_options(&self) -> Result<PgConnectOptions> {
        let config = &self.config;
        if config.host.trim().is_empty() {
            return Err(DataError::connect(
                DatabaseType::PostgreSQL,
                "host is required",
            ));
        }

        Ok(PgConnectOptions::new()
            .host(&config.host)
            .port(config.effective_port())
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname)
            .ssl_mode(PgSslMode::Disable))
    }

    pub(super) async fn get_pool(&self) -> Result<PgPool> {
        self.pool.get().await
    }
}

#[async_trait]
impl DialectDriver for PostgresDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn state(&self) -> DriverState {
        self.pool.state().await
    }

    /// Text is bound as `text`, which PostgreSQL will not assign to
    /// `boolean`, `uuid`, `jsonb` or enum columns; cast to the column type.
    fn value_placeholder(&self, data_type: &str) -> String {
        match data_type.trim().to_lowercase().as_str() {
            // Text already fits; a bare `character` or `bit` cast would cut to one
            "" | "text" | "character" | "character varying" | "bit" | "bit varying" | "array" => {
                "?".to_string()
            }
            _ => format!("?::{data_type}"),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if !self.pool.should_connect().await? {
            return Ok(());
        }

        let options = self.build_connect_options()?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| DataError::connect(DatabaseType::PostgreSQL, e))?;

        if let Err(e) = sqlx::query("SELECT 1").fetch_one(&pool).await {
            pool.close().await;
            return Err(DataError::connect(DatabaseType::PostgreSQL, e));
        }

        self.pool.install(pool).await?;
        info!(connection = %self.display_name(), "connected to PostgreSQL");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let pool = self.pool.take().await?;
        pool.close().await;
        info!("PostgreSQL connection closed");
        Ok(())
    }

    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let pool = self.get_pool().await?;
        let sql = placeholders::dollar_params(sql, params);
        debug!(sql = %sql, params = params.len(), "postgres query");

        let mut query = sqlx::query(&sql);
        for param in params {
            query = PgValueConverter::bind_value(query, param);
        }

        let rows = query.fetch_all(&pool).await.map_err(DataError::query)?;

        Ok(rows
            .iter()
            .map(PgValueConverter::convert_row)
            .map(normalize_row)
            .collect())
    }

    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let pool = self.get_pool().await?;
        let sql = placeholders::dollar_params(sql, params);
        debug!(sql = %sql, params = params.len(), "postgres execute");

        let mut query = sqlx::query(&sql);
        for param in params {
            query = PgValueConverter::bind_value(query, param);
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
