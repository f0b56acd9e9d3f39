//! SQL Server connection implementation.
//!
//! This module implements the `DialectDriver` trait for SQL Server using
//! Tiberius over a smol TCP stream. TDS connections are not pooled; a single
//! client is shared behind an async mutex, which matches the one-operation-at-
//! a-time usage of the shell.

use std::sync::Arc;

use async_lock::Mutex;
use async_trait::async_trait;
use smol::net::TcpStream;
use tiberius::{AuthMethod, Client, Config, Query};
use tracing::{debug, info, warn};

use super::types::MssqlValueConverter;
use crate::error::{DataError, Result};
use crate::services::database::drivers::placeholders;
use crate::services::database::drivers::slot::ConnectionSlot;
use crate::services::database::normalize::normalize_row;
use crate::services::database::traits::{
    BoxedDriver, ColumnDescriptor, ConnectionConfig, DatabaseType, DialectDriver, DriverState,
    Row, Value,
};

type SharedClient = Arc<Mutex<Client<TcpStream>>>;

/// SQL Server dialect driver.
pub struct MssqlDriver {
    config: ConnectionConfig,
    client: ConnectionSlot<SharedClient>,
}

impl std::fmt::Debug for MssqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlDriver")
            .field("config", &self.config)
            .field("client", &"<TdsClient>")
            .finish()
    }
}

impl MssqlDriver {
    /// Create a new SQL Server driver from configuration.
    ///
    /// This does not connect immediately - call `connect()` to establish the connection.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: ConnectionSlot::new(),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    /// Build the Tiberius configuration.
    fn build_config(&self) -> Result<Config> {
        let c = &self.config;
        if c.host.trim().is_empty() {
            return Err(DataError::connect(DatabaseType::SqlServer, "host is required"));
        }

        let mut config = Config::new();
        config.host(&c.host);
        config.port(c.effective_port());
        config.database(&c.dbname);
        config.authentication(AuthMethod::sql_server(&c.user, &c.password));
        config.trust_cert();
        Ok(config)
    }

    /// Run a row-returning statement without normalizing the cells.
    pub(super) async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let client = self.client.get().await?;
        let sql = placeholders::at_p_params(sql, params);
        debug!(sql = %sql, params = params.len(), "mssql query");

        let mut query = Query::new(sql);
        for param in params {
            MssqlValueConverter::bind_value(&mut query, param);
        }

        let mut client = client.lock().await;
        let rows = query
            .query(&mut *client)
            .await
            .map_err(DataError::query)?
            .into_first_result()
            .await
            .map_err(DataError::query)?;

        Ok(rows.iter().map(MssqlValueConverter::convert_row).collect())
    }
}

#[async_trait]
impl DialectDriver for MssqlDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn state(&self) -> DriverState {
        self.client.state().await
    }

    async fn connect(&mut self) -> Result<()> {
        if !self.client.should_connect().await? {
            return Ok(());
        }

        let config = self.build_config()?;
        let fail = |e: &dyn std::fmt::Display| DataError::connect(DatabaseType::SqlServer, e);

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| fail(&e))?;
        tcp.set_nodelay(true).map_err(|e| fail(&e))?;

        let mut client = Client::connect(config, tcp).await.map_err(|e| fail(&e))?;

        // Round trip before declaring the connection usable
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| fail(&e))?
            .into_row()
            .await
            .map_err(|e| fail(&e))?;

        self.client.install(Arc::new(Mutex::new(client))).await?;
        info!(connection = %self.display_name(), "connected to SQL Server");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let client = self.client.take().await?;
        match Arc::try_unwrap(client) {
            Ok(mutex) => {
                if let Err(e) = mutex.into_inner().close().await {
                    warn!(error = %e, "SQL Server close reported an error");
                }
            }
            // An in-flight operation still holds the client; it closes on drop
            Err(_) => debug!("SQL Server client still shared at disconnect"),
        }
        info!("SQL Server connection closed");
        Ok(())
    }

    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let rows = self.fetch_rows(sql, params).await?;
        Ok(rows.into_iter().map(normalize_row).collect())
    }

    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let client = self.client.get().await?;
        let sql = placeholders::at_p_params(sql, params);
        debug!(sql = %sql, params = params.len(), "mssql execute");

        let mut query = Query::new(sql);
        for param in params {
            MssqlValueConverter::bind_value(&mut query, param);
        }

        let mut client = client.lock().await;
        let result = query
            .execute(&mut *client)
            .await
            .map_err(DataError::execute)?;

        Ok(result.total())
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
