//! ODBC connection implementation.
//!
//! ODBC calls block, so every operation runs on the smol blocking pool. The
//! live handle is the shared ODBC environment plus the connection string;
//! each operation opens its own connection, which keeps the handle cheap to
//! clone and avoids holding a non-`Send` connection across awaits.

use std::sync::Arc;

use async_trait::async_trait;
use odbc_api::parameter::VarCharBox;
use odbc_api::{
    ConnectionOptions, Cursor, Environment, IntoParameter, ResultSetMetadata,
    buffers::TextRowSet,
};
use tracing::{debug, info};

use super::OdbcDialect;
use crate::error::{DataError, Result};
use crate::services::database::drivers::slot::ConnectionSlot;
use crate::services::database::normalize::normalize_row;
use crate::services::database::traits::{
    BoxedDriver, Cell, ColumnDescriptor, ConnectionConfig, DATE_FORMAT, DATETIME_FORMAT,
    DatabaseType, DialectDriver, DriverState, Row, Value,
};

/// Rows fetched per round trip.
const BATCH_SIZE: usize = 1000;
/// Upper bound for a single text cell.
const MAX_TEXT_LEN: usize = 4096;

#[derive(Clone)]
struct OdbcHandle {
    env: Arc<Environment>,
    connection_string: Arc<str>,
}

impl OdbcHandle {
    fn connection(&self) -> std::result::Result<odbc_api::Connection<'_>, odbc_api::Error> {
        self.env
            .connect_with_connection_string(&self.connection_string, ConnectionOptions::default())
    }
}

/// Dameng or Oracle driver over ODBC.
pub struct OdbcDriver {
    config: ConnectionConfig,
    dialect: OdbcDialect,
    handle: ConnectionSlot<OdbcHandle>,
}

impl std::fmt::Debug for OdbcDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcDriver")
            .field("config", &self.config)
            .field("dialect", &self.dialect.database_type)
            .field("handle", &"<OdbcEnvironment>")
            .finish()
    }
}

impl OdbcDriver {
    /// Create a new ODBC driver from configuration.
    ///
    /// The dialect is taken from `config.database_type`; anything other than
    /// Dameng falls back to the Oracle catalog.
    pub fn new(config: ConnectionConfig) -> Self {
        let dialect = OdbcDialect::for_type(config.database_type)
            .unwrap_or(super::oracle::DIALECT);
        Self {
            config,
            dialect,
            handle: ConnectionSlot::new(),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    fn build_connection_string(&self) -> Result<String> {
        if self.config.host.trim().is_empty() {
            return Err(DataError::connect(self.dialect.database_type, "host is required"));
        }
        Ok((self.dialect.connection_string)(&self.dialect.driver_name(), &self.config))
    }

    /// Run a row-returning statement without normalizing the cells.
    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let handle = self.handle.get().await?;
        debug!(sql, params = params.len(), "odbc query");

        let sql = sql.to_string();
        let params = to_parameters(params);
        smol::unblock(move || -> Result<Vec<Row>> {
            let conn = handle.connection().map_err(DataError::query)?;
            fetch_text_rows(&conn, &sql, &params)
        })
        .await
    }

    /// Catalog lookups bind the upper-cased table name.
    fn table_params(table: &str, count: usize) -> Vec<Value> {
        vec![Value::Text(table.to_uppercase()); count]
    }
}

/// Read every row of a statement's first result set as text cells.
fn fetch_text_rows(
    conn: &odbc_api::Connection<'_>,
    sql: &str,
    params: &[VarCharBox],
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();

    let Some(mut cursor) = conn.execute(sql, params).map_err(DataError::query)? else {
        return Ok(rows);
    };

    let names = cursor
        .column_names()
        .map_err(DataError::query)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(DataError::query)?;

    let mut buffers = TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN))
        .map_err(DataError::query)?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers).map_err(DataError::query)?;

    while let Some(batch) = row_cursor.fetch().map_err(DataError::query)? {
        for row_idx in 0..batch.num_rows() {
            let cells = names
                .iter()
                .enumerate()
                .map(|(col_idx, name)| {
                    let value = batch
                        .at(col_idx, row_idx)
                        .map(|bytes| Value::Text(String::from_utf8_lossy(bytes).into_owned()))
                        .unwrap_or(Value::Null);
                    Cell::new(name.as_str(), value)
                })
                .collect();
            rows.push(Row::new(cells));
        }
    }

    Ok(rows)
}

/// Bind every value as character data; the server converts to the column type.
fn to_parameters(params: &[Value]) -> Vec<VarCharBox> {
    params
        .iter()
        .map(|value| {
            let text = match value {
                Value::Null => None,
                Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
                Value::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
                Value::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
                other => Some(other.to_cell_string()),
            };
            text.into_parameter()
        })
        .collect()
}

#[async_trait]
impl DialectDriver for OdbcDriver {
    fn database_type(&self) -> DatabaseType {
        self.dialect.database_type
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn state(&self) -> DriverState {
        self.handle.state().await
    }

    async fn connect(&mut self) -> Result<()> {
        if !self.handle.should_connect().await? {
            return Ok(());
        }

        let dialect = self.dialect;
        let fail = move |e: odbc_api::Error| DataError::connect(dialect.database_type, e);

        let connection_string = self.build_connection_string()?;
        let env = Environment::new().map_err(fail)?;
        let handle = OdbcHandle {
            env: Arc::new(env),
            connection_string: connection_string.into(),
        };

        let probe = handle.clone();
        smol::unblock(move || -> Result<()> {
            let conn = probe.connection().map_err(fail)?;
            conn.execute(dialect.ping_query, ()).map_err(fail)?;
            Ok(())
        })
        .await?;

        self.handle.install(handle).await?;
        info!(
            connection = %self.display_name(),
            dialect = %self.dialect.database_type,
            "connected over ODBC"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Connections are per operation; dropping the environment releases the rest
        drop(self.handle.take().await?);
        info!(dialect = %self.dialect.database_type, "ODBC connection closed");
        Ok(())
    }

    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let rows = self.fetch_rows(sql, params).await?;
        Ok(rows.into_iter().map(normalize_row).collect())
    }

    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let handle = self.handle.get().await?;
        debug!(sql, params = params.len(), "odbc execute");

        let sql = sql.to_string();
        let params = to_parameters(params);
        smol::unblock(move || -> Result<u64> {
            let conn = handle.connection().map_err(DataError::execute)?;
            let mut statement = conn.preallocate().map_err(DataError::execute)?;
            statement
                .execute(&sql, &params[..])
                .map_err(DataError::execute)?;
            let count = statement.row_count().map_err(DataError::execute)?;
            Ok(count.unwrap_or(0) as u64)
        })
        .await
    }

    async fn get_tables(&self) -> Result<Vec<String>> {
        let params = if self.dialect.tables_by_owner {
            vec![Value::Text(self.config.user.clone())]
        } else {
            Vec::new()
        };
        let rows = self.fetch_rows(self.dialect.tables_query, &params).await?;
        Ok(rows.iter().map(|row| row.get_string("TABLE_NAME")).collect())
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let params = Self::table_params(table, self.dialect.describe_binds);
        let rows = self.fetch_rows(self.dialect.describe_query, &params).await?;
        Ok(rows.iter().map(ColumnDescriptor::from_catalog_row).collect())
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<String>> {
        let params = Self::table_params(table, 1);
        let rows = self.fetch_rows(self.dialect.columns_query, &params).await?;
        Ok(rows.iter().map(|row| row.get_string("COLUMN_NAME")).collect())
    }
}
