//! Core dialect driver trait.
//!
//! This module defines the `DialectDriver` trait that every engine implements.
//! Statements use `?` as the positional placeholder; drivers whose wire
//! protocol wants another spelling rewrite it internally.

use async_trait::async_trait;

use super::row::{Row, Value};
use super::schema::ColumnDescriptor;
use super::types::{ConnectionConfig, DatabaseType};
use crate::error::Result;

/// Lifecycle of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unconnected,
    Connected,
    Closed,
}

/// The capability set shared by all dialects.
///
/// A driver starts `Unconnected`, becomes `Connected` after a successful
/// `connect` (which includes a round-trip ping), and is `Closed` for good
/// after `disconnect`. Every data operation outside `Connected` fails with
/// `DataError::NotConnected`.
///
/// Rows returned by `query`/`query_with_params` have already been through the
/// value normalizer; `describe_table` returns raw catalog values.
#[async_trait]
pub trait DialectDriver: Send + Sync {
    /// Get the dialect of this driver
    fn database_type(&self) -> DatabaseType;

    /// Get the connection configuration
    fn connection_config(&self) -> &ConnectionConfig;

    /// Current lifecycle state
    async fn state(&self) -> DriverState;

    /// Open the connection and validate it with a round trip.
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection and release its resources.
    async fn disconnect(&mut self) -> Result<()>;

    /// Run a statement that returns rows.
    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.query_with_params(sql, &[]).await
    }

    /// Run a statement with positional `?` parameters that returns rows.
    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement and return the affected row count.
    async fn execute(&self, sql: &str) -> Result<u64> {
        self.execute_with_params(sql, &[]).await
    }

    /// Run a statement with positional `?` parameters and return the affected row count.
    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Table names in deterministic order.
    async fn get_tables(&self) -> Result<Vec<String>>;

    /// Column descriptors in declared column order.
    ///
    /// An unknown table yields an empty list; callers decide whether that is
    /// an error.
    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Column names in declared column order.
    async fn get_table_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Placeholder for a value written into a column of `data_type`.
    ///
    /// Plain `?` unless the engine needs the parameter typed explicitly.
    fn value_placeholder(&self, _data_type: &str) -> String {
        "?".to_string()
    }

    /// Get a display name for the current connection.
    fn display_name(&self) -> String {
        let config = self.connection_config();
        if config.database_type.is_file_based() {
            config.dbname.clone()
        } else {
            format!(
                "{}@{}:{}/{}",
                config.user,
                config.host,
                config.effective_port(),
                config.dbname
            )
        }
    }
}

/// A boxed dialect driver trait object.
pub type BoxedDriver = Box<dyn DialectDriver>;
