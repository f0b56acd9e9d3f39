//! Driver factory.
//!
//! The factory maps a connection configuration's dialect tag to the driver
//! that implements it. Dialects whose driver is not compiled into this build
//! resolve to `UnsupportedOnPlatform` without constructing anything.

use super::mssql::MssqlDriver;
use super::mysql::MySqlDriver;
#[cfg(feature = "odbc")]
use super::odbc::OdbcDriver;
use super::postgres::PostgresDriver;
use super::sqlite::SqliteDriver;
use crate::error::{DataError, Result};
use crate::services::database::traits::{BoxedDriver, ConnectionConfig, DatabaseType};

/// Factory for creating dialect drivers based on configuration.
///
/// # Example
///
/// ```ignore
/// use datamgr_cli::services::database::drivers::ConnectionFactory;
/// use datamgr_cli::services::database::traits::ConnectionConfig;
///
/// let driver = ConnectionFactory::create(ConnectionConfig::sqlite("/tmp/app.db"))?;
/// ```
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Create an unconnected driver for the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is missing fields the dialect needs
    /// - The dialect's driver is not available in this build
    pub fn create(config: ConnectionConfig) -> Result<BoxedDriver> {
        config.validate().map_err(DataError::InvalidInput)?;

        match config.database_type {
            DatabaseType::MySQL => Ok(MySqlDriver::boxed(config)),
            DatabaseType::PostgreSQL => Ok(PostgresDriver::boxed(config)),
            DatabaseType::SqlServer => Ok(MssqlDriver::boxed(config)),
            DatabaseType::SQLite => Ok(SqliteDriver::boxed(config)),
            DatabaseType::Dameng | DatabaseType::Oracle => Self::create_odbc(config),
        }
    }

    #[cfg(feature = "odbc")]
    fn create_odbc(config: ConnectionConfig) -> Result<BoxedDriver> {
        Ok(OdbcDriver::boxed(config))
    }

    #[cfg(not(feature = "odbc"))]
    fn create_odbc(config: ConnectionConfig) -> Result<BoxedDriver> {
        Err(DataError::UnsupportedOnPlatform(config.database_type))
    }

    /// Check if a dialect has a driver in this build.
    pub fn is_supported(db_type: DatabaseType) -> bool {
        match db_type {
            DatabaseType::Dameng | DatabaseType::Oracle => cfg!(feature = "odbc"),
            DatabaseType::MySQL
            | DatabaseType::PostgreSQL
            | DatabaseType::SqlServer
            | DatabaseType::SQLite => true,
        }
    }

    /// Get a list of all dialects with a driver in this build.
    pub fn supported_types() -> Vec<DatabaseType> {
        DatabaseType::all()
            .into_iter()
            .filter(|t| Self::is_supported(*t))
            .collect()
    }
}
