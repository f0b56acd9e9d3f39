//! SQL Server dialect driver implementation.
//!
//! This module provides a SQL Server driver that implements the
//! `DialectDriver` trait using Tiberius (TDS 7.3+).
//!
//! # Example
//!
//! ```ignore
//! use datamgr_cli::services::database::drivers::mssql::MssqlDriver;
//! use datamgr_cli::services::database::traits::{ConnectionConfig, DatabaseType, DialectDriver};
//!
//! let config = ConnectionConfig::new(DatabaseType::SqlServer, "localhost", 1433, "sa", "password", "master");
//!
//! let mut driver = MssqlDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::MssqlDriver;
pub use types::MssqlValueConverter;
