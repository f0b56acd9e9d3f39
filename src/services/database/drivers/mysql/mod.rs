//! MySQL dialect driver implementation.
//!
//! This module provides a MySQL driver that implements the `DialectDriver`
//! trait using SQLx.
//!
//! # Example
//!
//! ```ignore
//! use datamgr_cli::services::database::drivers::mysql::MySqlDriver;
//! use datamgr_cli::services::database::traits::{ConnectionConfig, DatabaseType, DialectDriver};
//!
//! let config = ConnectionConfig::new(DatabaseType::MySQL, "localhost", 3306, "user", "password", "mydb");
//!
//! let mut driver = MySqlDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::MySqlDriver;
pub use types::MySqlValueConverter;
