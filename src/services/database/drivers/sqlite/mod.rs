//! SQLite dialect driver implementation.
//!
//! This module provides a SQLite driver that implements the `DialectDriver`
//! trait using SQLx. The connection's `dbname` is the database file path.
//!
//! # Example
//!
//! ```ignore
//! use datamgr_cli::services::database::drivers::sqlite::SqliteDriver;
//! use datamgr_cli::services::database::traits::{ConnectionConfig, DialectDriver};
//!
//! let mut driver = SqliteDriver::new(ConnectionConfig::sqlite("/path/to/database.db"));
//! driver.connect().await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::SqliteDriver;
pub use types::SqliteValueConverter;
