//! PostgreSQL dialect driver implementation.
//!
//! This module provides a PostgreSQL driver that implements the
//! `DialectDriver` trait using SQLx.
//!
//! # Example
//!
//! ```ignore
//! use datamgr_cli::services::database::drivers::postgres::PostgresDriver;
//! use datamgr_cli::services::database::traits::{ConnectionConfig, DatabaseType, DialectDriver};
//!
//! let config = ConnectionConfig::new(DatabaseType::PostgreSQL, "localhost", 5432, "user", "password", "mydb");
//!
//! let mut driver = PostgresDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::PostgresDriver;
pub use types::PgValueConverter;
