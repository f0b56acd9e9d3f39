//! Dialect driver implementations.
//!
//! - **MySQL**, **PostgreSQL**, **SQLite**: SQLx pools
//! - **SQL Server**: Tiberius over a smol TCP stream
//! - **Dameng**, **Oracle**: ODBC via `odbc-api` (feature `odbc`)
//!
//! Each driver implements the `DialectDriver` trait. `ConnectionFactory`
//! picks the driver for a configuration.

mod factory;
pub(crate) mod placeholders;
pub(crate) mod slot;

pub mod mssql;
pub mod mysql;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod postgres;
pub mod sqlite;

pub use factory::ConnectionFactory;
