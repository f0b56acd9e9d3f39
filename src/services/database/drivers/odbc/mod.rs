//! ODBC dialect drivers (Dameng and Oracle).
//!
//! Both engines are reached through the system ODBC driver manager with
//! `odbc-api`. The connection logic is shared; each dialect contributes its
//! connection string and catalog SQL.
//!
//! This module is only compiled with the `odbc` feature.
//!
//! # Example
//!
//! ```ignore
//! use datamgr_cli::services::database::drivers::odbc::OdbcDriver;
//! use datamgr_cli::services::database::traits::{ConnectionConfig, DatabaseType, DialectDriver};
//!
//! let config = ConnectionConfig::new(DatabaseType::Oracle, "localhost", 1521, "scott", "tiger", "ORCLPDB1");
//!
//! let mut driver = OdbcDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod dameng;
mod oracle;

pub use connection::OdbcDriver;

use crate::services::database::traits::{ConnectionConfig, DatabaseType};

/// Per-dialect pieces of an ODBC driver.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OdbcDialect {
    pub database_type: DatabaseType,
    /// Environment variable overriding the ODBC driver name
    pub driver_env: &'static str,
    pub default_driver: &'static str,
    pub tables_query: &'static str,
    /// Whether `tables_query` binds the login user
    pub tables_by_owner: bool,
    pub describe_query: &'static str,
    /// Number of times the upper-cased table name is bound in `describe_query`
    pub describe_binds: usize,
    pub columns_query: &'static str,
    pub ping_query: &'static str,
    pub connection_string: fn(&str, &ConnectionConfig) -> String,
}

impl OdbcDialect {
    pub fn for_type(database_type: DatabaseType) -> Option<Self> {
        match database_type {
            DatabaseType::Dameng => Some(dameng::DIALECT),
            DatabaseType::Oracle => Some(oracle::DIALECT),
            _ => None,
        }
    }

    /// ODBC driver name, honoring the environment override.
    pub fn driver_name(&self) -> String {
        std::env::var(self.driver_env)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.default_driver.to_string())
    }
}

/// Wrap a value for an ODBC connection string attribute.
///
/// Values containing `;` or braces must be braced, with `}` doubled.
fn attribute(value: &str) -> String {
    if value.contains([';', '{', '}']) || value.starts_with(' ') || value.ends_with(' ') {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}
