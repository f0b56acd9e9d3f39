//! Dialect tags and connection configuration.
//!
//! This module contains:
//! - `DatabaseType` - Enum of supported dialects
//! - `ConnectionConfig` - The `{type, host, port, user, password, dbname}` record

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Supported database dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Dameng,
    MySQL,
    PostgreSQL,
    #[serde(rename = "mssql")]
    SqlServer,
    Oracle,
    SQLite,
}

impl DatabaseType {
    /// Get the display name for this database type
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Dameng => "Dameng",
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::SqlServer => "SQL Server",
            Self::Oracle => "Oracle",
            Self::SQLite => "SQLite",
        }
    }

    /// Get the default port for server-based databases
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Dameng => Some(5236),
            Self::MySQL => Some(3306),
            Self::PostgreSQL => Some(5432),
            Self::SqlServer => Some(1433),
            Self::Oracle => Some(1521),
            Self::SQLite => None, // File-based
        }
    }

    /// Check if this database type is file-based (`dbname` names the file)
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::SQLite)
    }

    /// Get all dialect tags
    pub fn all() -> Vec<DatabaseType> {
        vec![
            Self::Dameng,
            Self::MySQL,
            Self::PostgreSQL,
            Self::SqlServer,
            Self::Oracle,
            Self::SQLite,
        ]
    }

    /// Convert to the tag used in the config file and on the command line
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::Dameng => "dameng",
            Self::MySQL => "mysql",
            Self::PostgreSQL => "postgresql",
            Self::SqlServer => "mssql",
            Self::Oracle => "oracle",
            Self::SQLite => "sqlite",
        }
    }
}

impl FromStr for DatabaseType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dameng" | "dm" => Ok(Self::Dameng),
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSQL),
            "mssql" | "sqlserver" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            "sqlite" | "sqlite3" => Ok(Self::SQLite),
            _ => Err(DataError::UnsupportedDialect(s.trim().to_string())),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Connection parameters for one database.
///
/// Serialized field names match the persisted config file
/// (`type`, `host`, `port`, `user`, `password`, `dbname`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// The dialect to connect with
    #[serde(rename = "type")]
    pub database_type: DatabaseType,
    /// Server hostname or IP address
    #[serde(default)]
    pub host: String,
    /// Server port
    #[serde(default)]
    pub port: u16,
    /// Username for authentication
    #[serde(default)]
    pub user: String,
    /// Password for authentication
    #[serde(default)]
    pub password: String,
    /// Database (SQL Server catalog, Oracle service name, SQLite file path)
    #[serde(default, rename = "dbname")]
    pub dbname: String,
}

impl ConnectionConfig {
    /// Create a new connection configuration
    pub fn new(
        database_type: DatabaseType,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            database_type,
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
        }
    }

    /// Configuration for a SQLite database file
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(DatabaseType::SQLite, "", 0, "", "", path)
    }

    /// Port to dial, falling back to the dialect default when unset
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            self.database_type.default_port().unwrap_or(0)
        } else {
            self.port
        }
    }

    /// Check that the fields the dialect needs are present
    pub fn validate(&self) -> Result<(), String> {
        if self.dbname.trim().is_empty() {
            return Err(format!(
                "{} requires a database name",
                self.database_type.display_name()
            ));
        }
        if !self.database_type.is_file_based()
            && (self.host.trim().is_empty() || self.user.trim().is_empty())
        {
            return Err(format!(
                "{} requires host and user",
                self.database_type.display_name()
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("database_type", &self.database_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"********")
            .field("dbname", &self.dbname)
            .finish()
    }
}
