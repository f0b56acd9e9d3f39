//! Dialect abstraction traits and types.
//!
//! This module provides a unified interface over the supported engines.
//! It defines:
//!
//! - **Types** (`types`): Dialect enum and connection configuration
//! - **Row/Value** (`row`): Dialect-agnostic value representation
//! - **Schema** (`schema`): Normalized `DescribeTable` output
//! - **Connection** (`connection`): The `DialectDriver` capability set
//!
//! # Example
//!
//! ```ignore
//! use datamgr_cli::services::database::traits::{ConnectionConfig, DatabaseType};
//!
//! let config = ConnectionConfig::new(
//!     DatabaseType::PostgreSQL,
//!     "localhost",
//!     5432,
//!     "user",
//!     "password",
//!     "mydb",
//! );
//! ```

pub mod connection;
pub mod row;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use connection::{BoxedDriver, DialectDriver, DriverState};

pub use row::{Cell, DATE_FORMAT, DATETIME_FORMAT, Row, Value};

pub use schema::{ColumnDescriptor, FOREIGN_KEY, IDENTITY, PRIMARY_KEY, UNIQUE};

pub use types::{ConnectionConfig, DatabaseType};
