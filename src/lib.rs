//! Interactive data management across Dameng, MySQL, PostgreSQL, SQL Server,
//! Oracle and SQLite.
//!
//! - `services::database`: dialect drivers and the single-connection registry
//! - `services::transfer`: CSV/XLSX import and export
//! - `config`: the persisted default connection
//! - `shell`: the interactive command loop

pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod shell;

pub use error::{DataError, Result};
