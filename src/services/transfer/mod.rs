//! Bulk movement of rows between tables and files.
//!
//! - `codec`: CSV and XLSX reading/writing
//! - `schema_mapper`: header-to-column resolution and type classes
//! - `import`: file to table
//! - `export`: table to file

pub mod codec;
pub mod export;
pub mod import;
pub mod schema_mapper;

pub use codec::{FileFormat, TabularData};
pub use export::{ExportReport, ExportRequest, export_table};
pub use import::{ImportMode, ImportReport, ImportRequest, RowFailure, import_file};
pub use schema_mapper::{SchemaMapper, TypeClass};
