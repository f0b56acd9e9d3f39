//! Table export.
//!
//! Runs `SELECT * FROM <table> [WHERE ...]`, restores the table's declared
//! column order, relabels headers with column comments and writes the rows
//! as CSV or XLSX.

use std::path::PathBuf;

use tracing::{info, warn};

use super::codec::{self, FileFormat, TabularData};
use super::schema_mapper::SchemaMapper;
use crate::error::Result;
use crate::services::database::normalize::normalize_text;
use crate::services::database::traits::{DialectDriver, Row};

/// What to export and where.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub table: String,
    /// Appended verbatim after `WHERE`
    pub where_clause: Option<String>,
    pub path: PathBuf,
    pub format: Option<FileFormat>,
}

impl ExportRequest {
    pub fn new(table: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            table: table.into(),
            where_clause: None,
            path: path.into(),
            format: None,
        }
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        self.where_clause = (!clause.trim().is_empty()).then_some(clause);
        self
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    fn sql(&self) -> String {
        match &self.where_clause {
            Some(clause) => format!("SELECT * FROM {} WHERE {}", self.table, clause.trim()),
            None => format!("SELECT * FROM {}", self.table),
        }
    }
}

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: usize,
    pub path: PathBuf,
    pub format: FileFormat,
    /// Column names in the order written
    pub columns: Vec<String>,
}

/// Export `request.table` to `request.path`.
pub async fn export_table(driver: &dyn DialectDriver, request: &ExportRequest) -> Result<ExportReport> {
    let mapper = SchemaMapper::load(driver, &request.table).await?;
    let rows = driver.query(&request.sql()).await?;

    let declared = match driver.get_table_columns(&request.table).await {
        Ok(columns) => Some(columns),
        Err(e) => {
            warn!(table = %request.table, error = %e, "column order unavailable; using result order");
            None
        }
    };
    let columns = order_columns(declared.as_deref(), rows.first());

    let headers = columns
        .iter()
        .map(|c| mapper.header_label(c).to_string())
        .collect();
    let body = rows.iter().map(|row| render_row(row, &columns)).collect();
    let data = TabularData::new(headers, body);

    let format = FileFormat::infer(&request.path, request.format);
    let path = request.path.clone();
    smol::unblock(move || codec::write_file(&path, format, &data)).await?;

    info!(
        table = %request.table,
        file = %request.path.display(),
        %format,
        rows = rows.len(),
        "export finished"
    );
    Ok(ExportReport {
        rows: rows.len(),
        path: request.path.clone(),
        format,
        columns,
    })
}

/// Declared columns present in the result first, then any extra result keys.
///
/// Without a declared list the result row's own order is kept. With no rows
/// the declared list is used as is, so an empty export still has a header.
pub(crate) fn order_columns(declared: Option<&[String]>, first: Option<&Row>) -> Vec<String> {
    match (declared, first) {
        (Some(declared), Some(row)) => {
            let mut ordered: Vec<String> = declared
                .iter()
                .filter_map(|d| row.columns().find(|c| c.eq_ignore_ascii_case(d)))
                .map(str::to_string)
                .collect();
            for column in row.columns() {
                if !ordered.iter().any(|o| o == column) {
                    ordered.push(column.to_string());
                }
            }
            ordered
        }
        (Some(declared), None) => declared.to_vec(),
        (None, Some(row)) => row.columns().map(str::to_string).collect(),
        (None, None) => Vec::new(),
    }
}

fn render_row(row: &Row, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| match row.get(c) {
            Some(value) if !value.is_null() => normalize_text(&value.to_cell_string()),
            _ => String::new(),
        })
        .collect()
}
