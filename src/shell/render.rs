//! Text rendering for shell output.

use std::fmt::Write as _;

use crate::services::database::traits::{ColumnDescriptor, ConnectionConfig, Row};
use crate::services::transfer::{ExportReport, ImportReport};

pub const OK: &str = "✓ ";
pub const FAIL: &str = "✗ ";

const CELL_WIDTH: usize = 20;

pub const HELP: &str = "\
System commands:
  help                                  show this help
  clear                                 clear the screen
  status                                show the current connection
  exit | quit                           disconnect and leave

Connection and config:
  connect [--type T] [-H host] [-P port] [-u user] [-p password] [-D dbname]
                                        connect (no flags starts the wizard)
  config                                show the saved default connection
  config save                           save the current connection as default
  config set <key> <value>              set type, host, port, user, password or dbname
  config clear                          delete the saved default connection

Tables:
  show tables                           list tables
  desc table <table>                    describe a table's columns

Data:
  select ... | insert ... | update ... | delete ...
  import <table> from <file> [format csv|excel] [mode insert|upsert]
  export <table> [where <condition>] <file> [format csv|excel]
";

/// Numbered table list.
pub fn tables(names: &[String]) -> String {
    if names.is_empty() {
        return "no tables found\n".to_string();
    }
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        let _ = writeln!(out, "{:3}) {}", i + 1, name);
    }
    out
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() || value == "<nil>" {
        "-"
    } else {
        value
    }
}

/// Column listing for `desc table`.
pub fn describe(table: &str, columns: &[ColumnDescriptor]) -> String {
    let mut out = format!("Table: {table}\n");
    let _ = writeln!(
        out,
        "{:<20} {:<15} {:<10} {:<10} {:<15} {:<30}",
        "Column", "Type", "Length", "Nullable", "Constraint", "Description"
    );
    let _ = writeln!(out, "{}", "-".repeat(105));
    for col in columns {
        let constraint = if col.is_identity() && !col.is_primary_key() {
            col.identity_info.as_str()
        } else {
            col.constraint_type.as_str()
        };
        let _ = writeln!(
            out,
            "{:<20} {:<15} {:<10} {:<10} {:<15} {:<30}",
            col.column_name,
            col.data_type,
            or_dash(&col.length),
            or_dash(&col.nullable),
            or_dash(constraint),
            col.label().unwrap_or("-"),
        );
    }
    out
}

/// Fixed-width result grid with a trailing row count.
pub fn rows(columns: &[String], rows: &[Row]) -> String {
    if rows.is_empty() {
        return "no rows returned\n".to_string();
    }

    let mut out = String::new();
    for column in columns {
        let _ = write!(out, "{:<width$} ", column, width = CELL_WIDTH);
    }
    out.push('\n');
    out.push_str(&"-".repeat(CELL_WIDTH * columns.len()));
    out.push('\n');

    for row in rows {
        for column in columns {
            let cell = row
                .get(column)
                .map(|v| v.to_display_string())
                .unwrap_or_else(|| "NULL".to_string());
            let _ = write!(out, "{:<width$} ", cell, width = CELL_WIDTH);
        }
        out.push('\n');
    }
    let _ = writeln!(out, "\n{} row(s) returned", rows.len());
    out
}

pub fn affected(count: u64) -> String {
    format!("{OK}{count} row(s) affected\n")
}

/// Summary of an import, followed by the first few row failures.
pub fn import_report(table: &str, report: &ImportReport) -> String {
    const SHOWN_FAILURES: usize = 10;

    let mut out = format!("{OK}import into {table} finished\n");
    let _ = writeln!(out, "  total rows: {}", report.total_rows);
    let _ = writeln!(
        out,
        "  succeeded:  {} (inserted {}, updated {})",
        report.success, report.inserted, report.updated
    );
    let _ = writeln!(out, "  failed:     {}", report.errors);
    let _ = writeln!(out, "  skipped:    {}", report.skipped);
    if !report.unmapped_headers.is_empty() {
        let _ = writeln!(out, "  unmapped headers: {}", report.unmapped_headers.join(", "));
    }
    for failure in report.failures.iter().take(SHOWN_FAILURES) {
        let _ = writeln!(out, "  {FAIL}row {}: {}", failure.row, failure.message);
    }
    if report.failures.len() > SHOWN_FAILURES {
        let _ = writeln!(out, "  ... {} more", report.failures.len() - SHOWN_FAILURES);
    }
    out
}

pub fn export_report(table: &str, report: &ExportReport) -> String {
    format!(
        "{OK}exported {} row(s) from {} to {} ({})\n",
        report.rows,
        table,
        report.path.display(),
        report.format
    )
}

/// Active connection summary, password masked.
pub fn status(display_name: &str, config: &ConnectionConfig) -> String {
    format!("{OK}connected to {display_name}\n{}\n", crate::config::render(config))
}
