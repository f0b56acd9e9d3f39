//! XLSX reading (calamine) and writing (rust_xlsxwriter).
//!
//! Only the first worksheet is read. Written workbooks have one sheet named
//! `Sheet1` with the header in row 1.

use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;

use super::TabularData;
use crate::error::{DataError, Result};
use crate::services::database::traits::DATETIME_FORMAT;

const SHEET_NAME: &str = "Sheet1";

fn xlsx_error(e: impl std::fmt::Display) -> DataError {
    DataError::Xlsx(e.to_string())
}

pub(super) fn read_records(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(xlsx_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::format("workbook has no worksheets"))?
        .map_err(xlsx_error)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a spreadsheet cell as the text an operator would type.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers come back as floats; keep `7` rather than `7.0`
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => naive.format(DATETIME_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

pub(super) fn write_records(path: &Path, data: &TabularData) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_error)?;

    for (col, header) in data.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header).map_err(xlsx_error)?;
    }

    for (row_idx, row) in data.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row_num, col as u16, value).map_err(xlsx_error)?;
            }
        }
    }

    workbook.save(path).map_err(xlsx_error)?;
    Ok(())
}
