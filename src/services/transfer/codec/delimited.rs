//! CSV reading and writing.
//!
//! Files are written with a UTF-8 byte order mark so spreadsheet tools pick
//! the right encoding; a leading BOM is skipped on read.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::TabularData;
use crate::error::{DataError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub(super) fn read_records(path: &Path) -> Result<Vec<Vec<String>>> {
    let bytes = std::fs::read(path)?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    let body = std::str::from_utf8(body)
        .map_err(|e| DataError::format(format!("CSV is not valid UTF-8: {e}")))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::format(e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

pub(super) fn write_records(path: &Path, data: &TabularData) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&data.headers)?;
    for row in &data.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
