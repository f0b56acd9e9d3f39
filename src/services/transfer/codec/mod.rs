//! Tabular file codecs.
//!
//! Both formats read into and write from [`TabularData`]: one header row
//! plus data rows of strings. Reading fails `FileNotFound` for a missing
//! path before the format is consulted.

mod delimited;
mod spreadsheet;

use std::path::Path;
use std::str::FromStr;

use crate::error::{DataError, Result};

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Csv,
    Xlsx,
}

/// Parses the `format` argument of `import`/`export`.
impl FromStr for FileFormat {
    type Err = DataError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Xlsx),
            _ => Err(DataError::InvalidInput(format!(
                "unsupported format {s:?} (expected csv or excel)"
            ))),
        }
    }
}

impl FileFormat {
    /// Pick the format for a path.
    ///
    /// A `.xlsx` or `.csv` extension wins over the explicit format; otherwise
    /// the explicit format is used, defaulting to CSV.
    pub fn infer(path: &Path, explicit: Option<FileFormat>) -> FileFormat {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") => FileFormat::Xlsx,
            Some("csv") => FileFormat::Csv,
            _ => explicit.unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Xlsx => "XLSX",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A header row and the data rows under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Split the first record off as the header row.
    fn from_records(mut records: Vec<Vec<String>>) -> Result<Self> {
        if records.is_empty() {
            return Err(DataError::format("file has no header row"));
        }
        let headers = records.remove(0);
        Ok(Self::new(headers, records))
    }
}

/// Read the whole file.
pub fn read_file(path: &Path, format: FileFormat) -> Result<TabularData> {
    if !path.is_file() {
        return Err(DataError::FileNotFound(path.display().to_string()));
    }

    let records = match format {
        FileFormat::Csv => delimited::read_records(path)?,
        FileFormat::Xlsx => spreadsheet::read_records(path)?,
    };
    TabularData::from_records(records)
}

/// Write the whole file, replacing any existing one.
pub fn write_file(path: &Path, format: FileFormat, data: &TabularData) -> Result<()> {
    match format {
        FileFormat::Csv => delimited::write_records(path, data),
        FileFormat::Xlsx => spreadsheet::write_records(path, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_inference() {
        let xlsx = Path::new("/tmp/report.XLSX");
        assert_eq!(FileFormat::infer(xlsx, Some(FileFormat::Csv)), FileFormat::Xlsx);

        let csv = Path::new("out.csv");
        assert_eq!(FileFormat::infer(csv, Some(FileFormat::Xlsx)), FileFormat::Csv);

        let bare = Path::new("dump.txt");
        assert_eq!(FileFormat::infer(bare, Some(FileFormat::Xlsx)), FileFormat::Xlsx);
        assert_eq!(FileFormat::infer(bare, None), FileFormat::Csv);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("excel".parse::<FileFormat>().ok(), Some(FileFormat::Xlsx));
        assert_eq!(" CSV ".parse::<FileFormat>().ok(), Some(FileFormat::Csv));
        assert!(matches!("json".parse::<FileFormat>(), Err(DataError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            read_file(&path, FileFormat::Csv),
            Err(DataError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_both_formats_carry_the_same_table() {
        let dir = tempfile::tempdir().unwrap();
        let data = TabularData::new(
            vec!["id".into(), "名称".into()],
            vec![vec!["1".into(), "a, \"quoted\"".into()], vec!["2".into(), "".into()]],
        );

        for (name, format) in [("t.csv", FileFormat::Csv), ("t.xlsx", FileFormat::Xlsx)] {
            let path = dir.path().join(name);
            write_file(&path, format, &data).unwrap();
            assert_eq!(read_file(&path, format).unwrap(), data, "{format}");
        }
    }
}
