//! File import.
//!
//! Rows are read from a CSV or XLSX file, matched to table columns through
//! the [`SchemaMapper`], coerced by column type and written one statement per
//! row. Rows are independent: a failing row is recorded in the report and
//! the import carries on. Nothing is rolled back.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::codec::{self, FileFormat, TabularData};
use super::schema_mapper::{SchemaMapper, TypeClass};
use crate::error::{DataError, Result};
use crate::services::database::normalize::canonicalize_datetime;
use crate::services::database::traits::{DATE_FORMAT, DATETIME_FORMAT, DialectDriver, Value};

/// Whether rows without a matching key may only be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    #[default]
    Insert,
    /// Requires a primary key in the table and in the file headers
    Upsert,
}

impl FromStr for ImportMode {
    type Err = DataError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "upsert" => Ok(Self::Upsert),
            _ => Err(DataError::InvalidInput(format!(
                "unsupported mode {s:?} (expected insert or upsert)"
            ))),
        }
    }
}

/// What to import and how.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub table: String,
    pub path: PathBuf,
    /// Explicit format; the file extension takes precedence
    pub format: Option<FileFormat>,
    pub mode: ImportMode,
}

impl ImportRequest {
    pub fn new(table: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            table: table.into(),
            path: path.into(),
            format: None,
            mode: ImportMode::Insert,
        }
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A row that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based index among the data rows
    pub row: usize,
    pub message: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total_rows: usize,
    pub success: usize,
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
    /// Rows with nothing left to write after coercion
    pub skipped: usize,
    /// Headers that matched no column (or a column already matched)
    pub unmapped_headers: Vec<String>,
    pub failures: Vec<RowFailure>,
}

/// A prepared statement for one data row.
#[derive(Debug, Clone, PartialEq)]
enum RowStatement {
    Insert { sql: String, values: Vec<Value> },
    Update { sql: String, values: Vec<Value> },
}

/// Header index -> canonical column, plus whether it is the primary key.
#[derive(Debug, Clone)]
struct MappedHeader {
    index: usize,
    column: String,
    is_primary_key: bool,
}

/// Import a file into `request.table`.
///
/// Fails before touching any row when the file is missing, the table does
/// not exist, or an upsert lacks a primary key in the table or the headers.
pub async fn import_file(driver: &dyn DialectDriver, request: &ImportRequest) -> Result<ImportReport> {
    if !request.path.is_file() {
        return Err(DataError::FileNotFound(request.path.display().to_string()));
    }

    let mapper = SchemaMapper::load(driver, &request.table).await?;
    if request.mode == ImportMode::Upsert && mapper.primary_key().is_none() {
        return Err(DataError::UpsertNeedsPrimaryKey(request.table.clone()));
    }

    let format = FileFormat::infer(&request.path, request.format);
    let path = request.path.clone();
    let data: TabularData = smol::unblock(move || codec::read_file(&path, format)).await?;

    let (mapped, unmapped_headers) = map_headers(&mapper, &data.headers);
    if request.mode == ImportMode::Upsert && !mapped.iter().any(|h| h.is_primary_key) {
        let key = mapper.primary_key().unwrap_or_default().to_string();
        return Err(DataError::PrimaryKeyColumnMissingInFile(key));
    }
    for header in &unmapped_headers {
        warn!(table = %request.table, header = %header, "file header matches no column");
    }

    let mut report = ImportReport {
        total_rows: data.rows.len(),
        unmapped_headers,
        ..Default::default()
    };

    for (idx, record) in data.rows.iter().enumerate() {
        let row_number = idx + 1;
        let outcome = match prepare_row(driver, &mapper, &mapped, record, row_number).await {
            Ok(Some(statement)) => run_statement(driver, statement).await,
            Ok(None) => {
                report.skipped += 1;
                continue;
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(RowKind::Inserted) => {
                report.inserted += 1;
                report.success += 1;
            }
            Ok(RowKind::Updated) => {
                report.updated += 1;
                report.success += 1;
            }
            Err(e) => {
                warn!(table = %request.table, row = row_number, error = %e, "row import failed");
                report.errors += 1;
                report.failures.push(RowFailure {
                    row: row_number,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        table = %request.table,
        file = %request.path.display(),
        %format,
        success = report.success,
        inserted = report.inserted,
        updated = report.updated,
        errors = report.errors,
        skipped = report.skipped,
        "import finished"
    );
    Ok(report)
}

fn map_headers(mapper: &SchemaMapper, headers: &[String]) -> (Vec<MappedHeader>, Vec<String>) {
    let mut mapped: Vec<MappedHeader> = Vec::new();
    let mut unmapped = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        match mapper.resolve(header) {
            Some(column) if !mapped.iter().any(|m| m.column == column) => {
                mapped.push(MappedHeader {
                    index,
                    column: column.to_string(),
                    is_primary_key: mapper.primary_key() == Some(column),
                });
            }
            _ => unmapped.push(header.clone()),
        }
    }

    (mapped, unmapped)
}

enum RowKind {
    Inserted,
    Updated,
}

async fn run_statement(driver: &dyn DialectDriver, statement: RowStatement) -> Result<RowKind> {
    match statement {
        RowStatement::Insert { sql, values } => {
            driver.execute_with_params(&sql, &values).await?;
            Ok(RowKind::Inserted)
        }
        RowStatement::Update { sql, values } => {
            driver.execute_with_params(&sql, &values).await?;
            Ok(RowKind::Updated)
        }
    }
}

/// Build the statement for one record, or `None` when nothing is left to write.
///
/// A numeric primary-key cell makes the row an UPDATE when the key already
/// exists in the table. Otherwise the row is inserted, carrying the key only
/// when the engine does not generate it.
async fn prepare_row(
    driver: &dyn DialectDriver,
    mapper: &SchemaMapper,
    mapped: &[MappedHeader],
    record: &[String],
    row_number: usize,
) -> Result<Option<RowStatement>> {
    let cell = |h: &MappedHeader| record.get(h.index).map(|s| s.trim()).unwrap_or_default();

    let key = mapped
        .iter()
        .find(|h| h.is_primary_key)
        .and_then(|h| parse_number(cell(h)).map(|value| (h.column.as_str(), value)));

    let is_update = match &key {
        Some((column, value)) => row_exists(driver, mapper.table(), column, value).await?,
        None => false,
    };

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for header in mapped {
        let generated = mapper.is_identity(&header.column);
        if header.is_primary_key && (is_update || generated) {
            continue;
        }
        let text = cell(header);
        if text.is_empty() {
            if generated {
                debug!(row = row_number, column = %header.column, "identity left to the engine");
            }
            continue;
        }
        match coerce(mapper.type_class(&header.column), text) {
            Some(value) => {
                let mark = driver.value_placeholder(mapper.data_type(&header.column));
                columns.push((header.column.as_str(), mark));
                values.push(value);
            }
            None => warn!(
                table = mapper.table(),
                row = row_number,
                column = %header.column,
                value = text,
                "value does not fit the column type; column dropped"
            ),
        }
    }

    if columns.is_empty() {
        warn!(table = mapper.table(), row = row_number, "no columns left to write; row skipped");
        return Ok(None);
    }

    let statement = match key {
        Some((key_column, key_value)) if is_update => {
            values.push(key_value);
            RowStatement::Update {
                sql: update_sql(mapper.table(), &columns, key_column),
                values,
            }
        }
        _ => RowStatement::Insert {
            sql: insert_sql(mapper.table(), &columns),
            values,
        },
    };
    debug!(row = row_number, ?statement, "prepared row");
    Ok(Some(statement))
}

async fn row_exists(driver: &dyn DialectDriver, table: &str, key: &str, value: &Value) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) AS CNT FROM {table} WHERE {key} = ?");
    let rows = driver.query_with_params(&sql, std::slice::from_ref(value)).await?;
    let count = rows
        .first()
        .and_then(|row| row.values().next().cloned())
        .map(|v| match v {
            Value::Int64(n) => n,
            Value::Decimal(d) => d.trunc().to_string().parse().unwrap_or(0),
            other => other.to_cell_string().trim().parse().unwrap_or(0),
        })
        .unwrap_or(0);
    Ok(count > 0)
}

/// A target column and the placeholder its value binds to.
type Target<'a> = (&'a str, String);

fn insert_sql(table: &str, columns: &[Target<'_>]) -> String {
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let marks: Vec<&str> = columns.iter().map(|(_, mark)| mark.as_str()).collect();
    format!("INSERT INTO {table} ({}) VALUES ({})", names.join(","), marks.join(","))
}

fn update_sql(table: &str, columns: &[Target<'_>], key: &str) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .map(|(name, mark)| format!("{name}={mark}"))
        .collect();
    format!("UPDATE {table} SET {} WHERE {key}=?", assignments.join(","))
}

fn parse_number(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    text.parse::<i64>()
        .map(Value::Int64)
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float64))
}

/// Coerce a trimmed, non-empty cell for a column of the given class.
fn coerce(class: TypeClass, text: &str) -> Option<Value> {
    match class {
        TypeClass::Integer => parse_number(text),
        TypeClass::Numeric => Decimal::from_str(text)
            .map(Value::Decimal)
            .ok()
            .or_else(|| parse_number(text)),
        TypeClass::DateTime => parse_datetime(text),
        TypeClass::Text => Some(Value::Text(text.to_string())),
    }
}

/// Accept the canonical forms plus RFC 3339, RFC 2822 and Go-style
/// `2006-01-02 15:04:05.999999999 -0700 MST` renderings.
fn parse_datetime(text: &str) -> Option<Value> {
    if let Some(canonical) = canonicalize_datetime(text) {
        return NaiveDateTime::parse_from_str(&canonical, DATETIME_FORMAT)
            .ok()
            .map(Value::DateTime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Some(Value::Date(date));
    }
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|dt| Value::DateTime(truncate(dt.naive_local())))
        .ok()
}

fn truncate(dt: NaiveDateTime) -> NaiveDateTime {
    use chrono::Timelike;
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::drivers::sqlite::SqliteDriver;
    use crate::services::database::testing::FakeDriver;
    use crate::services::database::traits::{
        ColumnDescriptor, ConnectionConfig, DatabaseType, DriverState, PRIMARY_KEY, Row,
    };
    use async_trait::async_trait;
    use std::path::Path;

    /// SQLite with column comments layered over its describe output.
    struct Commented {
        inner: SqliteDriver,
        comments: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl DialectDriver for Commented {
        fn database_type(&self) -> DatabaseType {
            self.inner.database_type()
        }

        fn connection_config(&self) -> &ConnectionConfig {
            self.inner.connection_config()
        }

        async fn state(&self) -> DriverState {
            self.inner.state().await
        }

        async fn connect(&mut self) -> Result<()> {
            self.inner.connect().await
        }

        async fn disconnect(&mut self) -> Result<()> {
            self.inner.disconnect().await
        }

        async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
            self.inner.query_with_params(sql, params).await
        }

        async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
            self.inner.execute_with_params(sql, params).await
        }

        async fn get_tables(&self) -> Result<Vec<String>> {
            self.inner.get_tables().await
        }

        async fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
            let mut columns = self.inner.describe_table(table).await?;
            for col in &mut columns {
                if let Some((_, comment)) = self.comments.iter().find(|(c, _)| *c == col.column_name) {
                    col.description = comment.to_string();
                }
            }
            Ok(columns)
        }

        async fn get_table_columns(&self, table: &str) -> Result<Vec<String>> {
            self.inner.get_table_columns(table).await
        }
    }

    async fn open_sqlite(dir: &Path) -> SqliteDriver {
        let path = dir.join("import.db");
        let mut driver = SqliteDriver::new(ConnectionConfig::sqlite(path.to_string_lossy()));
        driver.connect().await.unwrap();
        driver
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_coerce_by_type_class() {
        assert_eq!(coerce(TypeClass::Integer, "42"), Some(Value::Int64(42)));
        assert_eq!(coerce(TypeClass::Integer, "4.5"), Some(Value::Float64(4.5)));
        assert_eq!(coerce(TypeClass::Integer, "four"), None);
        assert_eq!(
            coerce(TypeClass::Numeric, "10.25"),
            Some(Value::Decimal(Decimal::new(1025, 2)))
        );
        assert_eq!(coerce(TypeClass::Text, "x y"), Some(Value::Text("x y".into())));
    }

    #[test]
    fn test_datetime_inputs() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        for input in [
            "2024-01-02 03:04:05",
            "2024-01-02T03:04:05Z",
            "2024-01-02 03:04:05.678 +0800 CST",
            "2024-01-02T03:04:05.5+08:00",
            "Tue, 02 Jan 2024 03:04:05 +0000",
        ] {
            assert_eq!(parse_datetime(input), Some(Value::DateTime(expected)), "{input}");
        }
        assert_eq!(
            parse_datetime("2024-01-02"),
            Some(Value::Date(expected.date()))
        );
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(parse_datetime("03:04:05"), None);
    }

    #[test]
    fn test_statement_shapes() {
        let plain = [("a", "?".to_string()), ("b", "?".to_string())];
        assert_eq!(insert_sql("t", &plain), "INSERT INTO t (a,b) VALUES (?,?)");
        assert_eq!(update_sql("t", &plain, "id"), "UPDATE t SET a=?,b=? WHERE id=?");

        let typed = [("flag", "?::boolean".to_string()), ("b", "?".to_string())];
        assert_eq!(insert_sql("t", &typed), "INSERT INTO t (flag,b) VALUES (?::boolean,?)");
        assert_eq!(update_sql("t", &typed, "id"), "UPDATE t SET flag=?::boolean,b=? WHERE id=?");
    }

    #[test]
    fn test_upsert_pivot() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;
            driver
                .execute("CREATE TABLE k (a INTEGER PRIMARY KEY, b TEXT)")
                .await
                .unwrap();
            driver.execute("INSERT INTO k (a, b) VALUES (1, 'old')").await.unwrap();

            let file = write(dir.path(), "k.csv", "a,b\n1,new\n2,fresh\n");
            let request = ImportRequest::new("k", &file).with_mode(ImportMode::Upsert);
            let report = import_file(&driver, &request).await.unwrap();

            assert_eq!(report.updated, 1);
            assert_eq!(report.inserted, 1);
            assert_eq!(report.errors, 0);

            let rows = driver.query("SELECT a, b FROM k ORDER BY a").await.unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].get_string("b"), "new");
            assert_eq!(rows[1].get_string("b"), "fresh");
        });
    }

    #[test]
    fn test_upsert_requires_key_header() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;
            driver
                .execute("CREATE TABLE k (a INTEGER PRIMARY KEY, b INTEGER)")
                .await
                .unwrap();

            let file = write(dir.path(), "f.csv", "b\n5\n");
            let request = ImportRequest::new("k", &file).with_mode(ImportMode::Upsert);
            let err = import_file(&driver, &request).await.unwrap_err();
            assert!(matches!(err, DataError::PrimaryKeyColumnMissingInFile(ref c) if c == "a"));

            let rows = driver.query("SELECT COUNT(*) AS n FROM k").await.unwrap();
            assert_eq!(rows[0].get_string("n"), "0");
        });
    }

    #[test]
    fn test_upsert_requires_table_key() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;
            driver.execute("CREATE TABLE nokey (b INTEGER)").await.unwrap();

            let file = write(dir.path(), "f.csv", "b\n5\n");
            let request = ImportRequest::new("nokey", &file).with_mode(ImportMode::Upsert);
            assert!(matches!(
                import_file(&driver, &request).await,
                Err(DataError::UpsertNeedsPrimaryKey(_))
            ));
        });
    }

    #[test]
    fn test_identity_column_left_to_engine() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;
            driver
                .execute("CREATE TABLE a (id INTEGER PRIMARY KEY, v TEXT)")
                .await
                .unwrap();

            let file = write(dir.path(), "a.csv", "id,v\n,hello\n");
            let report = import_file(&driver, &ImportRequest::new("a", &file)).await.unwrap();
            assert_eq!(report.inserted, 1);

            let rows = driver.query("SELECT id, v FROM a").await.unwrap();
            assert_eq!(rows.len(), 1);
            assert!(!rows[0].get("id").unwrap().is_null());
            assert_eq!(rows[0].get_string("v"), "hello");
        });
    }

    #[test]
    fn test_row_errors_are_counted_and_skipped_rows_reported() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;
            driver
                .execute("CREATE TABLE n (id INTEGER PRIMARY KEY, v TEXT NOT NULL UNIQUE, note TEXT)")
                .await
                .unwrap();

            let file = write(dir.path(), "n.csv", "V,Note,extra\nx,1,?\nx,2,?\n,,\n");
            let report = import_file(&driver, &ImportRequest::new("n", &file)).await.unwrap();

            assert_eq!(report.total_rows, 3);
            assert_eq!(report.success, 1);
            assert_eq!(report.errors, 1);
            assert_eq!(report.skipped, 1);
            assert_eq!(report.failures[0].row, 2);
            assert_eq!(report.unmapped_headers, vec!["extra".to_string()]);
        });
    }

    #[test]
    fn test_missing_file_and_table() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;

            let absent = ImportRequest::new("t", dir.path().join("absent.csv"));
            assert!(matches!(
                import_file(&driver, &absent).await,
                Err(DataError::FileNotFound(_))
            ));

            let file = write(dir.path(), "t.csv", "a\n1\n");
            assert!(matches!(
                import_file(&driver, &ImportRequest::new("ghost", &file)).await,
                Err(DataError::TableNotFound(_))
            ));
        });
    }

    #[test]
    fn test_unparseable_decimal_is_dropped_and_row_kept() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let driver = open_sqlite(dir.path()).await;
            driver
                .execute("CREATE TABLE m (id INTEGER PRIMARY KEY, price DECIMAL(10,2), label TEXT)")
                .await
                .unwrap();

            let file = write(dir.path(), "m.csv", "price,label\nabc,x\n12.50,y\n");
            let report = import_file(&driver, &ImportRequest::new("m", &file)).await.unwrap();
            assert_eq!(report.inserted, 2);
            assert_eq!(report.errors, 0);
            assert_eq!(report.skipped, 0);

            let rows = driver.query("SELECT price, label FROM m ORDER BY label").await.unwrap();
            assert_eq!(rows.len(), 2);
            assert!(rows[0].get("price").unwrap().is_null());
            assert_eq!(rows[0].get_string("label"), "x");
            assert_eq!(rows[1].get_string("price"), "12.5");
        });
    }

    #[test]
    fn test_comment_header_xlsx_into_sqlite() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let inner = open_sqlite(dir.path()).await;
            inner
                .execute("CREATE TABLE u (user_id BIGINT PRIMARY KEY, nick TEXT, joined DATE)")
                .await
                .unwrap();
            let driver = Commented {
                inner,
                comments: vec![("user_id", "用户ID"), ("nick", "昵称"), ("joined", "注册日期")],
            };

            let file = dir.path().join("u.xlsx");
            let data = TabularData::new(
                vec!["用户ID".into(), " 昵称 ".into(), "注册日期".into(), "备注".into()],
                vec![
                    vec!["7".into(), "alice".into(), "2024-01-02".into(), "x".into()],
                    vec!["8".into(), "bob".into(), "".into(), "y".into()],
                ],
            );
            codec::write_file(&file, FileFormat::Xlsx, &data).unwrap();

            let report = import_file(&driver, &ImportRequest::new("u", &file)).await.unwrap();
            assert_eq!(report.inserted, 2);
            assert_eq!(report.errors, 0);
            assert_eq!(report.unmapped_headers, vec!["备注".to_string()]);

            let rows = driver
                .query("SELECT user_id, nick, joined FROM u ORDER BY user_id")
                .await
                .unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].get_string("user_id"), "7");
            assert_eq!(rows[0].get_string("nick"), "alice");
            assert_eq!(rows[0].get_string("joined"), "2024-01-02");
            assert_eq!(rows[1].get_string("user_id"), "8");
            assert!(rows[1].get("joined").unwrap().is_null());
        });
    }

    #[test]
    fn test_absent_identity_key_is_not_inserted() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut driver = FakeDriver::connected();
            driver.descriptors = vec![
                ColumnDescriptor::new("id", "int")
                    .with_constraint(PRIMARY_KEY)
                    .with_identity(true),
                ColumnDescriptor::new("name", "varchar"),
            ];
            let executed = driver.executed.clone();

            let file = write(dir.path(), "t.csv", "id,name\n99,x\n");
            let request = ImportRequest::new("t", &file).with_mode(ImportMode::Upsert);
            let report = import_file(&driver, &request).await.unwrap();
            assert_eq!(report.inserted, 1);

            let log = executed.lock().unwrap();
            assert_eq!(log[0].0, "SELECT COUNT(*) AS CNT FROM t WHERE id = ?");
            let (sql, params) = log.last().unwrap();
            assert_eq!(sql, "INSERT INTO t (name) VALUES (?)");
            assert_eq!(params, &vec![Value::Text("x".into())]);
        });
    }

    #[test]
    fn test_absent_plain_key_is_inserted() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut driver = FakeDriver::connected();
            driver.descriptors = vec![
                ColumnDescriptor::new("code", "int").with_constraint(PRIMARY_KEY),
                ColumnDescriptor::new("name", "varchar"),
            ];
            let executed = driver.executed.clone();

            let file = write(dir.path(), "t.csv", "code,name\n99,x\n");
            let request = ImportRequest::new("t", &file).with_mode(ImportMode::Upsert);
            import_file(&driver, &request).await.unwrap();

            let log = executed.lock().unwrap();
            let (sql, params) = log.last().unwrap();
            assert_eq!(sql, "INSERT INTO t (code,name) VALUES (?,?)");
            assert_eq!(params, &vec![Value::Int64(99), Value::Text("x".into())]);
        });
    }

    #[test]
    fn test_update_never_writes_the_key() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut driver = FakeDriver::connected();
            driver.descriptors = vec![
                ColumnDescriptor::new("ID", "NUMBER").with_constraint(PRIMARY_KEY),
                ColumnDescriptor::new("NAME", "VARCHAR2").with_description("姓名"),
            ];
            // The existence probe sees one matching row
            driver.rows = vec![Row::from_pairs(vec![(
                "CNT",
                Value::Int64(1),
            )])];
            let executed = driver.executed.clone();

            let file = write(dir.path(), "p.csv", "id,姓名\n7,alice\n");
            let report = import_file(&driver, &ImportRequest::new("P", &file)).await.unwrap();
            assert_eq!(report.updated, 1);

            let log = executed.lock().unwrap();
            let (sql, params) = log.last().unwrap();
            assert_eq!(sql, "UPDATE P SET NAME=? WHERE ID=?");
            assert_eq!(params, &vec![Value::Text("alice".into()), Value::Int64(7)]);
        });
    }
}
