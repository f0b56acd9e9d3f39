//! Shell command parsing.
//!
//! A line is split on whitespace; the first word picks the command without
//! regard to case. SQL statements are passed on verbatim.

use super::wizard::ConnectArgs;
use crate::error::{DataError, Result};
use crate::services::database::traits::DatabaseType;
use crate::services::transfer::{ExportRequest, FileFormat, ImportMode, ImportRequest};

/// `config` subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    Show,
    Save,
    Set { key: String, value: String },
    Clear,
}

/// A parsed shell line.
#[derive(Debug, Clone)]
pub enum Command {
    Empty,
    Help,
    Clear,
    Status,
    Connect(ConnectArgs),
    ShowTables,
    Describe(String),
    /// A row-returning statement
    Query(String),
    /// A statement reporting an affected row count
    Execute(String),
    Import(ImportRequest),
    Export(ExportRequest),
    Config(ConfigCommand),
    Exit,
}

fn usage(text: &str) -> DataError {
    DataError::InvalidInput(format!("usage: {text}"))
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    let line = line.strip_suffix(';').unwrap_or(line).trim();
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = words.first() else {
        return Ok(Command::Empty);
    };

    match first.to_lowercase().as_str() {
        "help" => Ok(Command::Help),
        "clear" => Ok(Command::Clear),
        "status" => Ok(Command::Status),
        "exit" | "quit" => Ok(Command::Exit),
        "connect" => parse_connect(&words[1..]).map(Command::Connect),
        "show" => match words.get(1).map(|w| w.to_lowercase()) {
            Some(w) if w == "tables" => Ok(Command::ShowTables),
            _ => Err(usage("show tables")),
        },
        "desc" | "describe" => match words.as_slice() {
            [_, kw, table] if kw.eq_ignore_ascii_case("table") => {
                Ok(Command::Describe(table.to_string()))
            }
            [_, table] if !table.eq_ignore_ascii_case("table") => {
                Ok(Command::Describe(table.to_string()))
            }
            _ => Err(usage("desc table <table>")),
        },
        "select" => Ok(Command::Query(line.to_string())),
        "insert" | "update" | "delete" => Ok(Command::Execute(line.to_string())),
        "import" => parse_import(&words[1..]).map(Command::Import),
        "export" => parse_export(line, &words[1..]).map(Command::Export),
        "config" => parse_config(&words[1..]).map(Command::Config),
        other => Err(DataError::InvalidInput(format!(
            "unknown command: {other} (type help for a list)"
        ))),
    }
}

/// Parse `connect` flags: `--type`, `-H`, `-P`, `-u`, `-p`, `-D` and long forms.
pub fn parse_connect(args: &[&str]) -> Result<ConnectArgs> {
    let mut parsed = ConnectArgs::default();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| DataError::InvalidInput(format!("missing value for {flag}")))?;
        match *flag {
            "--type" | "-t" => {
                parsed.database_type = Some(value.parse::<DatabaseType>()?);
            }
            "-H" | "--host" => parsed.host = Some(value.to_string()),
            "-P" | "--port" => {
                parsed.port = Some(value.parse().map_err(|_| {
                    DataError::InvalidInput(format!("port must be a number, got {value:?}"))
                })?);
            }
            "-u" | "--user" => parsed.user = Some(value.to_string()),
            "-p" | "--password" => parsed.password = Some(value.to_string()),
            "-D" | "--dbname" => parsed.dbname = Some(value.to_string()),
            other => return Err(DataError::InvalidInput(format!("unknown connect flag: {other}"))),
        }
    }

    Ok(parsed)
}

fn parse_format(value: Option<&&str>) -> Result<FileFormat> {
    let value = value.ok_or_else(|| usage("format csv|excel"))?;
    value.parse()
}

/// `import <table> from <path> [format csv|excel] [mode insert|upsert]`
fn parse_import(args: &[&str]) -> Result<ImportRequest> {
    const USAGE: &str = "import <table> from <path> [format csv|excel] [mode insert|upsert]";
    let [table, from, path, rest @ ..] = args else {
        return Err(usage(USAGE));
    };
    if !from.eq_ignore_ascii_case("from") {
        return Err(usage(USAGE));
    }

    let mut request = ImportRequest::new(*table, *path);
    let mut iter = rest.iter();
    while let Some(word) = iter.next() {
        match word.to_lowercase().as_str() {
            "format" => request = request.with_format(parse_format(iter.next())?),
            "mode" => {
                let value = iter.next().ok_or_else(|| usage(USAGE))?;
                request = request.with_mode(value.parse::<ImportMode>()?);
            }
            _ => return Err(usage(USAGE)),
        }
    }
    Ok(request)
}

fn is_file_token(word: &str) -> bool {
    let lower = word.to_lowercase();
    lower.ends_with(".csv") || lower.ends_with(".xlsx")
}

/// `export <table> [where ...] <path> [format csv|excel]`
///
/// The where clause runs until `format` or a `.csv`/`.xlsx` token.
/// Byte offset of `word` within `line`; `word` is a slice of `line`.
fn offset_in(line: &str, word: &str) -> usize {
    word.as_ptr() as usize - line.as_ptr() as usize
}

/// `export <table> [where <condition>] <path> [format csv|excel]`
///
/// The condition is taken verbatim from `line`, so spacing inside quoted
/// literals survives.
fn parse_export(line: &str, args: &[&str]) -> Result<ExportRequest> {
    const USAGE: &str = "export <table> [where <condition>] <path> [format csv|excel]";
    let [table, rest @ ..] = args else {
        return Err(usage(USAGE));
    };

    let mut where_clause = String::new();
    let mut path: Option<&str> = None;
    let mut format = None;

    let mut i = 0;
    while i < rest.len() {
        let word = rest[i];
        if word.eq_ignore_ascii_case("where") {
            let start = i + 1;
            let mut end = start;
            while end < rest.len() && !rest[end].eq_ignore_ascii_case("format") && !is_file_token(rest[end]) {
                end += 1;
            }
            if end > start {
                let last = rest[end - 1];
                where_clause = line[offset_in(line, rest[start])..offset_in(line, last) + last.len()]
                    .to_string();
            }
            i = end;
        } else if word.eq_ignore_ascii_case("format") {
            format = Some(parse_format(rest.get(i + 1))?);
            i += 2;
        } else if path.is_none() {
            path = Some(word);
            i += 1;
        } else {
            return Err(usage(USAGE));
        }
    }

    let path = path.ok_or_else(|| usage(USAGE))?;
    let mut request = ExportRequest::new(*table, path).with_where(where_clause);
    if let Some(format) = format {
        request = request.with_format(format);
    }
    Ok(request)
}

fn parse_config(args: &[&str]) -> Result<ConfigCommand> {
    match args {
        [] => Ok(ConfigCommand::Show),
        [cmd] if cmd.eq_ignore_ascii_case("save") => Ok(ConfigCommand::Save),
        [cmd] if cmd.eq_ignore_ascii_case("clear") => Ok(ConfigCommand::Clear),
        [cmd, key, value @ ..] if cmd.eq_ignore_ascii_case("set") && !value.is_empty() => {
            Ok(ConfigCommand::Set {
                key: key.to_string(),
                value: value.join(" "),
            })
        }
        _ => Err(usage("config [save | set <key> <value> | clear]")),
    }
}
