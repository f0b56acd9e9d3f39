//! Line-editor helper: completion and password masking.

use std::borrow::Cow;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

const COMMANDS: &[&str] = &[
    "clear", "config", "connect", "delete", "desc", "exit", "export", "help", "import", "insert",
    "quit", "select", "show", "status", "update",
];

const KEYWORDS: &[&str] = &[
    "and", "by", "clear", "excel", "csv", "format", "from", "insert", "into", "limit", "mode",
    "or", "order", "save", "set", "table", "tables", "upsert", "values", "where",
];

/// Completes commands, keywords and cached table names.
#[derive(Default)]
pub struct ShellHelper {
    tables: Vec<String>,
    /// While set, typed characters are echoed as `*`
    masking: bool,
}

impl ShellHelper {
    pub fn set_tables(&mut self, tables: Vec<String>) {
        self.tables = tables;
    }

    pub fn set_masking(&mut self, masking: bool) {
        self.masking = masking;
    }

    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        if self.masking {
            return (pos, Vec::new());
        }

        let before = &line[..pos];
        let start = before
            .rfind(|c: char| c.is_whitespace() || c == ',' || c == '(')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = before[start..].to_lowercase();
        let head = before[..start].to_lowercase();
        let previous = head.split_whitespace().last().unwrap_or("");

        let pool: Vec<&str> = if head.trim().is_empty() {
            COMMANDS.to_vec()
        } else if matches!(previous, "table" | "from" | "into" | "update" | "import" | "export")
            || head.trim() == "desc"
        {
            self.tables.iter().map(String::as_str).collect()
        } else {
            KEYWORDS.to_vec()
        };

        let mut pairs: Vec<Pair> = pool
            .into_iter()
            .filter(|c| c.to_lowercase().starts_with(&word))
            .map(|c| Pair {
                display: c.to_string(),
                replacement: c.to_string(),
            })
            .collect();
        pairs.sort_by(|a, b| a.display.cmp(&b.display));
        pairs.dedup_by(|a, b| a.display == b.display);
        (start, pairs)
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masking {
            Cow::Owned("*".repeat(line.chars().count()))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        self.masking
    }
}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
