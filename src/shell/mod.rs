//! Interactive shell.
//!
//! `Session` owns the command semantics and writes to any `io::Write`, so it
//! can be driven without a terminal. `Shell` wraps it in a rustyline loop.

mod helper;
pub mod parser;
pub mod render;
pub mod wizard;

use std::io::{self, Write};

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, EditMode, Editor};
use tracing::{debug, info, warn};

use crate::config::{self, ConfigStore};
use crate::error::{DataError, Result};
use crate::services::database::traits::{ConnectionConfig, Row};
use crate::services::database::ConnectionRegistry;
use crate::services::transfer::{self, export};

use helper::ShellHelper;
use parser::{Command, ConfigCommand};
use render::{FAIL, OK};
pub use wizard::{ConnectArgs, Prompter};

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Command state shared by the interactive loop and tests.
pub struct Session {
    registry: ConnectionRegistry,
    store: ConfigStore,
    /// Table names for completion
    tables: Vec<String>,
}

impl Session {
    pub fn new(registry: ConnectionRegistry, store: ConfigStore) -> Self {
        Self {
            registry,
            store,
            tables: Vec::new(),
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Prompt text for the current connection state.
    pub async fn prompt(&self) -> String {
        match self.registry.current_config().await {
            Some(config) => format!("db[{}]> ", config.dbname),
            None => "db> ".to_string(),
        }
    }

    /// Run one parsed command.
    pub async fn dispatch(
        &mut self,
        command: Command,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> Result<Flow> {
        match command {
            Command::Empty => {}
            Command::Help => write!(out, "{}", render::HELP)?,
            Command::Clear => {
                write!(out, "\x1b[2J\x1b[H")?;
                out.flush()?;
            }
            Command::Status => {
                let active = self.registry.current().await?;
                let name = active.driver().await.display_name();
                write!(out, "{}", render::status(&name, &active.config))?;
            }
            Command::Connect(args) => self.connect(args, prompter, out).await?,
            Command::ShowTables => {
                let active = self.registry.current().await?;
                let tables = active.driver().await.get_tables().await?;
                write!(out, "{}", render::tables(&tables))?;
                self.tables = tables;
            }
            Command::Describe(table) => {
                let active = self.registry.current().await?;
                let columns = active.driver().await.describe_table(&table).await?;
                if columns.is_empty() {
                    return Err(DataError::TableNotFound(table));
                }
                write!(out, "{}", render::describe(&table, &columns))?;
            }
            Command::Query(sql) => self.select(&sql, out).await?,
            Command::Execute(sql) => {
                let active = self.registry.current().await?;
                let count = active.driver().await.execute(&sql).await?;
                write!(out, "{}", render::affected(count))?;
            }
            Command::Import(request) => {
                let active = self.registry.current().await?;
                let driver = active.driver().await;
                let report = transfer::import_file(&**driver, &request).await?;
                write!(out, "{}", render::import_report(&request.table, &report))?;
            }
            Command::Export(request) => {
                let active = self.registry.current().await?;
                let driver = active.driver().await;
                let report = transfer::export_table(&**driver, &request).await?;
                write!(out, "{}", render::export_report(&request.table, &report))?;
            }
            Command::Config(command) => self.config(command, out).await?,
            Command::Exit => {
                self.registry.shutdown().await;
                writeln!(out, "bye")?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Connect from flags, falling back to the wizard when they are incomplete.
    ///
    /// An existing connection is closed first.
    pub async fn connect(
        &mut self,
        args: ConnectArgs,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> Result<()> {
        let saved = match self.store.load() {
            Ok(config) => Some(config),
            Err(DataError::NoDefaultConfig) => None,
            Err(e) => {
                warn!(error = %e, "ignoring saved config");
                None
            }
        };

        let config = if args.is_empty() {
            wizard::run(prompter, saved.as_ref(), &config::default_config())?
        } else {
            let merged = args.merge(saved.as_ref().unwrap_or(&config::default_config()));
            match merged.validate() {
                Ok(()) => merged,
                Err(reason) => {
                    debug!(%reason, "connect flags incomplete");
                    wizard::run(prompter, None, &merged)?
                }
            }
        };

        if self.registry.is_connected().await {
            info!("replacing the current connection");
        }
        self.registry.switch(config).await?;
        self.tables.clear();
        let active = self.registry.current().await?;
        let driver = active.driver().await;
        writeln!(out, "{OK}connected to {}", driver.display_name())?;

        match driver.get_tables().await {
            Ok(tables) => self.tables = tables,
            Err(e) => warn!(error = %e, "table list unavailable for completion"),
        }
        Ok(())
    }

    async fn select(&mut self, sql: &str, out: &mut dyn Write) -> Result<()> {
        let active = self.registry.current().await?;
        let driver = active.driver().await;
        let rows = driver.query(sql).await?;

        let declared = match infer_table(sql) {
            Some(table) => driver.get_table_columns(&table).await.ok(),
            None => None,
        };
        let columns = match declared.filter(|d| !d.is_empty()) {
            Some(declared) => export::order_columns(Some(&declared), rows.first()),
            None => alphabetical(rows.first()),
        };

        write!(out, "{}", render::rows(&columns, &rows))?;
        Ok(())
    }

    async fn config(&mut self, command: ConfigCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            ConfigCommand::Show => {
                let text = self.store.display()?;
                writeln!(out, "Default connection ({}):\n{text}", self.store.path().display())?;
            }
            ConfigCommand::Save => {
                let current = self
                    .registry
                    .current_config()
                    .await
                    .ok_or(DataError::NotConnected)?;
                self.store.save(&current)?;
                writeln!(out, "{OK}saved to {}", self.store.path().display())?;
            }
            ConfigCommand::Set { key, value } => {
                let updated = self.store.set(&key, &value)?;
                writeln!(out, "{OK}{key} updated\n{}", config::render(&updated))?;
            }
            ConfigCommand::Clear => {
                self.store.clear()?;
                writeln!(out, "{OK}default connection removed")?;
            }
        }
        Ok(())
    }
}

/// The first word after `from`, stripped of punctuation.
fn infer_table(sql: &str) -> Option<String> {
    let mut words = sql.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("from"))?;
    let table = words
        .next()?
        .trim_matches(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'));
    (!table.is_empty()).then(|| table.to_string())
}

fn alphabetical(first: Option<&Row>) -> Vec<String> {
    let mut columns: Vec<String> = first
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default();
    columns.sort();
    columns
}

/// Wizard input over the line editor; secret answers are masked.
struct EditorPrompter<'a> {
    editor: &'a mut Editor<ShellHelper, DefaultHistory>,
}

impl Prompter for EditorPrompter<'_> {
    fn ask(&mut self, prompt: &str, secret: bool) -> Result<String> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_masking(secret);
        }
        let answer = self.editor.readline(prompt);
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_masking(false);
        }
        match answer {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                Err(DataError::InvalidInput("cancelled".to_string()))
            }
            Err(e) => Err(DataError::Terminal(e.to_string())),
        }
    }

    fn say(&mut self, text: &str) {
        println!("{text}");
    }
}

fn terminal(e: impl ToString) -> DataError {
    DataError::Terminal(e.to_string())
}

/// The interactive read-eval-print loop.
pub struct Shell {
    session: Session,
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl Shell {
    pub fn new(registry: ConnectionRegistry, store: ConfigStore) -> Result<Self> {
        let config = Config::builder()
            .max_history_size(1000)
            .map_err(terminal)?
            .history_ignore_dups(true)
            .map_err(terminal)?
            .history_ignore_space(true)
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();

        let mut editor: Editor<ShellHelper, DefaultHistory> =
            Editor::with_config(config).map_err(terminal)?;
        editor.set_helper(Some(ShellHelper::default()));

        Ok(Self {
            session: Session::new(registry, store),
            editor,
        })
    }

    /// Connect before the loop starts (the `connect` subcommand).
    pub async fn connect(&mut self, args: ConnectArgs) -> Result<()> {
        let mut prompter = EditorPrompter {
            editor: &mut self.editor,
        };
        let mut stdout = io::stdout();
        self.session.connect(args, &mut prompter, &mut stdout).await?;
        self.sync_completions();
        Ok(())
    }

    fn sync_completions(&mut self) {
        let tables = self.session.tables().to_vec();
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_tables(tables);
        }
    }

    /// Read and run commands until `exit`, Ctrl-C or Ctrl-D.
    pub async fn run(&mut self) -> Result<()> {
        println!("Type help for a list of commands.");

        loop {
            let prompt = self.session.prompt().await;
            let line = match self.editor.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    self.session.registry.shutdown().await;
                    println!("bye");
                    return Ok(());
                }
                Err(e) => return Err(terminal(e)),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Err(e) = self.editor.add_history_entry(trimmed) {
                warn!(error = %e, "could not record history entry");
            }

            let command = match parser::parse(trimmed) {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{FAIL}{e}");
                    continue;
                }
            };

            let mut prompter = EditorPrompter {
                editor: &mut self.editor,
            };
            let mut stdout = io::stdout();
            match self.session.dispatch(command, &mut prompter, &mut stdout).await {
                Ok(Flow::Exit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("{FAIL}{e}"),
            }
            self.sync_completions();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::testing::FakeDriver;
    use crate::services::database::traits::{DatabaseType, Value};
    use std::sync::atomic::Ordering;

    struct NoInput;

    impl Prompter for NoInput {
        fn ask(&mut self, _prompt: &str, _secret: bool) -> Result<String> {
            Err(DataError::InvalidInput("no input in tests".into()))
        }

        fn say(&mut self, _text: &str) {}
    }

    fn session(dir: &tempfile::TempDir) -> Session {
        let store = ConfigStore::at(dir.path().join("config.json"));
        Session::new(ConnectionRegistry::new(), store)
    }

    async fn run(session: &mut Session, line: &str) -> Result<String> {
        let mut out = Vec::new();
        session
            .dispatch(parser::parse(line)?, &mut NoInput, &mut out)
            .await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_infer_table() {
        assert_eq!(infer_table("select * from users where id = 1").as_deref(), Some("users"));
        assert_eq!(infer_table("SELECT a FROM main.t;").as_deref(), Some("main.t"));
        assert_eq!(infer_table("select 1"), None);
    }

    #[test]
    fn test_commands_need_a_connection() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session(&dir);
            assert_eq!(session.prompt().await, "db> ");
            for line in ["status", "show tables", "select 1", "config save"] {
                assert!(matches!(run(&mut session, line).await, Err(DataError::NotConnected)), "{line}");
            }
        });
    }

    #[test]
    fn test_sqlite_session() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db = dir.path().join("shell.db");
            let mut session = session(&dir);

            let out = run(&mut session, &format!("connect --type sqlite -D {}", db.display()))
                .await
                .unwrap();
            assert!(out.starts_with("✓ connected to"));
            assert_eq!(session.prompt().await, format!("db[{}]> ", db.display()));

            // Reach the driver directly for DDL, which the shell does not accept
            {
                let active = session.registry.current().await.unwrap();
                let driver = active.driver().await;
                driver
                    .execute("CREATE TABLE people (zeta TEXT, id INTEGER PRIMARY KEY, name TEXT)")
                    .await
                    .unwrap();
            }

            let out = run(&mut session, "insert into people (id, name, zeta) values (1, 'ann', 'z');")
                .await
                .unwrap();
            assert_eq!(out, "✓ 1 row(s) affected\n");

            let out = run(&mut session, "show tables").await.unwrap();
            assert_eq!(out, "  1) people\n");
            assert_eq!(session.tables(), ["people".to_string()]);

            // Declared order, not alphabetical
            let out = run(&mut session, "SELECT * FROM people").await.unwrap();
            let header = out.lines().next().unwrap();
            assert!(header.starts_with("zeta"));
            assert!(out.contains("1 row(s) returned"));

            let out = run(&mut session, "select * from people where id = 99").await.unwrap();
            assert_eq!(out, "no rows returned\n");

            let out = run(&mut session, "desc table people").await.unwrap();
            assert!(out.contains("PRIMARY KEY"));
            assert!(matches!(
                run(&mut session, "desc table missing").await,
                Err(DataError::TableNotFound(_))
            ));

            let out = run(&mut session, "config save").await.unwrap();
            assert!(out.starts_with("✓ saved to"));
            let out = run(&mut session, "config").await.unwrap();
            assert!(out.contains("  type:     sqlite"));

            let csv = dir.path().join("people.csv");
            let out = run(&mut session, &format!("export people {}", csv.display())).await.unwrap();
            assert!(out.contains("exported 1 row(s)"));
            assert!(csv.exists());

            let flow = session
                .dispatch(Command::Exit, &mut NoInput, &mut Vec::new())
                .await
                .unwrap();
            assert_eq!(flow, Flow::Exit);
            assert!(!session.registry.is_connected().await);
        });
    }

    #[test]
    fn test_select_falls_back_to_alphabetical() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session(&dir);

            let mut driver = FakeDriver::connected();
            driver.columns = None;
            driver.rows = vec![Row::from_pairs(vec![
                ("b", Value::Int64(2)),
                ("a", Value::Int64(1)),
            ])];
            session.registry.install(Box::new(driver)).await.unwrap();

            let out = run(&mut session, "select * from fake_table").await.unwrap();
            assert!(out.starts_with("a "));
        });
    }

    #[test]
    fn test_exit_closes_driver_and_reconnect_replaces_it() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session(&dir);

            let driver = FakeDriver::connected();
            let closes = driver.closes.clone();
            session.registry.install(Box::new(driver)).await.unwrap();

            let db = dir.path().join("next.db");
            run(&mut session, &format!("connect -t sqlite -D {}", db.display()))
                .await
                .unwrap();
            assert_eq!(closes.load(Ordering::SeqCst), 1);
            let config = session.registry.current_config().await.unwrap();
            assert_eq!(config.database_type, DatabaseType::SQLite);

            run(&mut session, "exit").await.unwrap();
            assert!(session.registry.current_config().await.is_none());
        });
    }

    #[test]
    fn test_failed_reconnect_keeps_connection() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session(&dir);

            let driver = FakeDriver::connected();
            let closes = driver.closes.clone();
            session.registry.install(Box::new(driver)).await.unwrap();

            let db = dir.path().join("missing").join("next.db");
            let result = run(&mut session, &format!("connect -t sqlite -D {}", db.display())).await;
            assert!(matches!(result, Err(DataError::ConnectFailed { .. })));
            assert_eq!(closes.load(Ordering::SeqCst), 0);

            let config = session.registry.current_config().await.unwrap();
            assert_eq!(config.database_type, DatabaseType::MySQL);
        });
    }

    #[test]
    fn test_incomplete_flags_start_wizard() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session(&dir);
            // MySQL without host and user needs the wizard, which has no input here
            let err = run(&mut session, "connect --type mysql -D app").await.unwrap_err();
            assert!(matches!(err, DataError::InvalidInput(_)));
            assert!(!session.registry.is_connected().await);
        });
    }
}
