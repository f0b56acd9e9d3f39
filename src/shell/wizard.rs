//! Connection parameters from flags or an interactive walk-through.

use crate::error::Result;
use crate::services::database::traits::{ConnectionConfig, DatabaseType};

/// Connection fields given on the command line; unset ones come from defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectArgs {
    pub database_type: Option<DatabaseType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
}

impl ConnectArgs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the given fields on `base`.
    ///
    /// Switching dialect without an explicit port resets the port to the new
    /// dialect's default.
    pub fn merge(&self, base: &ConnectionConfig) -> ConnectionConfig {
        let mut config = base.clone();
        if let Some(database_type) = self.database_type {
            if database_type != config.database_type && self.port.is_none() {
                config.port = database_type.default_port().unwrap_or(0);
            }
            config.database_type = database_type;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(dbname) = &self.dbname {
            config.dbname = dbname.clone();
        }
        config
    }
}

/// Line input used by the wizard.
pub trait Prompter {
    /// Read one answer; `secret` input is not echoed.
    fn ask(&mut self, prompt: &str, secret: bool) -> Result<String>;

    /// Print a line to the user.
    fn say(&mut self, text: &str);
}

const SUPPORTED: &str = "dameng, mysql, postgresql, sqlite, oracle, mssql";

fn ask_with_default(
    prompter: &mut dyn Prompter,
    label: &str,
    default: &str,
    secret: bool,
) -> Result<String> {
    let prompt = if default.is_empty() {
        format!("{label}: ")
    } else if secret {
        format!("{label} [********]: ")
    } else {
        format!("{label} [{default}]: ")
    };
    let answer = prompter.ask(&prompt, secret)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Walk the user through the connection fields.
///
/// With a saved configuration the user is first offered to reuse it as is.
/// Every field defaults to the saved (or built-in) value; an unknown dialect
/// name keeps the default dialect.
pub fn run(
    prompter: &mut dyn Prompter,
    saved: Option<&ConnectionConfig>,
    fallback: &ConnectionConfig,
) -> Result<ConnectionConfig> {
    if let Some(saved) = saved {
        prompter.say("Saved default connection:");
        prompter.say(&crate::config::render(saved));
        let answer = prompter.ask("Use the saved connection? (y/n): ", false)?;
        if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            return Ok(saved.clone());
        }
    }

    let base = saved.unwrap_or(fallback);
    let mut config = base.clone();

    prompter.say(&format!("Supported types: {SUPPORTED}"));
    let type_answer = ask_with_default(prompter, "Type", base.database_type.to_db_str(), false)?;
    match type_answer.parse::<DatabaseType>() {
        Ok(database_type) => {
            if database_type != base.database_type {
                config.port = database_type.default_port().unwrap_or(0);
            }
            config.database_type = database_type;
        }
        Err(_) => prompter.say(&format!(
            "Unknown type {type_answer:?}, using {}",
            base.database_type.to_db_str()
        )),
    }

    if config.database_type.is_file_based() {
        config.dbname = ask_with_default(prompter, "Database file", &config.dbname, false)?;
        return Ok(config);
    }

    config.host = ask_with_default(prompter, "Host", &config.host, false)?;
    let port_default = config.effective_port().to_string();
    let port_answer = ask_with_default(prompter, "Port", &port_default, false)?;
    match port_answer.parse() {
        Ok(port) => config.port = port,
        Err(_) => prompter.say(&format!("Invalid port {port_answer:?}, using {port_default}")),
    }
    config.user = ask_with_default(prompter, "User", &config.user, false)?;
    config.password = ask_with_default(prompter, "Password", &config.password, true)?;
    config.dbname = ask_with_default(prompter, "Database", &config.dbname, false)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<&'static str>,
        prompts: Vec<(String, bool)>,
        said: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl Prompter for Scripted {
        fn ask(&mut self, prompt: &str, secret: bool) -> Result<String> {
            self.prompts.push((prompt.to_string(), secret));
            Ok(self.answers.pop_front().unwrap_or_default().to_string())
        }

        fn say(&mut self, text: &str) {
            self.said.push(text.to_string());
        }
    }

    fn saved() -> ConnectionConfig {
        ConnectionConfig::new(DatabaseType::MySQL, "db", 3306, "app", "pw", "main")
    }

    #[test]
    fn test_merge_overrides_and_resets_port() {
        let args = ConnectArgs {
            database_type: Some(DatabaseType::PostgreSQL),
            dbname: Some("other".into()),
            ..Default::default()
        };
        let merged = args.merge(&saved());
        assert_eq!(merged.database_type, DatabaseType::PostgreSQL);
        assert_eq!(merged.port, 5432);
        assert_eq!(merged.host, "db");
        assert_eq!(merged.dbname, "other");
        assert!(ConnectArgs::default().is_empty());
    }

    #[test]
    fn test_accepting_saved_config() {
        let mut prompter = Scripted::new(&["Y"]);
        let config = run(&mut prompter, Some(&saved()), &crate::config::default_config()).unwrap();
        assert_eq!(config, saved());
        assert!(prompter.said.iter().any(|line| line.contains("********")));
    }

    #[test]
    fn test_walkthrough_with_defaults_and_bad_type() {
        let mut prompter = Scripted::new(&["n", "db2", "", "", "", "", "other"]);
        let config = run(&mut prompter, Some(&saved()), &crate::config::default_config()).unwrap();

        assert_eq!(config.database_type, DatabaseType::MySQL);
        assert_eq!(config.host, "db");
        assert_eq!(config.port, 3306);
        assert_eq!(config.password, "pw");
        assert_eq!(config.dbname, "other");

        let password_prompt = prompter.prompts.iter().find(|(p, _)| p.starts_with("Password")).unwrap();
        assert!(password_prompt.1);
        assert!(!password_prompt.0.contains("pw"));
    }

    #[test]
    fn test_sqlite_asks_only_for_file() {
        let mut prompter = Scripted::new(&["sqlite", "/tmp/x.db"]);
        let config = run(&mut prompter, None, &crate::config::default_config()).unwrap();
        assert_eq!(config.database_type, DatabaseType::SQLite);
        assert_eq!(config.dbname, "/tmp/x.db");
        assert_eq!(prompter.prompts.len(), 2);
    }
}
