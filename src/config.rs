//! Persisted default connection.
//!
//! One connection configuration is kept as pretty-printed JSON at
//! `~/.datamgr-cli/datamgr-cli-config.json` so `connect` can offer it as the
//! default.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DataError, Result};
use crate::services::database::traits::{ConnectionConfig, DatabaseType};

const CONFIG_DIR: &str = ".datamgr-cli";
const CONFIG_FILE: &str = "datamgr-cli-config.json";

/// Keys accepted by `config set`.
pub const CONFIG_KEYS: [&str; 6] = ["type", "host", "port", "user", "password", "dbname"];

/// Location of the default-connection file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// The store under the user's home directory.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| DataError::InvalidInput("could not find home directory".to_string()))?;
        Ok(Self::at(home.join(CONFIG_DIR).join(CONFIG_FILE)))
    }

    /// A store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved configuration.
    ///
    /// `NoDefaultConfig` when the file is absent, `ConfigCorrupt` when it
    /// cannot be parsed.
    pub fn load(&self) -> Result<ConnectionConfig> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::NoDefaultConfig);
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| DataError::ConfigCorrupt(e.to_string()))
    }

    /// Write `config`, replacing any saved one.
    pub fn save(&self, config: &ConnectionConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir(parent)?;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)?;
        set_file_mode(&self.path)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Delete the saved configuration.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DataError::NoDefaultConfig),
            Err(e) => Err(e.into()),
        }
    }

    /// Change one field, starting from defaults when nothing is saved yet.
    pub fn set(&self, key: &str, value: &str) -> Result<ConnectionConfig> {
        let mut config = match self.load() {
            Ok(config) => config,
            Err(DataError::NoDefaultConfig) => default_config(),
            Err(e) => return Err(e),
        };
        apply(&mut config, key, value)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Multi-line rendering of the saved configuration, password hidden.
    pub fn display(&self) -> Result<String> {
        Ok(render(&self.load()?))
    }
}

/// Defaults used when `config set` runs without a saved file.
pub fn default_config() -> ConnectionConfig {
    let database_type = DatabaseType::default();
    ConnectionConfig::new(
        database_type,
        "",
        database_type.default_port().unwrap_or(0),
        "",
        "",
        "",
    )
}

/// Set one field of `config` from its string form.
pub fn apply(config: &mut ConnectionConfig, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key.trim().to_lowercase().as_str() {
        "type" => {
            config.database_type = value.parse::<DatabaseType>()?;
        }
        "host" => config.host = value.to_string(),
        "port" => {
            config.port = value
                .parse()
                .map_err(|_| DataError::InvalidInput(format!("port must be a number, got {value:?}")))?;
        }
        "user" => config.user = value.to_string(),
        "password" => config.password = value.to_string(),
        "dbname" => config.dbname = value.to_string(),
        other => {
            return Err(DataError::InvalidInput(format!(
                "unknown config key {other:?} (expected one of {})",
                CONFIG_KEYS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Render a configuration for display with the password masked.
pub fn render(config: &ConnectionConfig) -> String {
    format!(
        "  type:     {}\n  host:     {}\n  port:     {}\n  user:     {}\n  password: ********\n  dbname:   {}",
        config.database_type.to_db_str(),
        config.host,
        config.port,
        config.user,
        config.dbname,
    )
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(unix)]
fn set_file_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) -> Result<()> {
    Ok(())
}
