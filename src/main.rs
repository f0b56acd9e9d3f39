//! datamgr - interactive shell for relational databases.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use datamgr_cli::config::{ConfigStore, render};
use datamgr_cli::logging::{self, LogFormat};
use datamgr_cli::services::database::ConnectionRegistry;
use datamgr_cli::services::database::traits::DatabaseType;
use datamgr_cli::shell::{ConnectArgs, Shell};
use datamgr_cli::shell::render::{FAIL, OK};

#[derive(Parser)]
#[command(name = "datamgr")]
#[command(about = "Query, import and export data across database engines")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a database and start the shell
    Connect(ConnectFlags),

    /// Maintain the saved default connection
    Config(ConfigFlags),

    /// Print the version
    Version,
}

fn parse_type(value: &str) -> Result<DatabaseType, String> {
    value.parse::<DatabaseType>().map_err(|_| {
        format!("unknown type {value:?} (expected dameng, mysql, postgresql, sqlite, oracle or mssql)")
    })
}

#[derive(Args)]
struct ConnectFlags {
    /// Database type
    #[arg(long = "type", value_parser = parse_type)]
    database_type: Option<DatabaseType>,

    #[arg(short = 'H', long)]
    host: Option<String>,

    #[arg(short = 'P', long)]
    port: Option<u16>,

    #[arg(short, long)]
    user: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// Database name (file path for SQLite)
    #[arg(short = 'D', long)]
    dbname: Option<String>,
}

impl From<ConnectFlags> for ConnectArgs {
    fn from(flags: ConnectFlags) -> Self {
        ConnectArgs {
            database_type: flags.database_type,
            host: flags.host,
            port: flags.port,
            user: flags.user,
            password: flags.password,
            dbname: flags.dbname,
        }
    }
}

#[derive(Args)]
struct ConfigFlags {
    /// Show the saved connection
    #[arg(long)]
    show: bool,

    /// Save the active connection (shell only)
    #[arg(long)]
    save: bool,

    /// Delete the saved connection
    #[arg(long)]
    clear: bool,

    #[arg(long = "type")]
    database_type: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[arg(long)]
    dbname: Option<String>,
}

impl ConfigFlags {
    fn updates(&self) -> Vec<(&'static str, &str)> {
        [
            ("type", &self.database_type),
            ("host", &self.host),
            ("port", &self.port),
            ("user", &self.user),
            ("password", &self.password),
            ("dbname", &self.dbname),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

fn config_command(store: &ConfigStore, flags: &ConfigFlags) -> anyhow::Result<()> {
    if flags.save {
        anyhow::bail!("--save needs an active connection; run `config save` inside the shell");
    }
    if flags.clear {
        store.clear()?;
        println!("{OK}default connection removed");
        return Ok(());
    }

    let mut latest = None;
    for (key, value) in flags.updates() {
        latest = Some(store.set(key, value)?);
    }
    match latest {
        Some(config) if !flags.show => {
            println!("{OK}saved to {}\n{}", store.path().display(), render(&config));
        }
        _ => println!("Default connection ({}):\n{}", store.path().display(), store.display()?),
    }
    Ok(())
}

/// How long a signal waits for a running operation to release the driver.
#[cfg(unix)]
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(3);

/// Disconnect and exit on SIGINT or SIGTERM outside the line editor.
///
/// A second signal exits at once without waiting for the disconnect.
#[cfg(unix)]
fn spawn_signal_handler(registry: ConnectionRegistry) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let mut closing = false;
            for signal in signals.forever() {
                if closing {
                    warn!(signal, "second signal, exiting without disconnect");
                    std::process::exit(0);
                }
                closing = true;
                info!(signal, "signal received, disconnecting");

                let registry = registry.clone();
                let spawned = std::thread::Builder::new()
                    .name("shutdown".to_string())
                    .spawn(move || {
                        smol::block_on(registry.shutdown_within(SHUTDOWN_GRACE));
                        std::process::exit(0);
                    });
                if let Err(e) = spawned {
                    warn!(error = %e, "could not start shutdown thread");
                    std::process::exit(0);
                }
            }
        })?;
    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_handler(_registry: ConnectionRegistry) -> anyhow::Result<()> {
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Version) => {
            println!("datamgr {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Config(flags)) => {
            let store = ConfigStore::default_location()?;
            config_command(&store, &flags)
        }
        Some(Commands::Connect(flags)) => {
            let registry = ConnectionRegistry::new();
            spawn_signal_handler(registry.clone())?;
            let mut shell = Shell::new(registry, ConfigStore::default_location()?)?;
            smol::block_on(async {
                shell.connect(flags.into()).await?;
                shell.run().await
            })?;
            Ok(())
        }
        None => {
            let registry = ConnectionRegistry::new();
            spawn_signal_handler(registry.clone())?;
            let mut shell = Shell::new(registry, ConfigStore::default_location()?)?;
            smol::block_on(shell.run())?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);
    debug!(version = env!("CARGO_PKG_VERSION"), "starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{FAIL}{e}");
            ExitCode::from(1)
        }
    }
}
