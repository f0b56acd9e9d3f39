//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "DATAMGR_LOG";

/// Output style of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the filter: `DATAMGR_LOG` if set, else `warn` (`debug` when verbose).
///
/// Line-editor internals are always silenced.
pub fn build_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = match std::env::var(LOG_ENV) {
        Ok(spec) if !verbose && !spec.trim().is_empty() => EnvFilter::new(spec),
        _ => EnvFilter::new(fallback),
    };
    match "rustyline=off".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Calling this twice is harmless; the second call keeps the first subscriber.
pub fn init(verbose: bool, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Unable to set up logging: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter() {
        assert!(build_filter(true).to_string().contains("debug"));
        assert!(build_filter(true).to_string().contains("rustyline=off"));
    }
}
