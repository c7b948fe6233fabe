/// Runtime configuration: database location and log filter.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db;

pub const DB_ENV_VAR: &str = "HABITR_DB";
const DEFAULT_LOG_FILTER: &str = "habitr=warn";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
}

impl Config {
    /// The command line takes precedence over the environment.
    pub fn load(cli_db_path: Option<String>) -> Self {
        let env_db_path = std::env::var(DB_ENV_VAR).ok();
        Self {
            db_path: resolve_db_path(cli_db_path, env_db_path),
        }
    }
}

pub fn resolve_db_path(cli_db_path: Option<String>, env_db_path: Option<String>) -> String {
    let given = |path: &String| !path.trim().is_empty();
    cli_db_path
        .filter(given)
        .or_else(|| env_db_path.filter(given))
        .unwrap_or_else(db::default_db_path)
}

/// Logs go to stderr so command output on stdout stays clean.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_beats_environment() {
        assert_eq!(
            resolve_db_path(Some("cli.db".into()), Some("env.db".into())),
            "cli.db"
        );
        assert_eq!(resolve_db_path(None, Some("env.db".into())), "env.db");
    }

    #[test]
    fn blank_sources_fall_through() {
        assert_eq!(resolve_db_path(Some("".into()), Some("env.db".into())), "env.db");
        assert_eq!(resolve_db_path(Some("  ".into()), Some("".into())), db::default_db_path());
    }
}
