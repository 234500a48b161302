//! Application-level configuration: command-line arguments plus environment overrides.

use std::{env, path::PathBuf, time::Duration};

use clap::Parser;
use tracing::warn;

/// Port used when none is given on the command line.
pub const DEFAULT_PORT: u16 = 8080;
/// Environment variable overriding the persistence debounce window, in milliseconds.
const PERSIST_WINDOW_ENV: &str = "TICKSHARE_PERSIST_WINDOW_MS";
/// Environment variable overriding the static asset directory.
const STATIC_DIR_ENV: &str = "TICKSHARE_STATIC_DIR";
/// At most one write of the state document per window.
const DEFAULT_PERSIST_WINDOW: Duration = Duration::from_millis(1_000);
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Parser, Debug)]
#[command(name = "tickshare")]
#[command(about = "Live-synchronized stopwatch server", long_about = None)]
/// Positional command-line arguments of the server binary.
pub struct ServerArgs {
    /// JSON file holding every stopwatch and group
    pub state_file: PathBuf,

    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    state_path: PathBuf,
    port: u16,
    persist_window: Duration,
    static_dir: PathBuf,
}

impl AppConfig {
    /// Combine parsed arguments with the environment overrides.
    pub fn from_args(args: ServerArgs) -> Self {
        Self {
            state_path: args.state_file,
            port: args.port,
            persist_window: resolve_persist_window(),
            static_dir: resolve_static_dir(),
        }
    }

    /// Configuration with built-in defaults for the given state file.
    pub fn for_state_file(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            port: DEFAULT_PORT,
            persist_window: DEFAULT_PERSIST_WINDOW,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }

    /// Replace the debounce window.
    pub fn with_persist_window(mut self, window: Duration) -> Self {
        self.persist_window = window;
        self
    }

    /// Path of the persisted state document.
    pub fn state_path(&self) -> &PathBuf {
        &self.state_path
    }

    /// Port the HTTP listener binds to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Minimum spacing between two writes of the state document.
    pub fn persist_window(&self) -> Duration {
        self.persist_window
    }

    /// Directory served for requests no route matches.
    pub fn static_dir(&self) -> &PathBuf {
        &self.static_dir
    }
}

/// Resolve the debounce window, falling back to the default on bad input.
fn resolve_persist_window() -> Duration {
    let Some(raw) = env::var_os(PERSIST_WINDOW_ENV) else {
        return DEFAULT_PERSIST_WINDOW;
    };
    match raw.to_str().and_then(|value| value.trim().parse::<u64>().ok()) {
        Some(millis) if millis > 0 => Duration::from_millis(millis),
        _ => {
            warn!(
                var = PERSIST_WINDOW_ENV,
                value = ?raw,
                "invalid persistence window; falling back to default"
            );
            DEFAULT_PERSIST_WINDOW
        }
    }
}

/// Resolve the static directory taking the environment override into account.
fn resolve_static_dir() -> PathBuf {
    env::var_os(STATIC_DIR_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_to_8080() {
        let args = ServerArgs::try_parse_from(["tickshare", "state.json"]).unwrap();
        assert_eq!(args.state_file, PathBuf::from("state.json"));
        assert_eq!(args.port, 8080);
    }

    #[test]
    fn explicit_port_is_used() {
        let args = ServerArgs::try_parse_from(["tickshare", "state.json", "9000"]).unwrap();
        assert_eq!(args.port, 9000);
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(ServerArgs::try_parse_from(["tickshare", "state.json", "eighty"]).is_err());
        assert!(ServerArgs::try_parse_from(["tickshare", "state.json", "70000"]).is_err());
    }

    #[test]
    fn state_file_is_required() {
        assert!(ServerArgs::try_parse_from(["tickshare"]).is_err());
    }

    #[test]
    fn defaults_for_state_file() {
        let config = AppConfig::for_state_file("db.json");
        assert_eq!(config.state_path(), &PathBuf::from("db.json"));
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.persist_window(), Duration::from_secs(1));
        assert_eq!(config.static_dir(), &PathBuf::from("static"));
    }
}
