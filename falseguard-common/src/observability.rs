//! Logging setup shared by the CLI and the integration tests.
//!
//! Events go to a daily rolling file under the resolved log directory and,
//! optionally, to stderr. `RUST_LOG` overrides the configured filter.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "FALSEGUARD_LOG_DIR";
const LOG_FORMAT_ENV: &str = "FALSEGUARD_LOG_FORMAT";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for defaults and file names).
    pub app_name: String,
    /// Optional explicit directory for log output. If `None`, we consult
    /// `FALSEGUARD_LOG_DIR` and finally fall back to `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Whether to duplicate events to `stderr` in addition to the file sink.
    pub emit_stderr: bool,
    /// Preferred log encoding.
    pub format: LogFormat,
    /// Default filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "falseguard".to_string(),
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Returns the path of today's log file. Later calls do not touch the
/// subscriber and hand back the path resolved by the first call.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(&config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let file_stem = format!("{}.log", config.app_name);
    // rolling::daily names files `<stem>.<YYYY-MM-DD>`
    let today_path = dir.join(format!("{file_stem}.{}", Local::now().format("%Y-%m-%d")));

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &file_stem));
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let json = config.format == LogFormat::Json;
    let file_text = (!json).then(|| fmt::layer().with_writer(writer.clone()).with_ansi(false));
    let file_json = json.then(|| fmt::layer().json().with_writer(writer));
    let stderr_text = (config.emit_stderr && !json).then(|| fmt::layer().with_writer(std::io::stderr));
    let stderr_json =
        (config.emit_stderr && json).then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_text)
        .with(file_json)
        .with(stderr_text)
        .with(stderr_json)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(today_path.clone());
    Ok(today_path)
}

impl LogFormat {
    /// Read `FALSEGUARD_LOG_FORMAT` (`text`/`json`), falling back to `default`.
    pub fn from_env_or(default: LogFormat) -> LogFormat {
        match std::env::var(LOG_FORMAT_ENV).ok().as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            _ => default,
        }
    }
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from))
        .map(|dir| expand_home(&dir))
        .unwrap_or_else(|| default_data_dir(app_name))
}

fn home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// `~/.local/share/<app>`, or `./<app>` without a home directory.
fn default_data_dir(app_name: &str) -> PathBuf {
    home()
        .map(|h| h.join(".local").join("share"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins_over_env() {
        let dir = resolve_log_dir("fg", Some(Path::new("/tmp/fg-logs")));
        assert_eq!(dir, PathBuf::from("/tmp/fg-logs"));
    }

    #[test]
    fn tilde_is_expanded_against_home() {
        if let Ok(home) = std::env::var("HOME") {
            let expanded = expand_home(Path::new("~/logs"));
            assert_eq!(expanded, PathBuf::from(home).join("logs"));
        }
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        assert!(default_data_dir("falseguard").ends_with("falseguard"));
    }
}
