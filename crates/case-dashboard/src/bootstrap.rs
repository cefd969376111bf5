use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user state directory under `$HOME`.
pub const APP_DIR: &str = ".case-dashboard";

/// Default log file name inside `~/.case-dashboard/logs/`.
pub const LOG_FILE_NAME: &str = "case-dashboard.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Root of the per-user state directory.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Ensure `~/.case-dashboard/` and `~/.case-dashboard/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let app = app_dir();
    std::fs::create_dir_all(&app)?;
    std::fs::create_dir_all(app.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Appended to; never truncated.
    File(PathBuf),
}

/// Pick the log destination for a run.
///
/// An explicit `--log-file` always wins. Otherwise the interactive dashboard
/// logs to `~/.case-dashboard/logs/case-dashboard.log` so the alternate
/// screen stays clean, and the one-shot views log to stderr.
pub fn log_target(view: &str, log_file: Option<&Path>) -> LogTarget {
    match (log_file, view) {
        (Some(path), _) => LogTarget::File(path.to_path_buf()),
        (None, "dashboard") => LogTarget::File(app_dir().join("logs").join(LOG_FILE_NAME)),
        (None, _) => LogTarget::Stderr,
    }
}

/// Map a `DEBUG|INFO|WARNING|ERROR|CRITICAL` level name to an
/// [`EnvFilter`] directive. Unknown names pass through unchanged.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Falls back to `"info"` if the level string is not a valid directive.
pub fn setup_logging(log_level: &str, target: &LogTarget) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
