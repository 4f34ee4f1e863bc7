//! File logging. The terminal belongs to the TUI, so nothing goes to stderr
//! once the alternate screen is up.
//!
//! Filter with `KUE_LOG` (same syntax as `RUST_LOG`), default `info`.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "KUE_LOG";
const LOG_FILE: &str = "kue.log";

/// Must be held until exit; dropping it flushes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    pub log_path: PathBuf,
}

pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kue")
        .join("logs")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"))
}

pub fn init() -> anyhow::Result<LoggingGuard> {
    let dir = log_dir();
    fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()?;

    let log_path = dir.join(LOG_FILE);
    tracing::info!(log_path = %log_path.display(), "logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_path,
    })
}
