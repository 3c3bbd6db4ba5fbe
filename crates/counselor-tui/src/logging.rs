use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "eco-counselor.log";

/// Filter from `RUST_LOG`, or `default` when unset
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Route logs to a file; the terminal belongs to the TUI.
///
/// Keep the returned guard alive for the life of the program so buffered
/// lines get flushed.
pub fn init_file(path: Option<PathBuf>) -> Result<WorkerGuard> {
    let path = match path {
        Some(path) => path,
        None => default_log_path(),
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path {} has no file name", path.display()))?;
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(env_filter("info"))
        .init();

    Ok(guard)
}

/// Log to stderr for one-shot commands, keeping stdout for the reply
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter("warn"))
        .init();
}

fn default_log_path() -> PathBuf {
    let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("eco-counselor").join(LOG_FILE_NAME)
}
