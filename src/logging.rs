//! File-based logging setup.
//!
//! Logs go to `~/.palisade/palisade.log` so they never mix with the chat
//! output on the terminal. The log level is controlled via `RUST_LOG`
//! (default `info`).

use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize file-based logging. Failures are reported on stderr and
/// otherwise ignored; the assistant works fine without a log file.
pub fn init_logging() {
    let log_dir = match dirs::home_dir() {
        Some(home) => home.join(".palisade"),
        None => PathBuf::from(".palisade"),
    };

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
        return;
    }

    let log_path = log_dir.join("palisade.log");
    let log_file = match fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to open log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    // Keep the non-blocking writer alive for the whole program.
    std::mem::forget(guard);

    tracing::info!("logging initialized, writing to {}", log_path.display());
}
