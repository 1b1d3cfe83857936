//! Logging and tracing configuration
//!
//! Run progress goes to stderr so `--json` output on stdout stays clean.

use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("webcase=info,warn"))
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing to stderr plus an appended log file
///
/// The file lives at `<data_dir>/logs/webcase.log`. Falls back to
/// [`init_cli`] when there is no data directory or the file can't be opened.
pub fn init_with_file() -> Option<PathBuf> {
    init_with_file_at(log_path())
}

fn init_with_file_at(log_file: Option<PathBuf>) -> Option<PathBuf> {
    let Some(log_file) = log_file else {
        eprintln!("Warning: No data directory for the log file, logging to stderr only");
        init_cli();
        return None;
    };

    let opened = log_file
        .parent()
        .map(std::fs::create_dir_all)
        .transpose()
        .and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
        });

    match opened {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact();

            tracing_subscriber::registry()
                .with(default_filter())
                .with(file_layer)
                .with(stderr_layer)
                .init();

            Some(log_file)
        }
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            init_cli();
            None
        }
    }
}

/// Get the path to the run log file
pub fn log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("webcase.log"))
}
