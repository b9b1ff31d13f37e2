//! Logging Infrastructure
//!
//! Structured logging for the store. `RUST_LOG` wins over the configured level
//! when set.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger (stdout, `info`)
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional daily-rolling file output
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        match std::fs::create_dir_all(log_path) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(log_path, "tepiha-store");
                let _ = subscriber
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("log directory {dir} unavailable ({e}), logging to stdout");
            }
        }
    }

    let _ = subscriber.try_init();
}
