//! Logging infrastructure.
//!
//! Structured logging with dual output:
//! - Writes to a log file in the given directory (cleared on session start)
//! - Also prints to stdout for interactive tailing
//! - Configurable via the RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, clears the previous log file, and
/// sets up dual output to both file and stdout.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Clear previous log file; handles both existing and missing files
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test in this module: try_init installs the process-global
    // subscriber, so only one initialization may run per test binary.
    #[test]
    fn test_init_logging_creates_and_clears_log_file() {
        let dir = std::env::temp_dir().join(format!("tilestyle-log-test-{}", std::process::id()));
        let dir_str = dir.to_str().unwrap().to_string();

        let guard = init_logging(&dir_str, "tilestyle.log").unwrap();
        tracing::info!("logging smoke test");
        drop(guard);

        let log_path = dir.join("tilestyle.log");
        assert!(log_path.exists(), "log file must be created");

        // Re-running against the same directory clears the file but fails
        // to re-install the global subscriber
        fs::write(&log_path, "stale contents").unwrap();
        assert!(init_logging(&dir_str, "tilestyle.log").is_err());
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");

        fs::remove_dir_all(&dir).unwrap();
    }
}
