use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::constants::{LOG_FILE_PREFIX, LOG_TIMESTAMP_FORMAT};
use crate::error::{CleanerError, Result};

/// Owns the log sink for one pipeline run.
///
/// Dropping the context flushes buffered records and closes the log file,
/// so keep it alive until the run returns.
pub struct LoggingContext {
    log_file: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

impl LoggingContext {
    /// A context with no file sink, for tests and embedding
    pub fn disabled() -> Self {
        Self {
            log_file: None,
            _guard: None,
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Install console and file logging. Fails if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<LoggingContext> {
    fs::create_dir_all(&config.dir)?;

    let file_name = format!("{}{}.log", LOG_FILE_PREFIX, Local::now().format(LOG_TIMESTAMP_FORMAT));
    let log_file = config.dir.join(&file_name);

    // One file per run; no rotation
    let file_appender = tracing_appender::rolling::never(&config.dir, &file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if config.json_file {
        fmt::layer().json().with_writer(non_blocking_writer).boxed()
    } else {
        fmt::layer().with_ansi(false).with_writer(non_blocking_writer).boxed()
    };

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    // Respect RUST_LOG if set; otherwise use the configured level for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fisheries_cleaner={},warn", config.level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| CleanerError::Logging(e.to_string()))?;

    Ok(LoggingContext {
        log_file: Some(log_file),
        _guard: Some(guard),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_context_has_no_file() {
        let ctx = LoggingContext::disabled();
        assert!(ctx.log_file().is_none());
    }
}
