//! Logging setup for tilesource binaries and embedders.
//!
//! Console output goes to stderr. When a directory is configured, a plain
//! text copy is also written to `<directory>/<file_name>`; the file is
//! cleared at session start. The level comes from `RUST_LOG` and falls back
//! to the configured default filter.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILE: &str = "tilesource.log";
pub const DEFAULT_FILTER: &str = "info";

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Directory for the log file. No file is written when `None`.
    pub directory: Option<PathBuf>,
    pub file_name: String,
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `tilesource=debug`.
    pub default_filter: String,
    /// ANSI colors on the console layer.
    pub ansi: bool,
}

impl LoggingConfig {
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Full path of the log file, if file output is enabled.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(&self.file_name))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: DEFAULT_LOG_FILE.to_string(),
            default_filter: DEFAULT_FILTER.to_string(),
            ansi: true,
        }
    }
}

/// Keeps the file writer alive. Dropping it flushes pending log lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Creates `directory` if needed and truncates the log file in it.
pub fn prepare_log_file(directory: &Path, file_name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let path = directory.join(file_name);
    fs::write(&path, "")?;
    Ok(path)
}

/// Installs the global subscriber.
///
/// Fails if the log directory cannot be prepared or a global subscriber is
/// already set.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, io::Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi)
        .with_target(false);

    let (file_layer, file_guard) = match &config.directory {
        Some(directory) => {
            prepare_log_file(directory, &config.file_name)?;
            let appender = tracing_appender::rolling::never(directory, &config.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339())
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.directory, None);
        assert_eq!(config.file_name, "tilesource.log");
        assert_eq!(config.default_filter, "info");
        assert_eq!(config.log_path(), None);
    }

    #[test]
    fn test_log_path_joins_directory() {
        let config = LoggingConfig::default().with_directory("/var/log/tiles");
        assert_eq!(
            config.log_path(),
            Some(PathBuf::from("/var/log/tiles/tilesource.log"))
        );
    }

    #[test]
    fn test_prepare_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("deep").join("nested");

        let path = prepare_log_file(&dir, "test.log").unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_clears_previous_session() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("test.log"), "old log data").unwrap();

        let path = prepare_log_file(temp.path(), "test.log").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_prepare_fails_when_directory_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        assert!(prepare_log_file(&blocker.join("logs"), "test.log").is_err());
    }

    #[test]
    fn test_guard_holds_writer() {
        let (writer, guard) = tracing_appender::non_blocking(io::sink());
        drop(writer);
        let _guard = LoggingGuard {
            _file_guard: Some(guard),
        };
    }
}
