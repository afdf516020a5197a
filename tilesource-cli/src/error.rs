//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use tilesource::coord::CoordError;
use tilesource::SourceError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Invalid or unreadable configuration
    Config(String),
    /// Invalid tile or geographic coordinate
    Coordinate(CoordError),
    /// Failed to create or drive the geometry source
    Source(SourceError),
    /// Fetches were still pending when the wait expired
    Timeout { pending: u64 },
}

impl CliError {
    /// Exit the process with an error message and code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Source(SourceError::WorkerSpawn(_)) => {
                eprintln!();
                eprintln!("The system refused to start worker threads.");
                eprintln!("Try a smaller --workers value.");
            }
            CliError::Timeout { .. } => {
                eprintln!();
                eprintln!("Raise --timeout-secs or lower --latency-ms.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Coordinate(e) => write!(f, "Invalid coordinate: {}", e),
            CliError::Source(e) => write!(f, "Geometry source error: {}", e),
            CliError::Timeout { pending } => {
                write!(f, "Timed out with {} fetches still pending", pending)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Coordinate(e) => Some(e),
            CliError::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Source(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinate(e)
    }
}
