//! Error types and Result aliases for thermocap

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for thermocap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the capture supervisor. All of them are fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture timed out after {elapsed:?} (last frame seen: {last_frame:?})")]
    Timeout {
        elapsed: Duration,
        last_frame: Option<u64>,
    },

    #[error("capture process exited before reaching the frame target (exit code: {exit_code:?}, last frame seen: {last_frame:?})")]
    ProcessExited {
        exit_code: Option<i32>,
        last_frame: Option<u64>,
    },

    #[error("failed to spawn capture binary '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read capture output: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("failed to terminate capture process: {reason}")]
    TerminateFailed { reason: String },
}

/// Failures to turn one measurement file into a grid.
///
/// These are scoped to a single file; the pipeline skips the file and
/// moves on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no numeric rows found")]
    EmptyGrid,

    #[error("row on line {line} has {found} values, expected {expected}")]
    MalformedGrid {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("invalid value '{value}' on line {line}, column {column}")]
    InvalidValue {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("grid is {found_rows}x{found_cols} (rows x cols), file name declares {expected_rows}x{expected_cols}")]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("I/O error: {0}")]
    Read(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ParseError {
    /// Short machine-friendly name of the failure kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::EmptyGrid => "empty_grid",
            ParseError::MalformedGrid { .. } => "malformed_grid",
            ParseError::InvalidValue { .. } => "invalid_value",
            ParseError::DimensionMismatch { .. } => "dimension_mismatch",
            ParseError::Read(_) => "read",
            ParseError::Csv(_) => "csv",
        }
    }
}

/// Main error type for thermocap
#[derive(Debug)]
pub enum Error {
    // === Capture errors ===
    /// Capture supervisor failed
    Capture(CaptureError),

    // === Measurement errors ===
    /// Measurement file could not be parsed
    Parse { path: PathBuf, source: ParseError },

    /// Working directory could not be listed
    DiscoveryFailed { dir: PathBuf, reason: String },

    // === Credential errors ===
    /// Required credential variable missing from the environment
    MissingCredential { var: String },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to save configuration file
    ConfigSaveFailed { path: PathBuf, reason: String },

    /// Configuration file not found
    ConfigNotFound,

    /// Configuration validation failed
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to serialize configuration
    ConfigSerializationFailed { format: String, reason: String },

    /// Failed to parse configuration
    ConfigParseFailed { format: String, reason: String },

    // === Sink errors ===
    /// A metric or blob sink rejected an operation
    SinkFailed { sink: String, reason: String },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Capture(err) => write!(f, "Capture failed: {}", err),
            Error::Parse { path, source } => {
                write!(f, "Failed to parse '{}': {}", path.display(), source)
            }
            Error::DiscoveryFailed { dir, reason } => {
                write!(f, "Failed to list measurement files in '{}': {}", dir.display(), reason)
            }
            Error::MissingCredential { var } => {
                write!(f, "Missing required environment variable '{}'", var)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigSaveFailed { path, reason } => {
                write!(f, "Failed to save config to '{}': {}", path.display(), reason)
            }
            Error::ConfigNotFound => {
                write!(f, "Configuration file not found")
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }
            Error::ConfigSerializationFailed { format, reason } => {
                write!(f, "Failed to serialize config as {}: {}", format, reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }

            Error::SinkFailed { sink, reason } => {
                write!(f, "Sink '{}' failed: {}", sink, reason)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),

            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Capture(err) => Some(err),
            Error::Parse { source, .. } => Some(source),
            Error::Io(err) => Some(err),
            Error::Serde(err) => Some(err),
            Error::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    /// Whether the error should end the run (as opposed to skipping one file)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Parse { .. })
    }
}

impl From<CaptureError> for Error {
    fn from(err: CaptureError) -> Self {
        Error::Capture(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
