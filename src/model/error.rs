//! Error types for the readsync binary and script boundary.
//!
//! The sync core itself never surfaces errors to its callers: delivery failures
//! are retried inside the queue and malformed ids are filtered at the boundary.
//! The types here cover the outer shell, where things genuinely can go wrong.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level binary error
//!   - [`InputError`] - Script file/stdin reading failures
//!   - [`ConfigError`] - Config file loading or validation failures
//!   - [`LoggingError`] - Tracing subscriber setup failures
//! - [`ParseError`] - Per-line script failures (non-fatal, logged and skipped)
//!
//! Delivery failures live in [`crate::remote::RemoteError`].

use crate::config::ConfigError;
use crate::logging::LoggingError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error.
///
/// Every variant is fatal for the binary: it is printed to stderr and the
/// process exits non-zero. Per-line parse failures are not part of this type
/// because they never abort a run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read the event script.
    #[error("Failed to read input: {0}")]
    Input(#[from] InputError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Failed to write output.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors encountered when reading an event script from a file or stdin.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readsync::model::error::InputError;
///
/// let err = InputError::FileNotFound {
///     path: PathBuf::from("/tmp/missing.jsonl")
/// };
/// assert!(err.to_string().contains("/tmp/missing.jsonl"));
/// ```
#[derive(Debug, Error)]
pub enum InputError {
    /// The script file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// Any other I/O failure while reading the script.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors encountered when parsing one line of an event script.
///
/// Non-fatal: the line is logged with its number and skipped, and the run
/// continues with the next line.
///
/// # Examples
///
/// ```
/// use readsync::model::error::ParseError;
///
/// let err = ParseError::InvalidJson {
///     line: 42,
///     message: "expected value".to_string()
/// };
/// assert!(err.to_string().contains("line 42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line is not valid JSON, or does not match any event shape.
    #[error("Invalid JSON at line {line}: {message}")]
    InvalidJson {
        /// 1-based line number.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// The line carries a narrow whose terms describe no supported narrow.
    #[error("Invalid narrow at line {line}: {message}")]
    InvalidNarrow {
        /// 1-based line number.
        line: usize,
        /// Why the narrow was rejected.
        message: String,
    },
}

impl ParseError {
    /// Line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidJson { line, .. } | ParseError::InvalidNarrow { line, .. } => *line,
        }
    }
}
