//! Error types for depvault
//!
//! This module provides the error taxonomy for the library:
//! - Domain-specific error types (Exchange, Dispatch, external tools)
//! - Context information (paths, worker indices, configuration keys)
//!
//! The reporting-oriented operations (retention candidates, exchange copies)
//! never panic and never lose the distinction between "no data" and
//! "failure": absence surfaces as [`Error::NotFound`], failures surface as a
//! specific variant carrying the offending path or identity.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for depvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for depvault
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "archive_root")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested FileKey/version has no matching file
    #[error("not found: {0}")]
    NotFound(String),

    /// Data exchange error (fetch, export, session copies)
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Task dispatch error
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// External tool execution failed to start (missing binary, spawn error)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Data exchange errors (archive/session/workflow copies)
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Source file does not exist or is unreadable
    #[error("missing source file: {path}")]
    MissingSource {
        /// The path that was expected to exist
        path: PathBuf,
    },

    /// Destination directory cannot be created or written
    #[error("unwritable destination {path}: {reason}")]
    UnwritableDestination {
        /// The destination directory
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// Byte copy failed partway
    #[error("copy from {from} to {to} failed: {reason}")]
    CopyFailed {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// Gzip decompression of a compressed source failed
    #[error("decompression of {path} failed: {reason}")]
    DecompressFailed {
        /// The compressed source path
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },
}

/// Task dispatcher errors, reported per chunk
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The worker function panicked while processing its chunk
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker that panicked
        worker: usize,
    },

    /// The worker exceeded the configured timeout
    #[error("worker {worker} timed out after {timeout:?}")]
    TimedOut {
        /// Index of the worker that timed out
        worker: usize,
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// The result channel closed before all workers reported
    #[error("result channel closed before all workers reported")]
    ResultChannelClosed,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn exchange_error_messages_carry_paths() {
        let err = ExchangeError::MissingSource {
            path: Path::new("/archive/D_1001/D_1001_model_P1.cif.V3").to_path_buf(),
        };
        assert!(err.to_string().contains("D_1001_model_P1.cif.V3"));

        let err = ExchangeError::CopyFailed {
            from: Path::new("/a").to_path_buf(),
            to: Path::new("/b").to_path_buf(),
            reason: "disk full".to_string(),
        };
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn exchange_error_converts_to_top_level() {
        let err: Error = ExchangeError::MissingSource {
            path: PathBuf::from("/missing"),
        }
        .into();
        assert!(matches!(err, Error::Exchange(_)));
        assert!(err.to_string().starts_with("exchange error"));
    }

    #[test]
    fn dispatch_error_reports_worker_index() {
        let err = DispatchError::WorkerPanicked { worker: 2 };
        assert_eq!(err.to_string(), "worker 2 panicked");

        let err = DispatchError::TimedOut {
            worker: 0,
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("worker 0"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
