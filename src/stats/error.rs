//! Statistics Error Types
//!
//! Error handling for collection, persistence and reporting of bundle statistics.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors that can occur while collecting, writing or reporting statistics
#[derive(Error, Debug)]
pub enum StatsError {
    /// A record or finalization was attempted on an already finalized bundle
    #[error("Bundle '{bundle}' has already been finalized")]
    AlreadyFinalized { bundle: String },

    /// Some bundles could not be finalized; the remaining ones were
    #[error("Failed to finalize {} bundle(s): {}", failed.len(), failed.join(", "))]
    PartialFinalization { failed: Vec<String> },

    /// Bundle identifier is empty or not safe to use as a file name
    #[error("Invalid bundle id '{id}': {reason}")]
    InvalidBundleId { id: String, reason: String },

    /// A build input document could not be understood
    #[error("Invalid input {}: {message}", path.display())]
    InvalidInput { path: PathBuf, message: String },

    /// Durable storage failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rendered report failed structural validation
    #[error("Report validation failed at line {line}: {message}")]
    Validation { line: usize, message: String },

    /// Notification queue consumer is gone
    #[error("Notification queue is closed")]
    QueueClosed,

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report template failed to compile or render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl StatsError {
    /// Create an already finalized error
    pub fn already_finalized<S: Into<String>>(bundle: S) -> Self {
        Self::AlreadyFinalized {
            bundle: bundle.into(),
        }
    }

    /// Create an invalid bundle id error
    pub fn invalid_bundle_id<S: Into<String>, R: Into<String>>(id: S, reason: R) -> Self {
        Self::InvalidBundleId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(path: &Path, message: S) -> Self {
        Self::InvalidInput {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Validation {
            line,
            message: message.into(),
        }
    }

    /// Whether the error should abort the current run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PartialFinalization { .. } | Self::InvalidInput { .. })
    }
}
