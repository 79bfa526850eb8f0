//! Errors raised while building, saving and restoring classifiers.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in ml-models operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A configuration value is out of range.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// No checkpoint at the given path.
    #[error("no checkpoint at {}", .0.display())]
    CheckpointNotFound(PathBuf),

    /// The checkpoint extension is neither `.bin` nor `.json`.
    #[error("cannot tell the checkpoint format of {}; use .bin or .json", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A Burn recorder failed to read or write a record.
    #[error("could not {action} {}: {reason}", path.display())]
    Record {
        /// `"load"` or `"save"`.
        action: &'static str,
        /// Record file.
        path: PathBuf,
        /// Recorder message.
        reason: String,
    },

    /// An input batch has the wrong shape.
    #[error("expected input {expected}, got {actual:?}")]
    ShapeMismatch {
        /// Expected layout.
        expected: String,
        /// Dimensions received.
        actual: Vec<usize>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a missing checkpoint error.
    #[must_use]
    pub fn not_found(path: &Path) -> Self {
        Self::CheckpointNotFound(path.to_path_buf())
    }

    /// Creates an unknown format error.
    #[must_use]
    pub fn unsupported_format(path: &Path) -> Self {
        Self::UnsupportedFormat(path.to_path_buf())
    }

    /// Creates a failed load error.
    #[must_use]
    pub fn load_failed(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Record {
            action: "load",
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Creates a failed save error.
    #[must_use]
    pub fn save_failed(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Record {
            action: "save",
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: impl Into<String>, actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }
}

/// Result type for ml-models operations.
pub type Result<T> = std::result::Result<T, ModelError>;
