//! Error types for LDraw conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that abort a conversion batch.
///
/// Per-file converter failures are not errors; they end up in the
/// [`ConversionReport`](crate::ConversionReport).
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Configuration is unusable.
    #[error("invalid conversion config: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
