//! Error types for scene rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that abort a render batch.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Configuration is unusable.
    #[error("invalid render config: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// The whitelist file could not be read.
    #[error("cannot read whitelist {path}: {source}")]
    Whitelist {
        /// Whitelist path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A mesh could not be loaded.
    #[error("cannot load mesh {path}: {source}")]
    Mesh {
        /// STL path.
        path: PathBuf,
        /// Underlying mesh I/O error.
        source: mesh_io::IoError,
    },

    /// A rendered image could not be written.
    #[error("cannot write image {path}: {source}")]
    Image {
        /// Target path.
        path: PathBuf,
        /// Underlying image error.
        source: image::ImageError,
    },

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_display() {
        let err = RenderError::invalid_config("zero width");
        assert_eq!(err.to_string(), "invalid render config: zero width");
    }

    #[test]
    fn mesh_error_names_path() {
        let err = RenderError::Mesh {
            path: PathBuf::from("stl/3001.stl"),
            source: mesh_io::IoError::invalid_content("facet with 2 vertices"),
        };
        let msg = err.to_string();
        assert!(msg.contains("3001.stl"));
        assert!(msg.contains("facet with 2 vertices"));
    }
}
