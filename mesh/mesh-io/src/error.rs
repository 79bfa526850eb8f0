//! Error types for mesh I/O operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while reading or writing meshes.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Invalid file content.
    #[error("invalid STL content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// Binary STL ended before all declared triangles were read.
    #[error("truncated binary STL: header declares {expected} triangles, found {got}")]
    Truncated {
        /// Triangle count from the header.
        expected: u32,
        /// Triangles actually present.
        got: u32,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Float parsing error in an ASCII STL.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}

impl IoError {
    /// Creates an `InvalidContent` error.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Maps an open/create failure, singling out missing files.
    pub(crate) fn from_open(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_content_message() {
        let err = IoError::invalid_content("facet with 2 vertices");
        assert!(err.to_string().contains("facet with 2 vertices"));
    }

    #[test]
    fn truncated_message() {
        let err = IoError::Truncated { expected: 12, got: 3 };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn from_open_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = IoError::from_open(io, std::path::Path::new("a/b.stl"));
        assert!(matches!(err, IoError::FileNotFound { .. }));
        assert!(err.to_string().contains("b.stl"));
    }

    #[test]
    fn from_open_other() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = IoError::from_open(io, std::path::Path::new("a.stl"));
        assert!(matches!(err, IoError::Io(_)));
    }
}
