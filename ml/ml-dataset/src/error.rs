//! Failures while splitting class folders or turning images into tensors.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the splitter, folder scanning and batching.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Train fraction outside the open unit interval.
    #[error("train fraction {0} must lie strictly between 0 and 1")]
    InvalidSplitRatio(f64),

    /// A dataset root has no class subdirectories.
    #[error("no class directories found under {}", root.display())]
    NoClasses {
        /// Directory that was scanned.
        root: PathBuf,
    },

    /// Class directories exist but hold no images.
    #[error("no images found under {}", root.display())]
    NoSamples {
        /// Directory that was scanned.
        root: PathBuf,
    },

    /// An image could not be decoded.
    #[error("failed to load image {}: {source}", path.display())]
    Image {
        /// Offending file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// A resize target with a zero side.
    #[error("cannot resize to {width}x{height}")]
    InvalidDimensions {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// A splitter or batcher setting is unusable.
    #[error("invalid dataset settings: {0}")]
    InvalidConfig(String),

    /// Reading or copying files failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// Ratio outside `(0, 1)`.
    #[must_use]
    pub const fn invalid_split_ratio(ratio: f64) -> Self {
        Self::InvalidSplitRatio(ratio)
    }

    /// `root` has no class folders.
    #[must_use]
    pub fn no_classes(root: &Path) -> Self {
        Self::NoClasses {
            root: root.to_path_buf(),
        }
    }

    /// `root` has class folders but no images.
    #[must_use]
    pub fn no_samples(root: &Path) -> Self {
        Self::NoSamples {
            root: root.to_path_buf(),
        }
    }

    /// `path` could not be decoded.
    #[must_use]
    pub fn image(path: &Path, source: image::ImageError) -> Self {
        Self::Image {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Zero-sided resize target.
    #[must_use]
    pub const fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }

    /// Unusable setting.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_message_shows_the_value() {
        assert_eq!(
            DatasetError::invalid_split_ratio(1.5).to_string(),
            "train fraction 1.5 must lie strictly between 0 and 1"
        );
    }

    #[test]
    fn folder_errors_name_the_root() {
        let err = DatasetError::no_classes(Path::new("train_val_split/train"));
        assert!(err.to_string().ends_with("train_val_split/train"));
        let err = DatasetError::no_samples(Path::new("renders"));
        assert_eq!(err.to_string(), "no images found under renders");
    }

    #[test]
    fn zero_sized_resize() {
        assert_eq!(
            DatasetError::invalid_dimensions(0, 480).to_string(),
            "cannot resize to 0x480"
        );
    }

    #[test]
    fn copy_failures_are_io_errors() {
        let err: DatasetError =
            std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left").into();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
