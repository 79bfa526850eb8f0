//! Failures of a training run, an evaluation or a prediction.

use std::path::{Path, PathBuf};

use ml_dataset::DatasetError;
use ml_models::ModelError;
use thiserror::Error;

/// Errors that can occur while training, evaluating or predicting.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// A training setting is out of range.
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    /// Image folders could not be read.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The classifier could not be built, saved or restored.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Output layer and class list differ in size.
    #[error("model predicts {outputs} classes but {classes} were given")]
    ClassCount {
        /// Width of the output layer.
        outputs: usize,
        /// Number of class names or folders.
        classes: usize,
    },

    /// `train/` and `val/` hold different class folders.
    #[error("validation classes {found:?} differ from training classes {expected:?}")]
    ClassMismatch {
        /// Classes of the training folder.
        expected: Vec<String>,
        /// Classes of the validation folder.
        found: Vec<String>,
    },

    /// The split chosen for scoring does not exist.
    #[error("cannot score {}: directory does not exist", .0.display())]
    MissingSplit(PathBuf),

    /// A checkpoint manifest is missing or unreadable.
    #[error("bad manifest {}: {reason}", path.display())]
    Manifest {
        /// Manifest file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Loss became NaN or infinite.
    #[error("loss diverged to {loss} at epoch {epoch}, batch {batch}")]
    Diverged {
        /// One-based epoch.
        epoch: usize,
        /// Batch within the epoch.
        batch: usize,
        /// Offending value.
        loss: f32,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrainingError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a class count error.
    #[must_use]
    pub const fn class_count(outputs: usize, classes: usize) -> Self {
        Self::ClassCount { outputs, classes }
    }

    /// Creates a class mismatch error.
    #[must_use]
    pub fn class_mismatch(expected: &[String], found: &[String]) -> Self {
        Self::ClassMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }

    /// Creates a manifest error.
    #[must_use]
    pub fn manifest(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Manifest {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_mismatch_lists_both_sides() {
        let err = TrainingError::class_mismatch(
            &["3001".to_string(), "3020".to_string()],
            &["3001".to_string()],
        );
        assert_eq!(
            err.to_string(),
            r#"validation classes ["3001"] differ from training classes ["3001", "3020"]"#
        );
    }

    #[test]
    fn diverged_names_the_batch() {
        let err = TrainingError::Diverged {
            epoch: 2,
            batch: 5,
            loss: f32::NAN,
        };
        assert_eq!(err.to_string(), "loss diverged to NaN at epoch 2, batch 5");
    }

    #[test]
    fn stage_errors_pass_through() {
        let err: TrainingError = DatasetError::invalid_split_ratio(1.5).into();
        assert!(matches!(err, TrainingError::Dataset(_)));
        assert_eq!(
            err.to_string(),
            DatasetError::invalid_split_ratio(1.5).to_string()
        );

        let err: TrainingError = ModelError::invalid_config("hidden must be > 0").into();
        assert!(matches!(err, TrainingError::Model(_)));
        assert!(err.to_string().contains("hidden"));
    }

    #[test]
    fn manifest_error_names_the_file() {
        let err = TrainingError::manifest(Path::new("models/parts.manifest.json"), "missing field `classes`");
        assert!(err.to_string().starts_with("bad manifest models/parts.manifest.json"));
    }
}
