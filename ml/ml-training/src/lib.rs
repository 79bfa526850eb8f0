//! Training, evaluation and prediction for the BrickScan part classifier.
//!
//! # Training Components
//!
//! - [`TrainingConfig`] - Configuration for training runs, with [`TrainingProfile`] presets
//! - [`Trainer`] - Adam fit loop over an [`ml_dataset::ImageFolder`]
//! - [`TrainingMetrics`] - Loss and accuracy collected per epoch
//!
//! # Scoring
//!
//! - [`evaluate`] - Accuracy on a folder, without augmentation
//! - [`predict_image`] - Most likely class for one image
//!
//! # Pipeline
//!
//! - [`run_training`] - Open folders, train, score and optionally save
//! - [`load_trained`] - Rebuild a saved classifier from its checkpoint and manifest
//!
//! # Example
//!
//! ```ignore
//! use ml_training::{TrainingConfig, TrainingProfile, run_training};
//!
//! let config = TrainingConfig::for_profile(TrainingProfile::Scanner)
//!     .with_checkpoint("models/parts.bin");
//! let outcome = run_training(&config)?;
//! println!("{}", outcome.report);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod evaluate;
mod metrics;
mod pipeline;
mod predict;
mod trainer;

// Re-export configuration
pub use config::{EvaluationSplit, OptimizerConfig, TrainingConfig, TrainingProfile};

// Re-export metrics
pub use metrics::{EpochMetrics, PassScore, RunningMetrics, TrainingMetrics};

// Re-export trainer
pub use trainer::{Trainer, TrainingState};

// Re-export scoring
pub use evaluate::{EvaluationReport, evaluate, evaluate_folder, format_accuracy};
pub use predict::{Prediction, predict_image, top_class};

// Re-export pipeline
pub use pipeline::{
    MANIFEST_EXTENSION, ModelManifest, TrainingOutcome, load_trained, manifest_path,
    predict_with_checkpoint, run_training,
};

// Re-export error types
pub use error::{Result, TrainingError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        EpochMetrics, EvaluationReport, EvaluationSplit, OptimizerConfig, Prediction, Trainer,
        TrainingConfig, TrainingError, TrainingMetrics, TrainingProfile, TrainingState,
        run_training,
    };
}
