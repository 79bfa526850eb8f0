//! Burn model architectures and checkpoint persistence for BrickScan.
//!
//! # Model Architectures
//!
//! - [`MobileNetV2`] - Convolutional feature extractor with batch norm, torchvision layout
//! - [`PartClassifier`] - Frozen extractor, global average pool and a dense head
//!
//! # Checkpoint Persistence
//!
//! Models save and load their weights through Burn's recorders:
//! - Binary format (`.bin`, compact)
//! - JSON format (`.json`, inspectable)
//!
//! Pretrained extractor weights come either from such a record or from a
//! torchvision `mobilenet_v2` state dict ([`load_backbone`] picks by
//! extension), and are swapped in with [`PartClassifier::with_backbone`].
//!
//! # Example
//!
//! ```ignore
//! use ml_models::{ClassifierConfig, InferenceBackend, default_device};
//!
//! let device = default_device();
//! let model = ClassifierConfig::new(4).init::<InferenceBackend>(&device)?;
//! let probs = model.forward_probs(images);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod backend;
mod checkpoint;
mod classifier;
mod error;
mod mobilenet;
mod pretrained;

// Re-export model types
pub use classifier::{ClassifierConfig, PartClassifier};
pub use mobilenet::{
    ConvNorm, INVERTED_RESIDUAL_SETTINGS, InvertedResidual, MobileNetV2, MobileNetV2Config,
    make_divisible,
};

// Re-export checkpoint utilities
pub use checkpoint::{CheckpointFormat, load_checkpoint, save_checkpoint};
pub use pretrained::{load_backbone, load_torchvision, torchvision_key_remap};

// Re-export backend utilities
pub use backend::{InferenceBackend, TrainingBackend, default_device};

// Re-export error types
pub use error::{ModelError, Result};
