//! Training configuration and profiles.

use std::path::PathBuf;

use burn::optim::AdamConfig;
use ml_dataset::{Augmentation, DEFAULT_BATCH_SIZE, DEFAULT_INPUT_SIZE};
use ml_models::ClassifierConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingError};

/// Which split the final accuracy is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSplit {
    /// The training images, without augmentation.
    Train,
    /// The held-out validation images.
    #[default]
    Val,
}

impl EvaluationSplit {
    /// Directory name under the split root.
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
        }
    }

    /// Label printed in front of the accuracy.
    #[must_use]
    pub const fn accuracy_label(&self) -> &'static str {
        match self {
            Self::Train => "Test Accuracy",
            Self::Val => "Validation Accuracy",
        }
    }
}

/// Named bundles of training defaults.
///
/// # Example
///
/// ```
/// use ml_training::{EvaluationSplit, TrainingProfile};
///
/// assert_eq!(TrainingProfile::Scanner.epochs(), 6);
/// assert_eq!(TrainingProfile::Renders.evaluation_split(), EvaluationSplit::Train);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrainingProfile {
    /// Split-then-train run over freshly split renders: 6 epochs, scored on `val`.
    #[default]
    Scanner,
    /// Longer run scored on the training images: 10 epochs, scored on `train`.
    Renders,
}

impl TrainingProfile {
    /// Default epoch count.
    #[must_use]
    pub const fn epochs(&self) -> usize {
        match self {
            Self::Scanner => 6,
            Self::Renders => 10,
        }
    }

    /// Split the final accuracy is reported on.
    #[must_use]
    pub const fn evaluation_split(&self) -> EvaluationSplit {
        match self {
            Self::Scanner => EvaluationSplit::Val,
            Self::Renders => EvaluationSplit::Train,
        }
    }

    /// Profile name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Scanner => "scanner",
            Self::Renders => "renders",
        }
    }
}

impl std::fmt::Display for TrainingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for a training run.
///
/// # Example
///
/// ```
/// use ml_training::{TrainingConfig, TrainingProfile};
///
/// let config = TrainingConfig::default();
/// assert_eq!(config.epochs, 6);
/// assert_eq!(config.batch_size, 9);
///
/// let renders = TrainingConfig::for_profile(TrainingProfile::Renders).with_epochs(3);
/// assert_eq!(renders.epochs, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Root holding `train/` and `val/`.
    pub data_dir: PathBuf,

    /// Number of training epochs.
    pub epochs: usize,

    /// Batch size.
    pub batch_size: usize,

    /// Square input edge in pixels.
    pub input_size: u32,

    /// MobileNetV2 width multiplier.
    pub width_multiplier: f32,

    /// Units in the hidden dense layer.
    pub hidden: usize,

    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,

    /// Random transforms applied to training batches.
    pub augmentation: Augmentation,

    /// Split scored after training.
    pub evaluation_split: EvaluationSplit,

    /// Whether to reshuffle the training set each epoch.
    pub shuffle: bool,

    /// Random seed for shuffling and augmentation.
    pub seed: Option<u64>,

    /// Pretrained extractor: a torchvision `.pth`/`.pt` state dict or a Burn
    /// `.bin`/`.json` record; random weights when `None`.
    pub backbone_weights: Option<PathBuf>,

    /// Where to save the trained classifier, if anywhere.
    pub checkpoint: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::for_profile(TrainingProfile::default())
    }
}

impl TrainingConfig {
    /// Creates a config with the given epochs and scanner defaults otherwise.
    #[must_use]
    pub fn new(epochs: usize) -> Self {
        Self {
            data_dir: PathBuf::from("train_val_split"),
            epochs,
            batch_size: DEFAULT_BATCH_SIZE,
            input_size: DEFAULT_INPUT_SIZE,
            width_multiplier: 1.0,
            hidden: 128,
            optimizer: OptimizerConfig::adam(1e-3),
            augmentation: Augmentation::default(),
            evaluation_split: EvaluationSplit::Val,
            shuffle: true,
            seed: None,
            backbone_weights: None,
            checkpoint: None,
        }
    }

    /// Creates a config from a profile's defaults.
    #[must_use]
    pub fn for_profile(profile: TrainingProfile) -> Self {
        Self::new(profile.epochs()).with_evaluation_split(profile.evaluation_split())
    }

    /// Sets the epoch count.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the split root.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the input edge and width multiplier, for small smoke runs.
    #[must_use]
    pub fn with_model_size(mut self, input_size: u32, width_multiplier: f32) -> Self {
        self.input_size = input_size;
        self.width_multiplier = width_multiplier;
        self
    }

    /// Sets the optimizer.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Sets the augmentation ranges.
    #[must_use]
    pub fn with_augmentation(mut self, augmentation: Augmentation) -> Self {
        self.augmentation = augmentation;
        self
    }

    /// Sets the split scored after training.
    #[must_use]
    pub fn with_evaluation_split(mut self, split: EvaluationSplit) -> Self {
        self.evaluation_split = split;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Disables shuffling.
    #[must_use]
    pub const fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Loads extractor weights from `path` before training.
    #[must_use]
    pub fn with_backbone_weights(mut self, path: impl Into<PathBuf>) -> Self {
        self.backbone_weights = Some(path.into());
        self
    }

    /// Saves the trained classifier to `path`.
    #[must_use]
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// `<data_dir>/train`.
    #[must_use]
    pub fn train_dir(&self) -> PathBuf {
        self.data_dir.join(EvaluationSplit::Train.dir_name())
    }

    /// `<data_dir>/val`.
    #[must_use]
    pub fn val_dir(&self) -> PathBuf {
        self.data_dir.join(EvaluationSplit::Val.dir_name())
    }

    /// Directory of the split scored after training.
    #[must_use]
    pub fn evaluation_dir(&self) -> PathBuf {
        self.data_dir.join(self.evaluation_split.dir_name())
    }

    /// Model shape for `num_classes` classes.
    #[must_use]
    pub fn classifier_config(&self, num_classes: usize) -> ClassifierConfig {
        ClassifierConfig::new(num_classes)
            .with_hidden(self.hidden)
            .with_input_size(self.input_size as usize)
            .with_width_multiplier(self.width_multiplier)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(TrainingError::invalid_config("epochs must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::invalid_config("batch size must be > 0"));
        }
        if !self.optimizer.is_valid() {
            return Err(TrainingError::invalid_config("optimizer settings out of range"));
        }
        if !self.augmentation.is_valid() {
            return Err(TrainingError::invalid_config("augmentation ranges out of range"));
        }
        self.classifier_config(1)
            .validate()
            .map_err(|e| TrainingError::invalid_config(e.to_string()))
    }

    /// Returns `true` if [`validate`](Self::validate) passes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Adam optimizer settings.
///
/// Defaults follow Keras: `β1 = 0.9`, `β2 = 0.999`, `ε = 1e-7`.
///
/// # Example
///
/// ```
/// use ml_training::OptimizerConfig;
///
/// let adam = OptimizerConfig::adam(1e-3);
/// assert_eq!(adam.learning_rate, 1e-3);
/// assert_eq!(adam.epsilon, 1e-7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Learning rate, constant over the run.
    pub learning_rate: f32,

    /// Beta1.
    pub beta1: f32,

    /// Beta2.
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(1e-3)
    }
}

impl OptimizerConfig {
    /// Creates an Adam optimizer config.
    #[must_use]
    pub const fn adam(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.learning_rate > 0.0
            && (0.0..1.0).contains(&self.beta1)
            && (0.0..1.0).contains(&self.beta2)
            && self.epsilon > 0.0
    }

    /// Burn optimizer config with these settings.
    #[must_use]
    pub fn to_adam(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta1)
            .with_beta_2(self.beta2)
            .with_epsilon(self.epsilon)
    }
}
