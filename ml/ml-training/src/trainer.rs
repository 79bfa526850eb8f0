//! Training loop implementation.

use std::time::Instant;

use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::{ElementConversion, Tensor};
use burn::tensor::backend::AutodiffBackend;
use ml_dataset::{ImageBatcher, ImageFolder, ImageItem};
use ml_models::PartClassifier;
use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::error::{Result, TrainingError};
use crate::evaluate::{count_correct, evaluate_folder};
use crate::metrics::{EpochMetrics, RunningMetrics, TrainingMetrics};

/// State of a training run.
///
/// # Example
///
/// ```
/// use ml_training::TrainingState;
///
/// let state = TrainingState::new(3);
/// assert_eq!(state.epoch, 0);
/// assert!(!state.is_finished());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Current epoch (0-indexed).
    pub epoch: usize,

    /// Current batch within epoch.
    pub batch: usize,

    /// Total epochs to run.
    pub total_epochs: usize,

    /// Accumulated metrics.
    pub metrics: TrainingMetrics,
}

impl TrainingState {
    /// Creates a state for a run of `total_epochs`.
    #[must_use]
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            batch: 0,
            total_epochs,
            metrics: TrainingMetrics::new(),
        }
    }

    /// Returns true once every epoch has run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.epoch >= self.total_epochs
    }

    /// Returns the progress as a fraction [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.total_epochs == 0 {
            0.0
        } else {
            self.epoch.min(self.total_epochs) as f32 / self.total_epochs as f32
        }
    }

    /// Records a finished epoch and advances to the next.
    pub fn finish_epoch(&mut self, metrics: EpochMetrics) {
        self.metrics.add_epoch(metrics);
        self.epoch += 1;
        self.batch = 0;
    }

    /// Advances to the next batch.
    pub const fn next_batch(&mut self) {
        self.batch += 1;
    }
}

/// Runs the fit loop for a [`PartClassifier`].
///
/// Each epoch reshuffles the training images (unless shuffling is off),
/// streams them through an augmenting [`ImageBatcher`], and takes one Adam
/// step per batch. When a validation folder is given it is scored after every
/// epoch without augmentation.
///
/// # Example
///
/// ```
/// use ml_training::{Trainer, TrainingConfig};
///
/// let trainer = Trainer::new(TrainingConfig::new(10).with_batch_size(4));
///
/// assert_eq!(trainer.config().epochs, 10);
/// assert_eq!(trainer.num_batches(10), 3);
/// assert_eq!(trainer.batch_indices(2, 10), (8, 10));
/// ```
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl Trainer {
    /// Creates a new trainer with the given config.
    #[must_use]
    pub const fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Returns the training configuration.
    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Creates initial training state.
    #[must_use]
    pub fn initial_state(&self) -> TrainingState {
        TrainingState::new(self.config.epochs)
    }

    /// Computes the number of batches for a dataset size.
    #[must_use]
    pub const fn num_batches(&self, dataset_size: usize) -> usize {
        if self.config.batch_size == 0 {
            0
        } else {
            dataset_size.div_ceil(self.config.batch_size)
        }
    }

    /// Gets batch indices for a given batch number.
    ///
    /// Returns (start, end) indices into the epoch order.
    #[must_use]
    pub fn batch_indices(&self, batch: usize, dataset_size: usize) -> (usize, usize) {
        let start = (batch * self.config.batch_size).min(dataset_size);
        let end = ((batch + 1) * self.config.batch_size).min(dataset_size);
        (start, end)
    }

    /// Order in which the dataset is visited for one epoch.
    #[must_use]
    pub fn epoch_order<R: Rng + ?Sized>(&self, dataset_size: usize, rng: &mut R) -> Vec<usize> {
        let mut order: Vec<usize> = (0..dataset_size).collect();
        if self.config.shuffle {
            order.shuffle(rng);
        }
        order
    }

    /// Trains `model` on `train`, scoring `val` after each epoch if given.
    ///
    /// The model is returned together with per-epoch metrics. Only the dense
    /// head trains: the feature extractor runs on the inner backend, so its
    /// batch norms use their running statistics and nothing is tracked.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the folders disagree
    /// on their classes, an image fails to load, or the loss stops being
    /// finite.
    pub fn train<B: AutodiffBackend>(
        &self,
        mut model: PartClassifier<B>,
        train: &ImageFolder,
        val: Option<&ImageFolder>,
        device: &B::Device,
    ) -> Result<(PartClassifier<B>, TrainingMetrics)> {
        self.config.validate()?;
        if model.num_classes() != train.num_classes() {
            return Err(TrainingError::class_count(
                model.num_classes(),
                train.num_classes(),
            ));
        }
        if let Some(val) = val {
            if val.classes() != train.classes() {
                return Err(TrainingError::class_mismatch(train.classes(), val.classes()));
            }
        }

        let config = &self.config;
        let batcher = ImageBatcher::new(config.input_size).with_augmentation(config.augmentation);
        let mut optim = config.optimizer.to_adam().init::<B, PartClassifier<B>>();
        let mut rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let mut state = self.initial_state();
        let learning_rate = config.optimizer.learning_rate;
        let extractor = model.backbone().valid();

        info!(
            epochs = config.epochs,
            batch_size = config.batch_size,
            train_samples = train.len(),
            val_samples = val.map(|v| v.len()),
            classes = train.num_classes(),
            "Starting training"
        );

        while !state.is_finished() {
            let started = Instant::now();
            let order = self.epoch_order(train.len(), &mut rng);
            let mut running = RunningMetrics::new();

            for indices in order.chunks(config.batch_size) {
                let items: Vec<ImageItem> =
                    indices.iter().filter_map(|&i| train.get(i)).collect();
                let batch = batcher.batch::<B, _>(&items, &mut rng, device)?;
                let features = extractor.forward_pooled(batch.images.inner());
                let output = model.head_classification(Tensor::from_inner(features), batch.targets);

                let loss = output.loss.clone().into_scalar().elem::<f32>();
                if !loss.is_finite() {
                    return Err(TrainingError::Diverged {
                        epoch: state.epoch + 1,
                        batch: state.batch,
                        loss,
                    });
                }
                running.record(loss, count_correct(output.output, &batch.labels), items.len());

                let grads = GradientsParams::from_grads(output.loss.backward(), &model);
                model = optim.step(f64::from(learning_rate), model, grads);

                debug!(epoch = state.epoch + 1, batch = state.batch, loss, "Batch done");
                state.next_batch();
            }

            let mut metrics = EpochMetrics::new(
                state.epoch,
                learning_rate,
                running.score(started.elapsed().as_secs_f32()),
            );
            if let Some(val) = val {
                let started = Instant::now();
                let scored = evaluate_folder(
                    &model.valid(),
                    val,
                    config.input_size,
                    config.batch_size,
                    device,
                )?;
                metrics = metrics.with_val(scored.score(started.elapsed().as_secs_f32()));
            }

            info!(
                epoch = state.epoch + 1,
                epochs = config.epochs,
                loss = metrics.train.loss,
                accuracy = metrics.train.accuracy,
                val_loss = metrics.val.map(|v| v.loss),
                val_accuracy = metrics.val_accuracy(),
                secs = metrics.secs(),
                "Epoch complete"
            );
            state.finish_epoch(metrics);
        }

        Ok((model, state.metrics))
    }
}
