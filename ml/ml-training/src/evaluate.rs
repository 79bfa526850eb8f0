//! Scoring a classifier on an image folder.

use burn::prelude::Backend;
use burn::tensor::{ElementConversion, Tensor};
use ml_dataset::{ImageBatcher, ImageFolder};
use ml_models::PartClassifier;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EvaluationSplit;
use crate::error::{Result, TrainingError};
use crate::metrics::RunningMetrics;

/// Final score on one split.
///
/// Displays as the accuracy line printed after training.
///
/// # Example
///
/// ```
/// use ml_training::{EvaluationReport, EvaluationSplit};
///
/// let report = EvaluationReport {
///     split: EvaluationSplit::Val,
///     loss: 0.41,
///     accuracy: 0.8333,
///     samples: 12,
/// };
/// assert_eq!(report.to_string(), "Validation Accuracy: 0.83");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Split that was scored.
    pub split: EvaluationSplit,
    /// Mean categorical cross-entropy.
    pub loss: f32,
    /// Fraction of correctly classified images.
    pub accuracy: f32,
    /// Number of images scored.
    pub samples: usize,
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_accuracy(self.split.accuracy_label(), self.accuracy))
    }
}

/// Formats an accuracy with two decimals after `label`.
#[must_use]
pub fn format_accuracy(label: &str, accuracy: f32) -> String {
    format!("{label}: {accuracy:.2}")
}

/// Number of rows in `logits` whose arg-max equals the matching label.
pub(crate) fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: &[usize]) -> usize {
    logits
        .argmax(1)
        .into_data()
        .iter::<i64>()
        .zip(labels)
        .filter(|&(predicted, &label)| usize::try_from(predicted).ok() == Some(label))
        .count()
}

/// Runs `model` over every image in `folder`, without augmentation.
///
/// # Errors
///
/// Returns an error for a zero batch size, for a folder whose class count
/// differs from the model's, or for an image that fails to load.
pub fn evaluate_folder<B: Backend>(
    model: &PartClassifier<B>,
    folder: &ImageFolder,
    input_size: u32,
    batch_size: usize,
    device: &B::Device,
) -> Result<RunningMetrics> {
    if batch_size == 0 {
        return Err(TrainingError::invalid_config("batch size must be > 0"));
    }
    if folder.num_classes() != model.num_classes() {
        return Err(TrainingError::class_count(
            model.num_classes(),
            folder.num_classes(),
        ));
    }

    let batcher = ImageBatcher::new(input_size);
    // Only consumed by augmentation, which evaluation never applies.
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let mut running = RunningMetrics::new();

    for chunk in folder.items().chunks(batch_size) {
        let batch = batcher.batch::<B, _>(chunk, &mut rng, device)?;
        let output = model.forward_classification(batch.images, batch.targets);
        let loss = output.loss.into_scalar().elem::<f32>();
        let correct = count_correct(output.output, &batch.labels);
        running.record(loss, correct, chunk.len());
    }

    debug!(
        root = %folder.root().display(),
        samples = running.samples(),
        accuracy = running.accuracy(),
        "Evaluated folder"
    );
    Ok(running)
}

/// Scores `model` on `folder` and labels the result with `split`.
///
/// # Errors
///
/// See [`evaluate_folder`].
pub fn evaluate<B: Backend>(
    model: &PartClassifier<B>,
    folder: &ImageFolder,
    split: EvaluationSplit,
    input_size: u32,
    batch_size: usize,
    device: &B::Device,
) -> Result<EvaluationReport> {
    let running = evaluate_folder(model, folder, input_size, batch_size, device)?;
    Ok(EvaluationReport {
        split,
        loss: running.mean_loss(),
        accuracy: running.accuracy(),
        samples: running.samples(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn accuracy_line_has_two_decimals() {
        assert_eq!(format_accuracy("Test Accuracy", 1.0), "Test Accuracy: 1.00");
        assert_eq!(format_accuracy("Validation Accuracy", 0.5), "Validation Accuracy: 0.50");
        assert_eq!(format_accuracy("Validation Accuracy", 0.666), "Validation Accuracy: 0.67");
    }

    #[test]
    fn report_display_uses_split_label() {
        let report = EvaluationReport {
            split: EvaluationSplit::Train,
            loss: 0.1,
            accuracy: 0.25,
            samples: 4,
        };
        assert_eq!(report.to_string(), "Test Accuracy: 0.25");
    }

    #[test]
    fn count_correct_compares_argmax() {
        let device = <TestBackend as Backend>::Device::default();
        let logits = Tensor::<TestBackend, 1>::from_floats(
            [0.9, 0.1, 0.2, 0.8, 0.6, 0.4].as_slice(),
            &device,
        )
        .reshape([3, 2]);
        assert_eq!(count_correct(logits.clone(), &[0, 1, 1]), 2);
        assert_eq!(count_correct(logits, &[0, 1, 0]), 3);
    }
}
