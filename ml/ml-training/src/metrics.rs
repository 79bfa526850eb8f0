//! Loss and accuracy bookkeeping for training and validation passes.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Tally of one pass over a folder, fed batch by batch.
///
/// Loss is weighted by batch size, so the mean matches a per-sample average
/// even when the last batch is short.
///
/// ```
/// use ml_training::RunningMetrics;
///
/// let mut running = RunningMetrics::new();
/// running.record(0.5, 3, 4);
/// running.record(1.0, 1, 2);
/// assert_eq!(running.samples(), 6);
/// assert!((running.accuracy() - 4.0 / 6.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMetrics {
    weighted_loss: f64,
    correct: usize,
    seen: usize,
}

impl RunningMetrics {
    /// Nothing seen yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            weighted_loss: 0.0,
            correct: 0,
            seen: 0,
        }
    }

    /// Adds one batch: its mean loss, how many it got right and its size.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, batch_loss: f32, correct: usize, batch_size: usize) {
        self.weighted_loss += f64::from(batch_loss) * batch_size as f64;
        self.correct += correct;
        self.seen += batch_size;
    }

    /// Images seen.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.seen
    }

    /// Images classified correctly.
    #[must_use]
    pub const fn correct(&self) -> usize {
        self.correct
    }

    /// Per-image loss, `NaN` for an empty pass.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn mean_loss(&self) -> f32 {
        match self.seen {
            0 => f32::NAN,
            n => (self.weighted_loss / n as f64) as f32,
        }
    }

    /// Fraction classified correctly, `0.0` for an empty pass.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f32 {
        match self.seen {
            0 => 0.0,
            n => self.correct as f32 / n as f32,
        }
    }

    /// Freezes the tally into a [`PassScore`].
    #[must_use]
    pub fn score(&self, secs: f32) -> PassScore {
        PassScore {
            loss: self.mean_loss(),
            accuracy: self.accuracy(),
            samples: self.seen,
            secs,
        }
    }
}

/// Outcome of one pass over a folder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassScore {
    /// Mean cross-entropy per image.
    pub loss: f32,
    /// Fraction of images whose top class was right.
    pub accuracy: f32,
    /// Images in the pass.
    pub samples: usize,
    /// Wall time of the pass.
    pub secs: f32,
}

/// One epoch: the training pass and, when a validation folder exists, its
/// score afterwards.
///
/// ```
/// use ml_training::{EpochMetrics, PassScore};
///
/// let train = PassScore { loss: 0.9, accuracy: 0.6, samples: 80, secs: 4.0 };
/// let val = PassScore { loss: 1.1, accuracy: 0.5, samples: 20, secs: 1.0 };
/// let epoch = EpochMetrics::new(0, 1e-3, train).with_val(val);
///
/// assert_eq!(epoch.val_accuracy(), Some(0.5));
/// assert!((epoch.secs() - 5.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Zero-based epoch.
    pub epoch: usize,
    /// Adam step size during the epoch.
    pub learning_rate: f32,
    /// Training pass, with augmentation.
    pub train: PassScore,
    /// Validation pass, if one ran.
    pub val: Option<PassScore>,
}

impl EpochMetrics {
    /// Epoch with only a training pass.
    #[must_use]
    pub const fn new(epoch: usize, learning_rate: f32, train: PassScore) -> Self {
        Self {
            epoch,
            learning_rate,
            train,
            val: None,
        }
    }

    /// Attaches the validation pass.
    #[must_use]
    pub const fn with_val(mut self, val: PassScore) -> Self {
        self.val = Some(val);
        self
    }

    /// Validation accuracy, if validated.
    #[must_use]
    pub fn val_accuracy(&self) -> Option<f32> {
        self.val.map(|v| v.accuracy)
    }

    /// Time spent on both passes.
    #[must_use]
    pub fn secs(&self) -> f32 {
        self.train.secs + self.val.map_or(0.0, |v| v.secs)
    }
}

/// Every epoch of a run plus the best validation accuracy seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Epochs in order.
    pub epochs: Vec<EpochMetrics>,
    /// Epoch with the highest validation accuracy.
    pub best_epoch: Option<usize>,
}

impl TrainingMetrics {
    /// No epochs yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an epoch, moving the best marker on strict improvement.
    pub fn add_epoch(&mut self, epoch: EpochMetrics) {
        if let Some(accuracy) = epoch.val_accuracy() {
            if self.best_val_accuracy().is_none_or(|best| accuracy > best) {
                self.best_epoch = Some(epoch.epoch);
            }
        }
        self.epochs.push(epoch);
    }

    /// Number of epochs recorded.
    #[must_use]
    pub fn epochs_completed(&self) -> usize {
        self.epochs.len()
    }

    /// Highest validation accuracy seen.
    #[must_use]
    pub fn best_val_accuracy(&self) -> Option<f32> {
        let best = self.best_epoch?;
        self.epochs
            .iter()
            .find(|e| e.epoch == best)
            .and_then(EpochMetrics::val_accuracy)
    }

    /// Training loss of the first epoch, `NaN` if none ran.
    #[must_use]
    pub fn initial_loss(&self) -> f32 {
        self.epochs.first().map_or(f32::NAN, |e| e.train.loss)
    }

    /// Training loss of the last epoch, `NaN` if none ran.
    #[must_use]
    pub fn final_loss(&self) -> f32 {
        self.epochs.last().map_or(f32::NAN, |e| e.train.loss)
    }

    /// Training accuracy of the last epoch.
    #[must_use]
    pub fn final_accuracy(&self) -> Option<f32> {
        self.epochs.last().map(|e| e.train.accuracy)
    }

    /// Validation accuracy of the last epoch.
    #[must_use]
    pub fn final_val_accuracy(&self) -> Option<f32> {
        self.epochs.last().and_then(EpochMetrics::val_accuracy)
    }

    /// Training loss per epoch.
    #[must_use]
    pub fn train_losses(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.train.loss).collect()
    }

    /// Validation accuracy per validated epoch.
    #[must_use]
    pub fn val_accuracies(&self) -> Vec<f32> {
        self.epochs.iter().filter_map(EpochMetrics::val_accuracy).collect()
    }

    /// Wall time of the whole run.
    #[must_use]
    pub fn total_secs(&self) -> f32 {
        self.epochs.iter().map(EpochMetrics::secs).sum()
    }

    /// One row per epoch followed by the best validation epoch.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "epoch   loss  accuracy  val_loss  val_accuracy");
        for e in &self.epochs {
            let _ = write!(
                out,
                "{:>5} {:>6.4} {:>9.2}",
                e.epoch + 1,
                e.train.loss,
                e.train.accuracy
            );
            let _ = match e.val {
                Some(val) => writeln!(out, " {:>9.4} {:>13.2}", val.loss, val.accuracy),
                None => writeln!(out, " {:>9} {:>13}", "-", "-"),
            };
        }
        if let (Some(epoch), Some(accuracy)) = (self.best_epoch, self.best_val_accuracy()) {
            let _ = writeln!(out, "best val_accuracy {accuracy:.2} at epoch {}", epoch + 1);
        }
        let _ = writeln!(out, "trained in {:.1}s", self.total_secs());
        out
    }
}
