//! Single-image prediction.

use std::path::Path;

use burn::prelude::Backend;
use ml_dataset::single_image;
use ml_models::PartClassifier;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrainingError};

/// Most likely class for one image.
///
/// # Example
///
/// ```
/// use ml_training::Prediction;
///
/// let prediction = Prediction {
///     index: 1,
///     label: "3001".to_string(),
///     confidence: 0.92,
/// };
/// assert_eq!(prediction.to_string(), "Predicted LEGO part: 3001");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class index.
    pub index: usize,
    /// Class folder name.
    pub label: String,
    /// Softmax probability of the class.
    pub confidence: f32,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Predicted LEGO part: {}", self.label)
    }
}

/// Index and value of the largest probability; the first wins a tie.
#[must_use]
pub fn top_class(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, top)) if top >= p => best,
            _ => Some((i, p)),
        })
}

/// Classifies the image at `path`.
///
/// `classes` maps output indices to labels in the order the model was
/// trained with.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or `classes` does not
/// match the model's output width.
pub fn predict_image<B: Backend>(
    model: &PartClassifier<B>,
    classes: &[String],
    path: &Path,
    input_size: u32,
    device: &B::Device,
) -> Result<Prediction> {
    if classes.len() != model.num_classes() {
        return Err(TrainingError::class_count(model.num_classes(), classes.len()));
    }

    let image = single_image::<B>(path, input_size, device)?;
    let probs: Vec<f32> = model.forward_probs(image).into_data().iter::<f32>().collect();
    let Some(((index, confidence), label)) =
        top_class(&probs).and_then(|top| Some((top, classes.get(top.0)?.clone())))
    else {
        return Err(TrainingError::class_count(probs.len(), classes.len()));
    };

    debug!(path = %path.display(), label = %label, confidence, "Predicted");
    Ok(Prediction {
        index,
        label,
        confidence,
    })
}
