//! End-to-end training run and reloading of its result.
//!
//! A run opens `train/` (and `val/` when present) under the split root,
//! builds the classifier, swaps in pretrained extractor weights if a record
//! is available, freezes the extractor, fits the head and scores the
//! configured split. When a checkpoint path is set the weights are saved
//! together with a manifest holding the class names and model shape, so
//! [`load_trained`] can rebuild the classifier without the image folders.
//! Without a checkpoint the model lives only in the returned
//! [`TrainingOutcome`], which can still classify images through
//! [`TrainingOutcome::predict`].

use std::path::{Path, PathBuf};

use burn::module::AutodiffModule;
use burn::prelude::Backend;
use ml_dataset::ImageFolder;
use ml_models::{
    CheckpointFormat, ClassifierConfig, InferenceBackend, PartClassifier,
    TrainingBackend, default_device, load_checkpoint, save_checkpoint,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{EvaluationSplit, TrainingConfig};
use crate::error::{Result, TrainingError};
use crate::evaluate::{EvaluationReport, evaluate};
use crate::metrics::TrainingMetrics;
use crate::predict::{Prediction, predict_image};
use crate::trainer::Trainer;

/// Extension of the manifest written next to a checkpoint.
pub const MANIFEST_EXTENSION: &str = "manifest.json";

/// Class names and model shape stored beside a checkpoint.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use ml_training::manifest_path;
///
/// assert_eq!(
///     manifest_path(Path::new("models/parts.bin")),
///     PathBuf::from("models/parts.manifest.json")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Class names in output order.
    pub classes: Vec<String>,
    /// Classifier shape the weights belong to.
    pub model: ClassifierConfig,
}

impl ModelManifest {
    /// Writes the manifest as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| TrainingError::manifest(path, e))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a manifest written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Manifest`] if the file is missing or
    /// malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| TrainingError::manifest(path, e))?;
        let manifest: Self =
            serde_json::from_str(&json).map_err(|e| TrainingError::manifest(path, e))?;
        if manifest.classes.len() != manifest.model.num_classes {
            return Err(TrainingError::manifest(
                path,
                format_args!(
                    "{} class names for a {}-class model",
                    manifest.classes.len(),
                    manifest.model.num_classes
                ),
            ));
        }
        Ok(manifest)
    }
}

/// Manifest path for a checkpoint: `parts.bin` becomes `parts.manifest.json`.
#[must_use]
pub fn manifest_path(checkpoint: &Path) -> PathBuf {
    checkpoint.with_extension(MANIFEST_EXTENSION)
}

/// Everything a training run produces.
#[derive(Debug)]
pub struct TrainingOutcome {
    /// Trained classifier, detached from autodiff.
    pub model: PartClassifier<InferenceBackend>,
    /// Class names in output order.
    pub classes: Vec<String>,
    /// Per-epoch metrics.
    pub metrics: TrainingMetrics,
    /// Score on the configured evaluation split.
    pub report: EvaluationReport,
    /// Where the weights were saved, if requested.
    pub checkpoint: Option<PathBuf>,
    /// Square input edge the model was trained at.
    pub input_size: u32,
}

impl TrainingOutcome {
    /// Classifies one image with the trained model, without saving it first.
    ///
    /// # Errors
    ///
    /// See [`predict_image`].
    pub fn predict(&self, image: &Path) -> Result<Prediction> {
        predict_image(
            &self.model,
            &self.classes,
            image,
            self.input_size,
            &default_device(),
        )
    }
}

fn load_backbone(
    model: PartClassifier<TrainingBackend>,
    config: &TrainingConfig,
    classifier: &ClassifierConfig,
    device: &<TrainingBackend as Backend>::Device,
) -> Result<PartClassifier<TrainingBackend>> {
    let Some(path) = &config.backbone_weights else {
        info!("No pretrained extractor configured; using random weights");
        return Ok(model);
    };
    if !path.is_file() {
        warn!(
            path = %path.display(),
            "Pretrained extractor weights not found; using random weights"
        );
        return Ok(model);
    }

    let backbone = ml_models::load_backbone::<TrainingBackend>(&classifier.backbone, path, device)?;
    info!(path = %path.display(), "Loaded pretrained extractor weights");
    Ok(model.with_backbone(backbone))
}

/// Trains and scores a classifier as described by `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a folder cannot be
/// read, the folders disagree on their classes, training diverges, or the
/// checkpoint cannot be written.
pub fn run_training(config: &TrainingConfig) -> Result<TrainingOutcome> {
    config.validate()?;

    let train = ImageFolder::open(config.train_dir())?;
    let val_dir = config.val_dir();
    let val = if val_dir.is_dir() {
        Some(ImageFolder::open(&val_dir)?)
    } else {
        warn!(path = %val_dir.display(), "No validation folder; skipping per-epoch validation");
        None
    };
    let classes = train.classes().to_vec();
    info!(
        classes = classes.len(),
        train = train.items().len(),
        val = val.as_ref().map(|v| v.items().len()),
        "Opened image folders"
    );

    let device = default_device();
    let classifier = config.classifier_config(classes.len());
    let model = classifier.init::<TrainingBackend>(&device)?;
    let model = load_backbone(model, config, &classifier, &device)?.freeze_backbone();

    let (model, metrics) =
        Trainer::new(config.clone()).train(model, &train, val.as_ref(), &device)?;
    let model = model.valid();

    let report = match (config.evaluation_split, &val) {
        (EvaluationSplit::Train, _) => evaluate(
            &model,
            &train,
            EvaluationSplit::Train,
            config.input_size,
            config.batch_size,
            &device,
        )?,
        (EvaluationSplit::Val, Some(val)) => evaluate(
            &model,
            val,
            EvaluationSplit::Val,
            config.input_size,
            config.batch_size,
            &device,
        )?,
        (EvaluationSplit::Val, None) => return Err(TrainingError::MissingSplit(val_dir)),
    };
    info!(
        split = config.evaluation_split.dir_name(),
        loss = report.loss,
        accuracy = report.accuracy,
        samples = report.samples,
        "Evaluation complete"
    );

    let checkpoint = match &config.checkpoint {
        Some(path) => {
            let format = CheckpointFormat::from_path(path).unwrap_or_default();
            let saved = save_checkpoint::<InferenceBackend, _>(&model, path, format)?;
            let manifest = ModelManifest {
                classes: classes.clone(),
                model: classifier,
            };
            manifest.save(&manifest_path(&saved))?;
            info!(path = %saved.display(), "Saved classifier");
            Some(saved)
        }
        None => None,
    };

    Ok(TrainingOutcome {
        model,
        classes,
        metrics,
        report,
        checkpoint,
        input_size: config.input_size,
    })
}

/// Rebuilds a classifier saved by [`run_training`].
///
/// # Errors
///
/// Returns an error if the checkpoint or its manifest is missing or does
/// not match.
pub fn load_trained(
    checkpoint: &Path,
) -> Result<(PartClassifier<InferenceBackend>, ModelManifest)> {
    let manifest = ModelManifest::load(&manifest_path(checkpoint))?;
    let device = default_device();
    let model = manifest.model.init::<InferenceBackend>(&device)?;
    let model = load_checkpoint::<InferenceBackend, _>(model, checkpoint, &device)?;
    Ok((model, manifest))
}

/// Loads a saved classifier and classifies one image with it.
///
/// # Errors
///
/// See [`load_trained`] and [`predict_image`].
pub fn predict_with_checkpoint(checkpoint: &Path, image: &Path) -> Result<Prediction> {
    let (model, manifest) = load_trained(checkpoint)?;
    let input_size = u32::try_from(manifest.model.input_size).map_err(|e| {
        TrainingError::manifest(&manifest_path(checkpoint), format_args!("input_size: {e}"))
    })?;
    predict_image(
        &model,
        &manifest.classes,
        image,
        input_size,
        &default_device(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn manifest_path_replaces_extension() {
        assert_eq!(
            manifest_path(Path::new("out/model.json")),
            PathBuf::from("out/model.manifest.json")
        );
        assert_eq!(
            manifest_path(Path::new("model")),
            PathBuf::from("model.manifest.json")
        );
    }

    #[test]
    fn manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.manifest.json");
        let manifest = ModelManifest {
            classes: vec!["3001".to_string(), "3020".to_string()],
            model: ClassifierConfig::new(2).with_input_size(64),
        };

        manifest.save(&path).unwrap();
        assert_eq!(ModelManifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn manifest_rejects_class_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.manifest.json");
        let manifest = ModelManifest {
            classes: vec!["3001".to_string()],
            model: ClassifierConfig::new(2),
        };
        manifest.save(&path).unwrap();

        let err = ModelManifest::load(&path).unwrap_err();
        assert!(matches!(err, TrainingError::Manifest { .. }));
    }

    #[test]
    fn missing_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_trained(&dir.path().join("none.bin")).unwrap_err();
        assert!(matches!(err, TrainingError::Manifest { .. }));
    }

    #[test]
    fn missing_train_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig::new(1).with_data_dir(dir.path());
        assert!(matches!(
            run_training(&config),
            Err(TrainingError::Dataset(_))
        ));
    }
}
