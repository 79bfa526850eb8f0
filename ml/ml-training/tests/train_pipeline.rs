//! Runs the whole train, score, save and predict cycle on a tiny image tree.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use burn::tensor::Tensor;
use image::{Rgb, RgbImage};
use ml_models::{
    CheckpointFormat, InferenceBackend, MobileNetV2, MobileNetV2Config, ModelError,
    default_device, save_checkpoint,
};
use ml_training::{
    EvaluationSplit, TrainingConfig, TrainingError, TrainingProfile, load_trained, manifest_path,
    predict_with_checkpoint, run_training,
};

fn write_class(dir: &Path, class: &str, colour: [u8; 3], count: usize) {
    let class_dir = dir.join(class);
    std::fs::create_dir_all(&class_dir).unwrap();
    for i in 0..count {
        let shade = u8::try_from(i * 10).unwrap();
        let image = RgbImage::from_fn(40, 40, |x, y| {
            if (x + y) % 7 == 0 {
                Rgb([shade, shade, shade])
            } else {
                Rgb(colour)
            }
        });
        image.save(class_dir.join(format!("{class}_view_{i}.png"))).unwrap();
    }
}

fn small_config(root: &Path, epochs: usize) -> TrainingConfig {
    TrainingConfig::new(epochs)
        .with_data_dir(root)
        .with_batch_size(4)
        .with_model_size(32, 0.35)
        .with_seed(7)
}

#[test]
fn trains_scores_saves_and_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("train_val_split");
    write_class(&root.join("train"), "brick", [200, 40, 40], 6);
    write_class(&root.join("train"), "plate", [40, 40, 200], 6);
    write_class(&root.join("val"), "brick", [200, 40, 40], 2);
    write_class(&root.join("val"), "plate", [40, 40, 200], 2);

    let checkpoint = dir.path().join("models/parts.bin");
    let config = small_config(&root, 1).with_checkpoint(&checkpoint);
    let outcome = run_training(&config).unwrap();

    assert_eq!(outcome.classes, vec!["brick".to_string(), "plate".to_string()]);
    assert_eq!(outcome.metrics.epochs_completed(), 1);
    assert!(outcome.metrics.final_loss().is_finite());
    assert!(outcome.metrics.final_val_accuracy().is_some());

    assert_eq!(outcome.report.split, EvaluationSplit::Val);
    assert_eq!(outcome.report.samples, 4);
    assert!((0.0..=1.0).contains(&outcome.report.accuracy));
    let line = outcome.report.to_string();
    let value = line.strip_prefix("Validation Accuracy: ").unwrap();
    assert_eq!(value.split('.').nth(1).map(str::len), Some(2));

    let saved = outcome.checkpoint.unwrap();
    assert_eq!(saved, checkpoint);
    assert!(saved.is_file());
    assert!(manifest_path(&saved).is_file());

    let (model, manifest) = load_trained(&saved).unwrap();
    assert_eq!(model.num_classes(), 2);
    assert_eq!(manifest.classes, outcome.classes);

    let image = root.join("val/plate/plate_view_0.png");
    let prediction = predict_with_checkpoint(&saved, &image).unwrap();
    assert!(outcome.classes.contains(&prediction.label));
    assert!(prediction.to_string().starts_with("Predicted LEGO part: "));
}

#[test]
fn renders_profile_scores_the_training_images() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("split");
    write_class(&root.join("train"), "3001", [180, 180, 30], 3);
    write_class(&root.join("train"), "3020", [30, 180, 180], 3);

    let config = TrainingConfig::for_profile(TrainingProfile::Renders)
        .with_epochs(1)
        .with_data_dir(&root)
        .with_batch_size(4)
        .with_model_size(32, 0.35)
        .with_seed(1);
    let outcome = run_training(&config).unwrap();

    assert_eq!(outcome.report.split, EvaluationSplit::Train);
    assert_eq!(outcome.report.samples, 6);
    assert!(outcome.report.to_string().starts_with("Test Accuracy: "));
    assert!(outcome.checkpoint.is_none());
    assert!(outcome.metrics.final_val_accuracy().is_none());

    let prediction = outcome
        .predict(&root.join("train/3020/3020_view_1.png"))
        .unwrap();
    assert!(["3001", "3020"].contains(&prediction.label.as_str()));
    assert_eq!(outcome.classes[prediction.index], prediction.label);
}

#[test]
fn unsaved_model_reports_a_missing_image() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("split");
    write_class(&root.join("train"), "brick", [200, 40, 40], 2);
    write_class(&root.join("train"), "plate", [40, 40, 200], 2);

    let config = small_config(&root, 1).with_evaluation_split(EvaluationSplit::Train);
    let outcome = run_training(&config).unwrap();
    let err = outcome.predict(&dir.path().join("test_brick.png")).unwrap_err();
    assert!(matches!(err, TrainingError::Dataset(_)));
}

#[test]
fn pretrained_extractor_is_loaded_and_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("split");
    write_class(&root.join("train"), "brick", [200, 40, 40], 3);
    write_class(&root.join("train"), "plate", [40, 40, 200], 3);

    let device = default_device();
    let extractor: MobileNetV2<InferenceBackend> = MobileNetV2Config::new(0.35).init(&device);
    let weights = save_checkpoint::<InferenceBackend, _>(
        &extractor,
        &dir.path().join("extractor.bin"),
        CheckpointFormat::Binary,
    )
    .unwrap();

    let config = small_config(&root, 2)
        .with_evaluation_split(EvaluationSplit::Train)
        .with_backbone_weights(&weights);
    let outcome = run_training(&config).unwrap();

    let images = Tensor::<InferenceBackend, 4>::ones([1, 3, 32, 32], &device);
    let expected: Vec<f32> = extractor
        .forward_pooled(images.clone())
        .into_data()
        .iter::<f32>()
        .collect();
    let trained: Vec<f32> = outcome
        .model
        .backbone()
        .forward_pooled(images)
        .into_data()
        .iter::<f32>()
        .collect();
    assert!(expected.iter().zip(&trained).all(|(a, b)| (a - b).abs() <= 1e-5 * a.abs().max(1.0)));
}

#[test]
fn torchvision_weights_need_the_full_width_extractor() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("split");
    write_class(&root.join("train"), "brick", [200, 40, 40], 2);
    write_class(&root.join("train"), "plate", [40, 40, 200], 2);
    let weights = dir.path().join("mobilenet_v2.pth");
    std::fs::write(&weights, b"PK").unwrap();

    let config = small_config(&root, 1)
        .with_evaluation_split(EvaluationSplit::Train)
        .with_backbone_weights(&weights);
    let err = run_training(&config).unwrap_err();
    assert!(matches!(err, TrainingError::Model(ModelError::InvalidConfig(_))));
}

#[test]
fn val_classes_must_match_train() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("split");
    write_class(&root.join("train"), "brick", [200, 40, 40], 2);
    write_class(&root.join("train"), "plate", [40, 40, 200], 2);
    write_class(&root.join("val"), "brick", [200, 40, 40], 1);
    write_class(&root.join("val"), "tile", [40, 200, 40], 1);

    let err = run_training(&small_config(&root, 1)).unwrap_err();
    assert!(matches!(err, TrainingError::ClassMismatch { .. }));
}

#[test]
fn scanner_profile_needs_a_val_folder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("split");
    write_class(&root.join("train"), "brick", [200, 40, 40], 2);
    write_class(&root.join("train"), "plate", [40, 40, 200], 2);

    let err = run_training(&small_config(&root, 1)).unwrap_err();
    assert!(matches!(err, TrainingError::MissingSplit(dir) if dir == root.join("val")));
}
