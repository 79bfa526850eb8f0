//! Part classifier: frozen MobileNetV2 features and a small dense head.

use burn::module::Module;
use burn::nn;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::prelude::Backend;
use burn::tensor::activation::{relu, softmax};
use burn::tensor::{Int, Tensor};
use burn::train::ClassificationOutput;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::mobilenet::{MobileNetV2, MobileNetV2Config};

/// Configuration for the part classifier.
///
/// # Example
///
/// ```
/// use ml_models::ClassifierConfig;
///
/// let config = ClassifierConfig::new(12);
/// assert_eq!(config.hidden, 128);
/// assert_eq!(config.input_size, 224);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of part classes.
    pub num_classes: usize,

    /// Units in the hidden dense layer.
    pub hidden: usize,

    /// Square input edge in pixels.
    pub input_size: usize,

    /// Feature extractor shape.
    pub backbone: MobileNetV2Config,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ClassifierConfig {
    /// Creates a configuration for `num_classes` classes.
    #[must_use]
    pub const fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            hidden: 128,
            input_size: 224,
            backbone: MobileNetV2Config::new(1.0),
        }
    }

    /// Sets the hidden layer width.
    #[must_use]
    pub const fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Sets the input edge.
    #[must_use]
    pub const fn with_input_size(mut self, input_size: usize) -> Self {
        self.input_size = input_size;
        self
    }

    /// Sets the MobileNetV2 width multiplier.
    #[must_use]
    pub const fn with_width_multiplier(mut self, width_multiplier: f32) -> Self {
        self.backbone = MobileNetV2Config::new(width_multiplier);
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(ModelError::invalid_config("num_classes must be > 0"));
        }
        if self.hidden == 0 {
            return Err(ModelError::invalid_config("hidden must be > 0"));
        }
        if self.input_size < 32 {
            return Err(ModelError::invalid_config("input_size must be at least 32"));
        }
        if !self.backbone.is_valid() {
            return Err(ModelError::invalid_config(
                "width_multiplier must be positive",
            ));
        }
        Ok(())
    }

    /// Returns `true` if [`validate`](Self::validate) passes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Builds a classifier with random weights.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] for an invalid configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<PartClassifier<B>> {
        self.validate()?;
        let backbone = self.backbone.init(device);
        let features = self.backbone.output_channels();
        Ok(PartClassifier {
            backbone,
            hidden: nn::LinearConfig::new(features, self.hidden).init(device),
            output: nn::LinearConfig::new(self.hidden, self.num_classes).init(device),
        })
    }
}

/// Image classifier over part classes.
///
/// Architecture: MobileNetV2 -> global average pool -> Linear -> `ReLU` ->
/// Linear -> softmax.
///
/// # Example
///
/// ```ignore
/// use ml_models::ClassifierConfig;
///
/// let model = ClassifierConfig::new(2).init::<MyBackend>(&device)?.freeze_backbone();
/// let probs = model.forward_probs(images);
/// ```
#[derive(Debug, Module)]
pub struct PartClassifier<B: Backend> {
    backbone: MobileNetV2<B>,
    hidden: nn::Linear<B>,
    output: nn::Linear<B>,
}

impl<B: Backend> PartClassifier<B> {
    /// Class logits for `[batch, 3, size, size]` images.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward_head(self.backbone.forward_pooled(images))
    }

    /// Class logits for pooled extractor features, `[batch, channels]`.
    pub fn forward_head(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(features));
        self.output.forward(x)
    }

    /// Class probabilities; each row sums to one.
    pub fn forward_probs(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }

    /// Index of the most likely class per image, `[batch]`.
    pub fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 1, Int> {
        let logits = self.forward(images);
        let [batch, _] = logits.dims();
        logits.argmax(1).reshape([batch])
    }

    /// Forward pass with categorical cross-entropy against `targets`.
    pub fn forward_classification(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        self.head_classification(self.backbone.forward_pooled(images), targets)
    }

    /// Like [`forward_classification`](Self::forward_classification), from
    /// features computed elsewhere.
    pub fn head_classification(
        &self,
        features: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward_head(features);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());
        ClassificationOutput::new(loss, output, targets)
    }

    /// Stops gradient tracking on the feature extractor.
    #[must_use]
    pub fn freeze_backbone(mut self) -> Self {
        self.backbone = self.backbone.no_grad();
        self
    }

    /// Replaces the feature extractor, e.g. with pretrained weights.
    #[must_use]
    pub fn with_backbone(mut self, backbone: MobileNetV2<B>) -> Self {
        self.backbone = backbone;
        self
    }

    /// The feature extractor.
    #[must_use]
    pub fn backbone(&self) -> &MobileNetV2<B> {
        &self.backbone
    }

    /// Number of output classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.output.weight.val().dims()[1]
    }

    /// Checks that `dims` is an RGB batch of the expected edge.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] otherwise.
    pub fn check_input(dims: [usize; 4], input_size: usize) -> Result<()> {
        let [_, channels, height, width] = dims;
        if channels == 3 && height == input_size && width == input_size {
            Ok(())
        } else {
            Err(ModelError::shape_mismatch(
                format!("[batch, 3, {input_size}, {input_size}]"),
                &dims,
            ))
        }
    }
}
