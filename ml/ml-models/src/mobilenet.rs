//! MobileNetV2 feature extractor.
//!
//! Every convolution is bias-free and followed by batch normalisation, then
//! ReLU6 (or nothing, for the linear bottleneck projections). The layer
//! order matches torchvision's `mobilenet_v2`, whose `features.*` weights
//! load through [`load_torchvision`](crate::load_torchvision). The network
//! ends before pooling: the output is the last 1×1 convolution's feature map.
//!
//! Batch norm normalises with its running statistics only on a backend
//! without autodiff, so a frozen extractor should be run through
//! [`AutodiffModule::valid`](burn::module::AutodiffModule::valid).

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::prelude::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Inverted residual stages as `(expansion, channels, repeats, first_stride)`.
pub const INVERTED_RESIDUAL_SETTINGS: [(usize, usize, usize, usize); 7] = [
    (1, 16, 1, 1),
    (6, 24, 2, 2),
    (6, 32, 3, 2),
    (6, 64, 4, 2),
    (6, 96, 3, 1),
    (6, 160, 3, 2),
    (6, 320, 1, 1),
];

const STEM_CHANNELS: usize = 32;
const LAST_CHANNELS: usize = 1280;

/// Rounds `value` to a multiple of `divisor`, never dropping more than 10%.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn make_divisible(value: f32, divisor: usize) -> usize {
    let rounded = ((value + divisor as f32 / 2.0) as usize / divisor * divisor).max(divisor);
    if (rounded as f32) < 0.9 * value {
        rounded + divisor
    } else {
        rounded
    }
}

/// Shape of the extractor.
///
/// # Example
///
/// ```
/// use ml_models::MobileNetV2Config;
///
/// let config = MobileNetV2Config::default();
/// assert_eq!(config.output_channels(), 1280);
/// assert_eq!(MobileNetV2Config::new(0.35).stem_channels(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MobileNetV2Config {
    /// Channel width multiplier (α).
    pub width_multiplier: f32,
}

impl Default for MobileNetV2Config {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MobileNetV2Config {
    /// Creates a config with the given width multiplier.
    #[must_use]
    pub const fn new(width_multiplier: f32) -> Self {
        Self { width_multiplier }
    }

    /// The multiplier must be positive and finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width_multiplier.is_finite() && self.width_multiplier > 0.0
    }

    #[allow(clippy::cast_precision_loss)]
    fn scaled(&self, channels: usize) -> usize {
        make_divisible(channels as f32 * self.width_multiplier, 8)
    }

    /// Channels out of the first convolution.
    #[must_use]
    pub fn stem_channels(&self) -> usize {
        self.scaled(STEM_CHANNELS)
    }

    /// Channels of the final feature map.
    ///
    /// Stays at 1280 for multipliers up to 1.0, as in the reference network.
    #[must_use]
    pub fn output_channels(&self) -> usize {
        if self.width_multiplier > 1.0 {
            self.scaled(LAST_CHANNELS)
        } else {
            LAST_CHANNELS
        }
    }

    /// Builds the extractor with freshly initialised weights.
    #[must_use]
    pub fn init<B: Backend>(&self, device: &B::Device) -> MobileNetV2<B> {
        let mut in_channels = self.stem_channels();
        let stem = ConvNorm::new(3, in_channels, 3, 2, 1, device);

        let mut blocks = Vec::new();
        for &(expansion, channels, repeats, first_stride) in &INVERTED_RESIDUAL_SETTINGS {
            let out_channels = self.scaled(channels);
            for i in 0..repeats {
                let stride = if i == 0 { first_stride } else { 1 };
                blocks.push(InvertedResidual::new(
                    in_channels,
                    out_channels,
                    stride,
                    expansion,
                    device,
                ));
                in_channels = out_channels;
            }
        }

        let head = ConvNorm::new(in_channels, self.output_channels(), 1, 1, 1, device);
        MobileNetV2 { stem, blocks, head }
    }
}

/// Bias-free convolution and its batch norm.
#[derive(Debug, Module)]
pub struct ConvNorm<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B>,
}

impl<B: Backend> ConvNorm<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        groups: usize,
        device: &B::Device,
    ) -> Self {
        let pad = kernel / 2;
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(pad, pad))
            .with_groups(groups)
            .with_bias(false)
            .init(device);
        Self {
            conv,
            norm: BatchNormConfig::new(out_channels).init(device),
        }
    }

    /// Convolution then normalisation, no activation.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(input))
    }
}

fn relu6<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.clamp(0.0, 6.0)
}

/// Expand, depthwise filter, project; with a skip connection when the shape
/// is preserved.
#[derive(Debug, Module)]
pub struct InvertedResidual<B: Backend> {
    expand: Option<ConvNorm<B>>,
    depthwise: ConvNorm<B>,
    project: ConvNorm<B>,
}

impl<B: Backend> InvertedResidual<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        expansion: usize,
        device: &B::Device,
    ) -> Self {
        let hidden = in_channels * expansion;
        let expand = (expansion != 1).then(|| ConvNorm::new(in_channels, hidden, 1, 1, 1, device));
        Self {
            expand,
            depthwise: ConvNorm::new(hidden, hidden, 3, stride, hidden, device),
            project: ConvNorm::new(hidden, out_channels, 1, 1, 1, device),
        }
    }

    /// Runs the block on `[batch, channels, height, width]`.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match &self.expand {
            Some(expand) => relu6(expand.forward(input.clone())),
            None => input.clone(),
        };
        let x = relu6(self.depthwise.forward(x));
        let x = self.project.forward(x);
        if x.dims() == input.dims() { x + input } else { x }
    }
}

/// MobileNetV2 without its classification top.
#[derive(Debug, Module)]
pub struct MobileNetV2<B: Backend> {
    stem: ConvNorm<B>,
    blocks: Vec<InvertedResidual<B>>,
    head: ConvNorm<B>,
}

impl<B: Backend> MobileNetV2<B> {
    /// Feature map for `[batch, 3, height, width]` images.
    ///
    /// Spatial size shrinks by 32: 224 in gives 7×7 out.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = relu6(self.stem.forward(images));
        for block in &self.blocks {
            x = block.forward(x);
        }
        relu6(self.head.forward(x))
    }

    /// Feature map averaged over its spatial dimensions, `[batch, channels]`.
    pub fn forward_pooled(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.forward(images);
        let [batch, channels, _, _] = features.dims();
        features.mean_dim(3).mean_dim(2).reshape([batch, channels])
    }

    /// Number of inverted residual blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
