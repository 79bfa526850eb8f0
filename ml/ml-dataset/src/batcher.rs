//! Turning image items into model-ready tensor batches.

use burn::prelude::Backend;
use burn::tensor::{Int, Tensor};
use rand::Rng;

use crate::augment::Augmentation;
use crate::error::{DatasetError, Result};
use crate::folder::ImageItem;
use crate::preprocess::{DEFAULT_INPUT_SIZE, load_rgb, resize_square, to_chw};

/// Number of images per batch.
pub const DEFAULT_BATCH_SIZE: usize = 9;

/// A stack of images and their labels.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Images `[batch, 3, size, size]`, values in `[0, 1]`.
    pub images: Tensor<B, 4>,
    /// Class index per image.
    pub targets: Tensor<B, 1, Int>,
    /// Class index per image, host copy.
    pub labels: Vec<usize>,
}

/// Decodes, resizes and optionally augments images into an [`ImageBatch`].
///
/// Unlike Burn's `Batcher` trait this returns decoding failures to the caller
/// instead of substituting blank images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBatcher {
    input_size: u32,
    augmentation: Option<Augmentation>,
}

impl Default for ImageBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

impl ImageBatcher {
    /// Batcher without augmentation, for evaluation.
    #[must_use]
    pub const fn new(input_size: u32) -> Self {
        Self {
            input_size,
            augmentation: None,
        }
    }

    /// Enables random augmentation, for training.
    #[must_use]
    pub const fn with_augmentation(mut self, augmentation: Augmentation) -> Self {
        self.augmentation = Some(augmentation);
        self
    }

    /// Square edge the images are resized to.
    #[must_use]
    pub const fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Augmentation in effect, if any.
    #[must_use]
    pub const fn augmentation(&self) -> Option<Augmentation> {
        self.augmentation
    }

    /// Loads `items` into one batch.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty item list, a zero input size or any image
    /// that fails to decode.
    pub fn batch<B: Backend, R: Rng + ?Sized>(
        &self,
        items: &[ImageItem],
        rng: &mut R,
        device: &B::Device,
    ) -> Result<ImageBatch<B>> {
        if items.is_empty() {
            return Err(DatasetError::invalid_config("cannot build an empty batch"));
        }
        if self.input_size == 0 {
            return Err(DatasetError::invalid_dimensions(0, 0));
        }

        let size = self.input_size as usize;
        let mut pixels = Vec::with_capacity(items.len() * 3 * size * size);
        let mut labels = Vec::with_capacity(items.len());
        for item in items {
            let mut image = resize_square(&load_rgb(&item.path)?, self.input_size);
            if let Some(augmentation) = &self.augmentation {
                image = augmentation.augment(&image, rng);
            }
            pixels.extend(to_chw(&image));
            labels.push(item.label);
        }

        #[allow(clippy::cast_possible_wrap)]
        let targets: Vec<i64> = labels.iter().map(|&l| l as i64).collect();
        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), device).reshape([
            items.len(),
            3,
            size,
            size,
        ]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device);

        Ok(ImageBatch {
            images,
            targets,
            labels,
        })
    }
}

/// Loads a single image as a batch of one, without augmentation.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn single_image<B: Backend>(
    path: &std::path::Path,
    input_size: u32,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let size = input_size as usize;
    let pixels = crate::preprocess::load_chw(path, input_size)?;
    Ok(Tensor::<B, 1>::from_floats(pixels.as_slice(), device).reshape([1, 3, size, size]))
}
