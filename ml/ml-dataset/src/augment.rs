//! Random geometric augmentation of training images.
//!
//! Each output pixel is mapped back into the source through the inverse of a
//! rotation and per-axis zoom about the image centre, then sampled with
//! nearest-neighbour lookup. Coordinates that fall outside the source are
//! clamped to the nearest edge pixel.

use image::RgbImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Augmentation ranges applied to training batches.
///
/// # Example
///
/// ```
/// use ml_dataset::Augmentation;
///
/// let aug = Augmentation::default();
/// assert!((aug.rotation_range - 30.0).abs() < 1e-6);
/// assert!(aug.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Augmentation {
    /// Maximum absolute rotation in degrees.
    pub rotation_range: f32,
    /// Zoom factors are drawn from `[1 - zoom_range, 1 + zoom_range]`, per axis.
    pub zoom_range: f32,
    /// Mirror left-right with probability one half.
    pub horizontal_flip: bool,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            rotation_range: 30.0,
            zoom_range: 0.2,
            horizontal_flip: true,
        }
    }
}

impl Augmentation {
    /// No-op augmentation.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            rotation_range: 0.0,
            zoom_range: 0.0,
            horizontal_flip: false,
        }
    }

    /// Ranges must be finite and zoom must stay positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.rotation_range.is_finite()
            && self.rotation_range >= 0.0
            && self.zoom_range.is_finite()
            && (0.0..1.0).contains(&self.zoom_range)
    }

    /// Draws one set of transform parameters.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Transform {
        let rotation = self.rotation_range.abs();
        let zoom = self.zoom_range.abs();
        Transform {
            angle_deg: rng.gen_range(-rotation..=rotation),
            zoom_x: rng.gen_range(1.0 - zoom..=1.0 + zoom),
            zoom_y: rng.gen_range(1.0 - zoom..=1.0 + zoom),
            flip: self.horizontal_flip && rng.gen_bool(0.5),
        }
    }

    /// Samples a transform and applies it.
    #[must_use]
    pub fn augment<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        self.sample(rng).apply(image)
    }
}

/// Concrete transform parameters for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Rotation in degrees, counter-clockwise.
    pub angle_deg: f32,
    /// Horizontal zoom factor; above one samples a wider source area.
    pub zoom_x: f32,
    /// Vertical zoom factor.
    pub zoom_y: f32,
    /// Mirror left-right after the affine step.
    pub flip: bool,
}

impl Transform {
    /// The transform that leaves images unchanged.
    pub const IDENTITY: Self = Self {
        angle_deg: 0.0,
        zoom_x: 1.0,
        zoom_y: 1.0,
        flip: false,
    };

    /// Applies the transform, keeping the image size.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }

        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        let cx = width as f32 / 2.0 - 0.5;
        let cy = height as f32 / 2.0 - 0.5;
        let max_x = width as i64 - 1;
        let max_y = height as i64 - 1;

        RgbImage::from_fn(width, height, |x, y| {
            let out_x = if self.flip { width - 1 - x } else { x };
            let dx = out_x as f32 - cx;
            let dy = y as f32 - cy;
            let src_x = cos * self.zoom_x * dx - sin * self.zoom_y * dy + cx;
            let src_y = sin * self.zoom_x * dx + cos * self.zoom_y * dy + cy;
            let sx = (src_x.round() as i64).clamp(0, max_x) as u32;
            let sy = (src_y.round() as i64).clamp(0, max_y) as u32;
            *image.get_pixel(sx, sy)
        })
    }
}
