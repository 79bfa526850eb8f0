//! Image decoding and tensor layout.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{DatasetError, Result};

/// Default square input edge for the classifier.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Decodes an image file into 8-bit RGB.
///
/// Grayscale, alpha and 16-bit inputs are converted; alpha is dropped.
///
/// # Errors
///
/// Returns [`DatasetError::Image`] if the file cannot be opened or decoded.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|e| DatasetError::image(path, e))?;
    Ok(image.to_rgb8())
}

/// Resizes to `size`×`size` with nearest-neighbour sampling.
///
/// The aspect ratio is not preserved.
#[must_use]
pub fn resize_square(image: &RgbImage, size: u32) -> RgbImage {
    if image.width() == size && image.height() == size {
        return image.clone();
    }
    imageops::resize(image, size, size, FilterType::Nearest)
}

/// Flattens an image into planar CHW floats rescaled to `[0, 1]`.
#[must_use]
pub fn to_chw(image: &RgbImage) -> Vec<f32> {
    let plane = (image.width() * image.height()) as usize;
    let mut out = vec![0.0_f32; plane * 3];
    for (i, pixel) in image.pixels().enumerate() {
        for (c, &value) in pixel.0.iter().enumerate() {
            out[c * plane + i] = f32::from(value) / 255.0;
        }
    }
    out
}

/// Loads, resizes and lays out an image ready for the model.
///
/// # Errors
///
/// Returns [`DatasetError::InvalidDimensions`] for a zero `size` and
/// [`DatasetError::Image`] for unreadable files.
pub fn load_chw(path: &Path, size: u32) -> Result<Vec<f32>> {
    if size == 0 {
        return Err(DatasetError::invalid_dimensions(size, size));
    }
    let image = load_rgb(path)?;
    Ok(to_chw(&resize_square(&image, size)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn chw_is_planar_and_rescaled() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 51]));
        image.put_pixel(1, 0, Rgb([0, 255, 102]));

        let chw = to_chw(&image);
        assert_eq!(chw.len(), 6);
        assert!((chw[0] - 1.0).abs() < 1e-6);
        assert!(chw[1].abs() < 1e-6);
        assert!(chw[2].abs() < 1e-6);
        assert!((chw[3] - 1.0).abs() < 1e-6);
        assert!((chw[4] - 0.2).abs() < 1e-6);
        assert!((chw[5] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn resize_square_changes_aspect() {
        let image = RgbImage::from_pixel(40, 10, Rgb([9, 9, 9]));
        let resized = resize_square(&image, 16);
        assert_eq!(resized.dimensions(), (16, 16));
        assert_eq!(resized.get_pixel(15, 15), &Rgb([9, 9, 9]));
    }

    #[test]
    fn load_chw_roundtrips_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("part.png");
        RgbImage::from_pixel(8, 6, Rgb([255, 255, 255])).save(&path).unwrap();

        let chw = load_chw(&path, 4).unwrap();
        assert_eq!(chw.len(), 3 * 4 * 4);
        assert!(chw.iter().all(|v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn load_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_chw(&path, 4), Err(DatasetError::Image { .. })));
        assert!(matches!(
            load_chw(&path, 0),
            Err(DatasetError::InvalidDimensions { .. })
        ));
    }
}
