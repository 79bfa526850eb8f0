//! Train/validation ratio and seeded shuffling.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Ratio for splitting datasets into train/validation sets.
///
/// The ratio specifies the proportion of data to use for training.
/// The remainder goes to validation.
///
/// # Example
///
/// ```
/// use ml_dataset::SplitRatio;
///
/// // 80% train, 20% validation
/// let ratio = SplitRatio::new(0.8).unwrap();
/// assert!((ratio.train_ratio() - 0.8).abs() < 1e-9);
/// assert!((ratio.val_ratio() - 0.2).abs() < 1e-9);
/// assert_eq!(ratio.split_point(7), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SplitRatio {
    train: f64,
}

impl SplitRatio {
    /// Creates a split ratio.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidSplitRatio`] unless `train` is in `(0, 1)`.
    pub fn new(train: f64) -> Result<Self> {
        if train > 0.0 && train < 1.0 {
            Ok(Self { train })
        } else {
            Err(DatasetError::invalid_split_ratio(train))
        }
    }

    /// Returns the training ratio.
    #[must_use]
    pub const fn train_ratio(&self) -> f64 {
        self.train
    }

    /// Returns the validation ratio.
    #[must_use]
    pub fn val_ratio(&self) -> f64 {
        1.0 - self.train
    }

    /// Number of items that go to training out of `total`.
    ///
    /// Rounds down and never clamps, so a single-item class goes entirely to
    /// validation.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn split_point(&self, total: usize) -> usize {
        (total as f64 * self.train).floor() as usize
    }

    /// Common 80/20 split.
    pub const EIGHTY_TWENTY: Self = Self { train: 0.8 };
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::EIGHTY_TWENTY
    }
}

impl TryFrom<f64> for SplitRatio {
    type Error = DatasetError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SplitRatio> for f64 {
    fn from(ratio: SplitRatio) -> Self {
        ratio.train
    }
}

/// Shuffles `items` and splits them into `(train, val)`.
///
/// With `seed` set the permutation is reproducible; otherwise the generator is
/// seeded from OS entropy.
///
/// # Example
///
/// ```
/// use ml_dataset::{split_items, SplitRatio};
///
/// let items: Vec<u32> = (0..10).collect();
/// let (train, val) = split_items(&items, SplitRatio::EIGHTY_TWENTY, Some(42));
/// assert_eq!(train.len(), 8);
/// assert_eq!(val.len(), 2);
/// ```
#[must_use]
pub fn split_items<T: Clone>(items: &[T], ratio: SplitRatio, seed: Option<u64>) -> (Vec<T>, Vec<T>) {
    let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
    split_items_with(items, ratio, &mut rng)
}

/// Like [`split_items`] but draws from a caller-owned generator.
#[must_use]
pub fn split_items_with<T: Clone, R: rand::Rng + ?Sized>(
    items: &[T],
    ratio: SplitRatio,
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    let val = shuffled.split_off(ratio.split_point(shuffled.len()));
    (shuffled, val)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn split_ratio_new() {
        let ratio = SplitRatio::new(0.8).unwrap();
        assert!((ratio.train_ratio() - 0.8).abs() < 1e-12);
        assert!((ratio.val_ratio() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn split_ratio_rejects_out_of_range() {
        assert!(SplitRatio::new(0.5).is_ok());
        assert!(SplitRatio::new(0.0).is_err());
        assert!(SplitRatio::new(1.0).is_err());
        assert!(SplitRatio::new(-0.5).is_err());
        assert!(SplitRatio::new(f64::NAN).is_err());
    }

    #[test]
    fn split_point_floors() {
        let ratio = SplitRatio::default();
        assert_eq!(ratio.split_point(100), 80);
        assert_eq!(ratio.split_point(10), 8);
        assert_eq!(ratio.split_point(9), 7);
        assert_eq!(ratio.split_point(1), 0);
        assert_eq!(ratio.split_point(0), 0);
    }

    #[test]
    fn split_ratio_serde_validates() {
        let json = serde_json::to_string(&SplitRatio::new(0.75).unwrap()).unwrap();
        assert_eq!(json, "0.75");
        assert!(serde_json::from_str::<SplitRatio>("0.6").is_ok());
        assert!(serde_json::from_str::<SplitRatio>("1.2").is_err());
    }

    #[test]
    fn split_items_partitions() {
        let items: Vec<u32> = (0..10).collect();
        let (train, val) = split_items(&items, SplitRatio::EIGHTY_TWENTY, None);

        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);

        let mut all: Vec<u32> = train.iter().chain(val.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, items);
    }

    #[test]
    fn split_items_single_goes_to_val() {
        let (train, val) = split_items(&["only"], SplitRatio::EIGHTY_TWENTY, Some(1));
        assert!(train.is_empty());
        assert_eq!(val, vec!["only"]);
    }

    #[test]
    fn split_items_empty() {
        let items: Vec<u32> = vec![];
        let (train, val) = split_items(&items, SplitRatio::EIGHTY_TWENTY, None);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn split_items_reproducible() {
        let items: Vec<u32> = (0..100).collect();
        let first = split_items(&items, SplitRatio::EIGHTY_TWENTY, Some(42));
        let second = split_items(&items, SplitRatio::EIGHTY_TWENTY, Some(42));
        assert_eq!(first, second);
    }
}
