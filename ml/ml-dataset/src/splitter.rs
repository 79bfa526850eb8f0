//! Splitting a class-folder image tree into `train/` and `val/` copies.
//!
//! The source root holds one directory per class. The destination receives
//! `train/<class>/` and `val/<class>/` with every source image copied to
//! exactly one side. Both sides are wiped before each run, so stale files from
//! an earlier split never leak into the new one.

use std::fs;
use std::path::{Component, Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DatasetError, Result};
use crate::splits::{SplitRatio, split_items_with};

/// Extensions picked up by the splitter, compared case-insensitively.
pub const SPLIT_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Configuration for [`split_directory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Root with one subdirectory per class.
    pub source_dir: PathBuf,
    /// Root that receives `train/` and `val/`.
    pub dest_dir: PathBuf,
    /// Share of each class copied to `train/`.
    pub ratio: SplitRatio,
    /// Seed for a reproducible split; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::new("test_data", "train_val_split")
    }
}

impl SplitConfig {
    /// Creates a config with the default 80/20 ratio and no seed.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            ratio: SplitRatio::default(),
            seed: None,
        }
    }

    /// Sets the train ratio.
    #[must_use]
    pub fn with_ratio(mut self, ratio: SplitRatio) -> Self {
        self.ratio = ratio;
        self
    }

    /// Fixes the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// `<dest>/train`.
    #[must_use]
    pub fn train_dir(&self) -> PathBuf {
        self.dest_dir.join("train")
    }

    /// `<dest>/val`.
    #[must_use]
    pub fn val_dir(&self) -> PathBuf {
        self.dest_dir.join("val")
    }

    /// Checks the paths are usable.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] for empty paths or a
    /// destination equal to or inside the source, where it would be split
    /// as a class of its own.
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() || self.dest_dir.as_os_str().is_empty() {
            return Err(DatasetError::invalid_config("source and destination must be set"));
        }
        if without_cur_dir(&self.dest_dir).starts_with(without_cur_dir(&self.source_dir)) {
            return Err(DatasetError::invalid_config(
                "destination must lie outside the source directory",
            ));
        }
        Ok(())
    }

    /// Returns `true` if [`validate`](Self::validate) passes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Outcome for a single class folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSplit {
    /// Class (folder) name.
    pub class: String,
    /// Images copied to `train/`.
    pub train: usize,
    /// Images copied to `val/`.
    pub val: usize,
}

impl ClassSplit {
    /// Images found for the class.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.train + self.val
    }

    /// `true` when one side received nothing.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.train == 0 || self.val == 0
    }
}

/// Per-class counts of a split run, in sorted class order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// One entry per class folder.
    pub classes: Vec<ClassSplit>,
}

impl SplitSummary {
    /// Images copied to `train/` across all classes.
    #[must_use]
    pub fn train_total(&self) -> usize {
        self.classes.iter().map(|c| c.train).sum()
    }

    /// Images copied to `val/` across all classes.
    #[must_use]
    pub fn val_total(&self) -> usize {
        self.classes.iter().map(|c| c.val).sum()
    }

    /// Classes with an empty train or val side.
    pub fn degenerate(&self) -> impl Iterator<Item = &ClassSplit> {
        self.classes.iter().filter(|c| c.is_degenerate())
    }
}

impl std::fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} classes: {} train, {} val",
            self.classes.len(),
            self.train_total(),
            self.val_total()
        )
    }
}

/// Returns `true` for files the splitter copies.
#[must_use]
pub fn is_split_image(path: &Path) -> bool {
    has_extension(path, &SPLIT_IMAGE_EXTENSIONS)
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

/// Sorted names of the subdirectories of `root`.
pub(crate) fn class_dirs(root: &Path) -> Result<Vec<String>> {
    let mut classes = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            classes.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    classes.sort();
    Ok(classes)
}

/// Sorted files in `dir` accepted by `keep`.
pub(crate) fn files_in(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && keep(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Empties `dir`, creating it if missing.
/// `path` with `.` components dropped, so `./a` and `a` compare equal.
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
    } else {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn copy_into(files: &[PathBuf], dir: &Path) -> Result<()> {
    for file in files {
        if let Some(name) = file.file_name() {
            fs::copy(file, dir.join(name))?;
        }
    }
    Ok(())
}

/// Splits every class folder under `config.source_dir` into train and val
/// copies under `config.dest_dir`.
///
/// Files are listed in sorted order before shuffling, so a fixed seed gives
/// the same split regardless of directory iteration order.
///
/// # Errors
///
/// Returns an error for an invalid config, an unreadable source root or any
/// failed copy. A partially written destination is left as is.
pub fn split_directory(config: &SplitConfig) -> Result<SplitSummary> {
    config.validate()?;

    let train_root = config.train_dir();
    let val_root = config.val_dir();
    reset_dir(&train_root)?;
    reset_dir(&val_root)?;

    let classes = class_dirs(&config.source_dir)?;
    for class in &classes {
        fs::create_dir_all(train_root.join(class))?;
        fs::create_dir_all(val_root.join(class))?;
    }

    let mut rng = config
        .seed
        .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);

    let mut summary = SplitSummary::default();
    for class in classes {
        let images = files_in(&config.source_dir.join(&class), is_split_image)?;
        let (train, val) = split_items_with(&images, config.ratio, &mut rng);

        copy_into(&train, &train_root.join(&class))?;
        copy_into(&val, &val_root.join(&class))?;

        let split = ClassSplit {
            class,
            train: train.len(),
            val: val.len(),
        };
        debug!(class = %split.class, train = split.train, val = split.val, "Split class");
        if split.is_degenerate() {
            warn!(
                class = %split.class,
                images = split.total(),
                "Class has an empty train or val side"
            );
        }
        summary.classes.push(split);
    }

    info!(
        classes = summary.classes.len(),
        train = summary.train_total(),
        val = summary.val_total(),
        dest = %config.dest_dir.display(),
        "Data has been split into training and validation sets"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_is_case_insensitive() {
        assert!(is_split_image(Path::new("a/brick_view_0.png")));
        assert!(is_split_image(Path::new("a/photo.JPG")));
        assert!(is_split_image(Path::new("a/photo.Jpeg")));
        assert!(!is_split_image(Path::new("a/notes.txt")));
        assert!(!is_split_image(Path::new("a/scan.bmp")));
        assert!(!is_split_image(Path::new("a/png")));
    }

    #[test]
    fn config_validation() {
        assert!(SplitConfig::default().is_valid());
        assert!(!SplitConfig::new("same", "same").is_valid());
        assert!(!SplitConfig::new("", "out").is_valid());
    }

    #[test]
    fn destination_inside_source_is_rejected() {
        assert!(!SplitConfig::new("test_data", "test_data/split").is_valid());
        assert!(!SplitConfig::new("test_data", "./test_data/split").is_valid());
        assert!(SplitConfig::new("test_data", "test_data_split").is_valid());
        assert!(SplitConfig::new("renders/test_data", "renders/split").is_valid());
    }

    #[test]
    fn config_toml_style_defaults() {
        let config: SplitConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.source_dir, PathBuf::from("test_data"));
        assert_eq!(config.ratio, SplitRatio::EIGHTY_TWENTY);
    }

    #[test]
    fn summary_counts_and_degenerate() {
        let summary = SplitSummary {
            classes: vec![
                ClassSplit {
                    class: "brick".into(),
                    train: 8,
                    val: 2,
                },
                ClassSplit {
                    class: "tile".into(),
                    train: 0,
                    val: 1,
                },
            ],
        };
        assert_eq!(summary.train_total(), 8);
        assert_eq!(summary.val_total(), 3);
        let degenerate: Vec<_> = summary.degenerate().map(|c| c.class.as_str()).collect();
        assert_eq!(degenerate, ["tile"]);
        assert_eq!(summary.to_string(), "2 classes: 8 train, 3 val");
    }

    #[test]
    fn reset_dir_creates_and_clears() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("train");
        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());

        fs::create_dir_all(dir.join("old_class")).unwrap();
        fs::write(dir.join("stray.png"), b"x").unwrap();
        reset_dir(&dir).unwrap();
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
