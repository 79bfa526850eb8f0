//! Class-per-directory image datasets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use burn::data::dataset::Dataset;
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::splitter::{class_dirs, files_in, has_extension};

/// Extensions recognised as images when loading a class folder.
pub const FOLDER_IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "ppm", "tif", "tiff"];

/// One image on disk and its class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    /// Image file.
    pub path: PathBuf,
    /// Index into [`ImageFolder::classes`].
    pub label: usize,
}

/// Images grouped by class subdirectory.
///
/// Class names are the sorted subdirectory names of the root; a class's label
/// is its position in that order. Images are held as paths and decoded when a
/// batch is built.
///
/// # Example
///
/// ```no_run
/// use burn::data::dataset::Dataset;
/// use ml_dataset::ImageFolder;
///
/// let folder = ImageFolder::open("train_val_split/train").unwrap();
/// println!("{} images in {} classes", folder.len(), folder.num_classes());
/// ```
#[derive(Debug, Clone)]
pub struct ImageFolder {
    root: PathBuf,
    classes: Vec<String>,
    items: Vec<ImageItem>,
}

impl ImageFolder {
    /// Scans `root` for class directories and their images.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NoClasses`] when `root` has no subdirectories,
    /// [`DatasetError::NoSamples`] when none of them holds an image, and an IO
    /// error if `root` cannot be read.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let classes = class_dirs(root)?;
        if classes.is_empty() {
            return Err(DatasetError::no_classes(root));
        }

        let mut items = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let files = files_in(&root.join(class), is_folder_image)?;
            debug!(class = %class, label, images = files.len(), "Indexed class folder");
            items.extend(files.into_iter().map(|path| ImageItem { path, label }));
        }
        if items.is_empty() {
            return Err(DatasetError::no_samples(root));
        }

        Ok(Self {
            root: root.to_path_buf(),
            classes,
            items,
        })
    }

    /// Directory the folder was opened from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class names in label order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Name of class `label`.
    #[must_use]
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.classes.get(label).map(String::as_str)
    }

    /// Mapping from class name to label.
    #[must_use]
    pub fn class_indices(&self) -> BTreeMap<String, usize> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect()
    }

    /// All items, grouped by class.
    #[must_use]
    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    /// Number of images per class, in label order.
    #[must_use]
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for item in &self.items {
            counts[item.label] += 1;
        }
        counts
    }
}

impl Dataset<ImageItem> for ImageFolder {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Returns `true` for files [`ImageFolder`] picks up.
#[must_use]
pub fn is_folder_image(path: &Path) -> bool {
    has_extension(path, &FOLDER_IMAGE_EXTENSIONS)
}
