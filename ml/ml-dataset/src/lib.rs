//! Image dataset handling for BrickScan.
//!
//! # Splitting
//!
//! - [`split_directory`] - Copy a class-folder tree into `train/` and `val/`
//! - [`SplitRatio`] - Validated train share, split point rounds down
//! - [`split_items`] - Seeded shuffle-and-split of any slice
//!
//! # Loading
//!
//! - [`ImageFolder`] - Sorted class directories as a Burn [`Dataset`](burn::data::dataset::Dataset)
//! - [`ImageBatcher`] - Decode, resize, augment and stack into tensors
//! - [`Augmentation`] - Random rotation, zoom and horizontal flip
//!
//! # Example
//!
//! ```no_run
//! use ml_dataset::{split_directory, SplitConfig};
//!
//! let config = SplitConfig::new("test_data", "train_val_split").with_seed(42);
//! let summary = split_directory(&config).unwrap();
//! println!("{summary}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod augment;
mod batcher;
mod error;
mod folder;
mod preprocess;
mod splits;
mod splitter;

pub use augment::{Augmentation, Transform};
pub use batcher::{DEFAULT_BATCH_SIZE, ImageBatch, ImageBatcher, single_image};
pub use error::{DatasetError, Result};
pub use folder::{FOLDER_IMAGE_EXTENSIONS, ImageFolder, ImageItem, is_folder_image};
pub use preprocess::{DEFAULT_INPUT_SIZE, load_chw, load_rgb, resize_square, to_chw};
pub use splits::{SplitRatio, split_items, split_items_with};
pub use splitter::{
    ClassSplit, SPLIT_IMAGE_EXTENSIONS, SplitConfig, SplitSummary, is_split_image, split_directory,
};
