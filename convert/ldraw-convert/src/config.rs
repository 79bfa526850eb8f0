//! Conversion configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// File-name fragments that mark sub-parts and patterned variants.
///
/// `s0` matches sub-part files, `--` and `p0` match primitive and print
/// variants. None of them make useful training classes.
pub const DEFAULT_EXCLUDED_SUBSTRINGS: [&str; 3] = ["s0", "--", "p0"];

/// Part directories of a complete LDraw library, relative to its root.
pub const LIBRARY_PART_DIRS: [&str; 2] = ["parts", "UnOfficial/parts"];

/// Configuration for a conversion batch.
///
/// # Example
///
/// ```
/// use ldraw_convert::ConvertConfig;
///
/// let config = ConvertConfig::new("ldraw", "stl")
///     .with_allowed_dir("ldraw/parts")
///     .with_size(1024, 768);
///
/// assert!(config.is_valid());
/// assert_eq!(config.excluded_substrings, ["s0", "--", "p0"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Root of the LDraw library to walk.
    pub input_root: PathBuf,

    /// Flat directory receiving `<stem>.stl` files.
    pub output_dir: PathBuf,

    /// Directories whose direct children are converted.
    ///
    /// Compared to the walked directories after dropping `.` components, so
    /// they should be spelled with the same prefix as `input_root`.
    pub allowed_dirs: Vec<PathBuf>,

    /// A file is skipped if its name contains any of these.
    pub excluded_substrings: Vec<String>,

    /// LDView executable, looked up on `PATH` when not absolute.
    pub ldview_path: PathBuf,

    /// `-SaveWidth` passed to LDView.
    pub save_width: u32,

    /// `-SaveHeight` passed to LDView.
    pub save_height: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::new("ldraw_collection", "stl_collection")
    }
}

impl ConvertConfig {
    /// Creates a config with no allowed directories.
    #[must_use]
    pub fn new(input_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_dir: output_dir.into(),
            allowed_dirs: Vec::new(),
            excluded_substrings: DEFAULT_EXCLUDED_SUBSTRINGS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            ldview_path: PathBuf::from("ldview"),
            save_width: 800,
            save_height: 600,
        }
    }

    /// Adds an allowed directory.
    #[must_use]
    pub fn with_allowed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.allowed_dirs.push(dir.into());
        self
    }

    /// Allows the official and unofficial part directories under the input
    /// root, see [`LIBRARY_PART_DIRS`].
    #[must_use]
    pub fn with_library_dirs(mut self) -> Self {
        let dirs = LIBRARY_PART_DIRS.map(|dir| self.input_root.join(dir));
        self.allowed_dirs.extend(dirs);
        self
    }

    /// Replaces the excluded substrings.
    #[must_use]
    pub fn with_excluded_substrings<I, S>(mut self, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_substrings = excluded.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the LDView executable.
    #[must_use]
    pub fn with_ldview_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ldview_path = path.into();
        self
    }

    /// Sets the LDView save size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.save_width = width;
        self.save_height = height;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_dirs.is_empty() {
            return Err(ConvertError::invalid_config("no allowed directories"));
        }
        if self.ldview_path.as_os_str().is_empty() {
            return Err(ConvertError::invalid_config("empty LDView path"));
        }
        if self.save_width == 0 || self.save_height == 0 {
            return Err(ConvertError::invalid_config("save size must be non-zero"));
        }
        if self.excluded_substrings.iter().any(String::is_empty) {
            return Err(ConvertError::invalid_config(
                "empty excluded substring would reject every file",
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
