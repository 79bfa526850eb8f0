//! Render batch configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::angles::AngleTable;
use crate::camera::CameraFraming;
use crate::error::{RenderError, Result};
use crate::whitelist::normalize_name;

/// Where rendered images go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// `<out>/<class>/<class>_view_<i>.png`, with the class name normalized.
    #[default]
    PerClass,
    /// `<out>/<stem>_view_<i>.png`, with the file stem as-is.
    Flat,
}

impl OutputLayout {
    /// Directory that receives a part's images.
    #[must_use]
    pub fn part_dir(self, root: &Path, stem: &str) -> PathBuf {
        match self {
            Self::PerClass => root.join(normalize_name(stem)),
            Self::Flat => root.to_path_buf(),
        }
    }

    /// Path of one view of a part.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use render_scene::OutputLayout;
    ///
    /// let out = Path::new("test_data");
    /// assert_eq!(
    ///     OutputLayout::PerClass.image_path(out, "Brick2x4", 3),
    ///     PathBuf::from("test_data/brick2x4/brick2x4_view_3.png")
    /// );
    /// assert_eq!(
    ///     OutputLayout::Flat.image_path(out, "Brick2x4", 3),
    ///     PathBuf::from("test_data/Brick2x4_view_3.png")
    /// );
    /// ```
    #[must_use]
    pub fn image_path(self, root: &Path, stem: &str, view_index: usize) -> PathBuf {
        let base = match self {
            Self::PerClass => normalize_name(stem),
            Self::Flat => stem.to_string(),
        };
        self.part_dir(root, stem)
            .join(format!("{base}_view_{view_index}.png"))
    }
}

/// Configuration for a render batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory of `*.stl` part meshes.
    pub mesh_dir: PathBuf,
    /// Root of the rendered images.
    pub output_dir: PathBuf,
    /// Comma-separated allow list; every mesh is rendered when `None`.
    pub whitelist: Option<PathBuf>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Orientation table.
    pub angles: AngleTable,
    /// Output file layout.
    pub layout: OutputLayout,
    /// Camera distance policy.
    pub framing: CameraFraming,
    /// Multiplier on the framing metric.
    pub padding: f64,
    /// Camera location before any framing.
    pub camera_location: [f64; 3],
    /// Lens focal length in millimetres.
    pub focal_length_mm: f64,
    /// Sensor width in millimetres.
    pub sensor_width_mm: f64,
    /// Part colour.
    pub part_color: [u8; 3],
    /// Background colour.
    pub background: [u8; 3],
    /// Ambient light in `[0, 1]`.
    pub ambient: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mesh_dir: PathBuf::from("stl_collection"),
            output_dir: PathBuf::from("test_data"),
            whitelist: Some(PathBuf::from("whitelist_parts.txt")),
            width: 800,
            height: 600,
            angles: AngleTable::Tilted,
            layout: OutputLayout::PerClass,
            framing: CameraFraming::Diagonal,
            padding: 1.5,
            camera_location: [0.0, -10.0, 10.0],
            focal_length_mm: 50.0,
            sensor_width_mm: 36.0,
            part_color: [204, 204, 204],
            background: [13, 13, 13],
            ambient: 0.2,
        }
    }
}

impl RenderConfig {
    /// Creates a config for the given directories with default settings.
    #[must_use]
    pub fn new(mesh_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mesh_dir: mesh_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the whitelist file.
    #[must_use]
    pub fn with_whitelist(mut self, path: impl Into<PathBuf>) -> Self {
        self.whitelist = Some(path.into());
        self
    }

    /// Renders every mesh.
    #[must_use]
    pub fn without_whitelist(mut self) -> Self {
        self.whitelist = None;
        self
    }

    /// Sets the image size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the orientation table.
    #[must_use]
    pub const fn with_angles(mut self, angles: AngleTable) -> Self {
        self.angles = angles;
        self
    }

    /// Sets the output layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the camera framing policy.
    #[must_use]
    pub const fn with_framing(mut self, framing: CameraFraming) -> Self {
        self.framing = framing;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::invalid_config("image size must be non-zero"));
        }
        if !(self.padding.is_finite() && self.padding > 0.0) {
            return Err(RenderError::invalid_config("padding must be positive"));
        }
        if !(self.focal_length_mm > 0.0 && self.sensor_width_mm > 0.0) {
            return Err(RenderError::invalid_config("lens sizes must be positive"));
        }
        if !(0.0..=1.0).contains(&self.ambient) {
            return Err(RenderError::invalid_config("ambient must be in [0, 1]"));
        }
        Ok(())
    }

    /// Returns `true` if [`validate`](Self::validate) passes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
