//! Fixed tables of object orientations.
//!
//! Angles are XYZ Euler triples in degrees. The position of a triple in its
//! table is the `view_index` that ends up in the image file name, so the
//! tables must never be reordered. Duplicates are deliberate and kept.

use nalgebra::Rotation3;
use serde::{Deserialize, Serialize};

/// Views clustered around a 240° tilt about X, which shows a part from
/// slightly below its studs.
#[rustfmt::skip]
pub const TILTED_ANGLES: [[i16; 3]; 91] = [
    [240, 0, 0], [235, 0, 0], [245, 0, 0], [240, 5, 0], [240, -5, 0], [240, 10, 0],
    [240, -10, 0], [242, 0, 0], [238, 0, 0], [240, 15, 0], [240, -15, 0], [245, 5, 0],
    [235, 5, 0], [245, -5, 0], [235, -5, 0], [243, 0, 0], [237, 0, 0], [240, 0, 5],
    [240, 0, -5], [240, 20, 0], [240, -20, 0], [240, 10, 10], [240, 10, -10], [235, 15, 0],
    [245, 15, 0], [240, 15, 10], [240, 15, -10], [245, 10, 5], [235, 10, 5], [245, 5, 10],
    [235, 5, 10], [245, 0, 10], [235, 0, 10], [245, 0, 15], [235, 0, 15], [240, 20, 5],
    [240, 20, -5], [245, 15, 5], [235, 15, -5], [240, 25, 0], [240, 25, 5], [240, -10, 10],
    [240, -10, -10], [235, -15, 0], [245, -15, 0], [240, -15, 10], [240, -15, -10], [245, -10, 5],
    [235, -10, 5], [245, -5, 10], [235, -5, 10], [245, 0, 10], [235, 0, 10], [245, 0, 15],
    [235, 0, 15], [240, -20, 5], [240, -20, -5], [245, -15, 5], [235, -15, -5], [240, -25, 0],
    [240, -25, 5], [240, 30, 0], [240, -30, 0], [240, 30, 5], [240, -30, 5], [240, 30, -5],
    [240, -30, -5], [240, 35, 0], [240, -35, 0], [240, 35, 5], [240, -35, 5], [240, 35, -5],
    [240, -35, -5], [240, 40, 0], [240, -40, 0], [240, 40, 5], [240, -40, 5], [240, 40, -5],
    [240, -40, -5], [240, 45, 0], [240, -45, 0], [240, 45, 5], [240, -45, 5], [240, 45, -5],
    [240, -45, -5], [240, 50, 0], [240, -50, 0], [240, 50, 5], [240, -50, 5], [240, 50, -5],
    [240, -50, -5],
];

/// A coarse survey: three single-axis tilts, a compound tilt and four views
/// from underneath.
pub const SURVEY_ANGLES: [[i16; 3]; 8] = [
    [45, 0, 0],
    [0, 45, 0],
    [0, 0, 45],
    [45, 45, 0],
    [90, 0, 0],
    [180, 0, 0],
    [180, 45, 0],
    [180, 0, 45],
];

/// Which orientation table to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleTable {
    /// [`TILTED_ANGLES`], 91 views.
    #[default]
    Tilted,
    /// [`SURVEY_ANGLES`], 8 views.
    Survey,
}

impl AngleTable {
    /// The table's triples in view order.
    #[must_use]
    pub const fn angles(self) -> &'static [[i16; 3]] {
        match self {
            Self::Tilted => &TILTED_ANGLES,
            Self::Survey => &SURVEY_ANGLES,
        }
    }

    /// Number of views per part.
    #[must_use]
    pub const fn len(self) -> usize {
        self.angles().len()
    }

    /// Always `false`; every table has views.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.angles().is_empty()
    }
}

/// Rotation for an XYZ Euler triple in degrees.
///
/// X is applied first, then Y, then Z.
///
/// # Example
///
/// ```
/// use render_scene::rotation_from_degrees;
/// use mesh_types::Vector3;
///
/// let r = rotation_from_degrees([0, 0, 90]);
/// let v = r * Vector3::x();
/// assert!((v.y - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn rotation_from_degrees(angles: [i16; 3]) -> Rotation3<f64> {
    let [x, y, z] = angles.map(|a| f64::from(a).to_radians());
    Rotation3::from_euler_angles(x, y, z)
}
