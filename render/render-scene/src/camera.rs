//! Perspective camera and framing.

use mesh_types::{Aabb, Point3, Vector3};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

/// A pinhole camera looking at a target point.
///
/// The lens is described the way a photographer would: focal length and
/// sensor width in millimetres. The sensor width spans the longer side of
/// the image.
///
/// # Example
///
/// ```
/// use render_scene::Camera;
/// use mesh_types::Point3;
///
/// let camera = Camera::default();
/// assert_eq!(camera.location, Point3::new(0.0, -10.0, 10.0));
///
/// // The target lands in the image centre
/// let p = camera.project(&Point3::origin(), 800, 600).unwrap();
/// assert!((p.x - 400.0).abs() < 1e-9 && (p.y - 300.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub location: Point3<f64>,
    /// Point the camera looks at.
    pub target: Point3<f64>,
    /// World up direction.
    pub up: Vector3<f64>,
    /// Focal length in millimetres.
    pub focal_length_mm: f64,
    /// Sensor width in millimetres.
    pub sensor_width_mm: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            location: Point3::new(0.0, -10.0, 10.0),
            target: Point3::origin(),
            up: Vector3::z(),
            focal_length_mm: 50.0,
            sensor_width_mm: 36.0,
        }
    }
}

/// A projected vertex: pixel coordinates plus view depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Column, 0 at the left edge.
    pub x: f64,
    /// Row, 0 at the top edge.
    pub y: f64,
    /// Distance in front of the camera along its view axis.
    pub depth: f64,
}

impl Camera {
    /// Closest depth that is still drawn.
    pub const NEAR: f64 = 1e-6;

    /// World-to-view transform (right-handed, camera looks down -Z).
    #[must_use]
    pub fn view(&self) -> Isometry3<f64> {
        Isometry3::look_at_rh(&self.location, &self.target, &self.up)
    }

    /// Focal length in pixels for an image of this size.
    #[must_use]
    pub fn focal_length_px(&self, width: u32, height: u32) -> f64 {
        self.focal_length_mm / self.sensor_width_mm * f64::from(width.max(height))
    }

    /// Projects a world point into pixel space.
    ///
    /// Returns `None` for points at or behind the near plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>, width: u32, height: u32) -> Option<ScreenPoint> {
        let view = self.view() * point;
        self.project_view(&view, width, height)
    }

    /// Projects a point already in view space.
    #[must_use]
    pub fn project_view(&self, view: &Point3<f64>, width: u32, height: u32) -> Option<ScreenPoint> {
        let depth = -view.z;
        if depth <= Self::NEAR {
            return None;
        }
        let f = self.focal_length_px(width, height);
        Some(ScreenPoint {
            x: f64::from(width) / 2.0 + f * view.x / depth,
            y: f64::from(height) / 2.0 - f * view.y / depth,
            depth,
        })
    }

    /// Moves the camera to `(0, -d, d)` with `d = metric * padding`.
    ///
    /// [`CameraFraming::Fixed`] and empty boxes leave the camera alone.
    pub fn frame(&mut self, bounds: &Aabb, framing: CameraFraming, padding: f64) {
        let Some(metric) = framing.metric(bounds) else {
            return;
        };
        let distance = metric * padding;
        if distance > Self::NEAR {
            self.location = Point3::new(0.0, -distance, distance);
        }
    }
}

/// How the camera distance follows the part size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFraming {
    /// Keep the configured camera location.
    Fixed,
    /// Scale by the largest bounding-box edge.
    MaxExtent,
    /// Scale by the bounding-box diagonal, so elongated parts stay in frame
    /// in every orientation.
    #[default]
    Diagonal,
}

impl CameraFraming {
    /// Size measure used for the camera distance, `None` when not framing.
    #[must_use]
    pub fn metric(self, bounds: &Aabb) -> Option<f64> {
        if bounds.is_empty() {
            return None;
        }
        match self {
            Self::Fixed => None,
            Self::MaxExtent => Some(bounds.max_extent()),
            Self::Diagonal => Some(bounds.diagonal()),
        }
    }
}
