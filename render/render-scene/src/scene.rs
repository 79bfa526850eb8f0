//! The explicit render context.

use std::path::Path;

use image::RgbImage;
use mesh_types::{Aabb, IndexedMesh, Point3, Rotation3};
use tracing::debug;

use crate::camera::{Camera, CameraFraming};
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::light::SunLight;
use crate::raster::{Shading, rasterize};

/// The part currently placed in the scene.
#[derive(Debug, Clone)]
struct Placed {
    name: String,
    mesh: IndexedMesh,
    rotation: Rotation3<f64>,
}

/// Everything needed to render a still: camera, light, resolution, colours
/// and at most one part.
///
/// A part is centred on the origin when added and keeps unit scale; only
/// its rotation changes between views.
///
/// # Example
///
/// ```
/// use render_scene::{CameraFraming, Scene};
/// use mesh_types::unit_cube;
///
/// let mut scene = Scene::new(64, 48);
/// scene.add_part("cube", unit_cube());
/// scene.fit_camera(CameraFraming::Diagonal, 1.5);
///
/// let image = scene.render();
/// assert_eq!(image.dimensions(), (64, 48));
///
/// assert!(scene.remove_part().is_some());
/// assert!(!scene.has_part());
/// ```
#[derive(Debug, Clone)]
pub struct Scene {
    /// Active camera.
    pub camera: Camera,
    /// Sun lamp.
    pub sun: SunLight,
    /// Colours.
    pub shading: Shading,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    part: Option<Placed>,
}

impl Scene {
    /// Creates an empty scene with the default camera and sun.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: Camera::default(),
            sun: SunLight::default(),
            shading: Shading::default(),
            width,
            height,
            part: None,
        }
    }

    /// Creates an empty scene from render settings.
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        let [x, y, z] = config.camera_location;
        Self {
            camera: Camera {
                location: Point3::new(x, y, z),
                focal_length_mm: config.focal_length_mm,
                sensor_width_mm: config.sensor_width_mm,
                ..Camera::default()
            },
            sun: SunLight::default(),
            shading: Shading {
                part_color: config.part_color,
                background: config.background,
                ambient: config.ambient,
            },
            width: config.width,
            height: config.height,
            part: None,
        }
    }

    /// Centres `mesh` on the origin and places it in the scene, replacing
    /// any previous part. Returns the centred bounds.
    pub fn add_part(&mut self, name: impl Into<String>, mut mesh: IndexedMesh) -> Aabb {
        let offset = mesh.center_on_origin();
        let name = name.into();
        debug!(part = %name, ?offset, "Centred part");
        let bounds = mesh.bounds();
        self.part = Some(Placed {
            name,
            mesh,
            rotation: Rotation3::identity(),
        });
        bounds
    }

    /// Takes the part out of the scene.
    pub fn remove_part(&mut self) -> Option<IndexedMesh> {
        self.part.take().map(|placed| placed.mesh)
    }

    /// Returns `true` if a part is placed.
    #[must_use]
    pub fn has_part(&self) -> bool {
        self.part.is_some()
    }

    /// Name of the placed part.
    #[must_use]
    pub fn part_name(&self) -> Option<&str> {
        self.part.as_ref().map(|placed| placed.name.as_str())
    }

    /// Bounds of the placed part before rotation.
    #[must_use]
    pub fn part_bounds(&self) -> Option<Aabb> {
        self.part.as_ref().map(|placed| placed.mesh.bounds())
    }

    /// Sets the part's orientation about the origin.
    pub fn set_rotation(&mut self, rotation: Rotation3<f64>) {
        if let Some(placed) = &mut self.part {
            placed.rotation = rotation;
        }
    }

    /// Moves the camera to frame the placed part.
    pub fn fit_camera(&mut self, framing: CameraFraming, padding: f64) {
        if let Some(bounds) = self.part_bounds() {
            self.camera.frame(&bounds, framing, padding);
            debug!(location = ?self.camera.location, "Camera framed");
        }
    }

    /// Renders the current scene.
    #[must_use]
    pub fn render(&self) -> RgbImage {
        let posed = self
            .part
            .as_ref()
            .map(|placed| placed.mesh.rotated(&placed.rotation))
            .unwrap_or_default();
        rasterize(
            &posed,
            &self.camera,
            &self.sun,
            &self.shading,
            self.width,
            self.height,
        )
    }

    /// Renders the current scene and writes it to `path`.
    ///
    /// The format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Image`] if encoding or writing fails.
    pub fn render_to(&self, path: &Path) -> Result<()> {
        self.render()
            .save(path)
            .map_err(|source| RenderError::Image {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;
    use mesh_types::{Vector3, unit_cube};

    #[test]
    fn add_part_centres() {
        let mut scene = Scene::new(8, 8);
        let mut cube = unit_cube();
        cube.translate(Vector3::new(5.0, 5.0, 5.0));

        let bounds = scene.add_part("cube", cube);
        assert_relative_eq!(bounds.center().coords.norm(), 0.0, epsilon = 1e-12);
        assert_eq!(scene.part_name(), Some("cube"));
    }

    #[test]
    fn empty_scene_renders_background() {
        let scene = Scene::new(8, 6);
        let image = scene.render();
        assert!(image.pixels().all(|p| *p == Rgb(scene.shading.background)));
    }

    #[test]
    fn rotation_changes_image() {
        let mut scene = Scene::new(64, 48);
        let mut bar = unit_cube();
        for v in &mut bar.vertices {
            v.x *= 6.0;
        }
        scene.add_part("bar", bar);
        scene.fit_camera(CameraFraming::Diagonal, 1.5);

        let flat = scene.render();
        scene.set_rotation(Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2));
        let turned = scene.render();
        assert_ne!(flat, turned);
    }

    #[test]
    fn from_config_uses_camera_and_size() {
        let config = RenderConfig::default().with_size(320, 240);
        let scene = Scene::from_config(&config);
        assert_eq!((scene.width, scene.height), (320, 240));
        assert_eq!(scene.camera.location, Point3::new(0.0, -10.0, 10.0));
        assert_relative_eq!(scene.camera.focal_length_mm, 50.0);
    }

    #[test]
    fn render_to_unwritable_path_fails() {
        let mut scene = Scene::new(4, 4);
        scene.add_part("cube", unit_cube());
        let err = scene
            .render_to(Path::new("/no/such/dir/view.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
    }
}
