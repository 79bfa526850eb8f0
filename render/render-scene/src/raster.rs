//! Z-buffered triangle rasterizer.

use image::{Rgb, RgbImage};
use mesh_types::IndexedMesh;

use crate::camera::{Camera, ScreenPoint};
use crate::light::SunLight;

/// Surface and background colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    /// Base colour of the part.
    pub part_color: [u8; 3],
    /// Colour of pixels the part does not cover.
    pub background: [u8; 3],
    /// Light every face receives regardless of orientation, in `[0, 1]`.
    pub ambient: f64,
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            part_color: [204, 204, 204],
            background: [13, 13, 13],
            ambient: 0.2,
        }
    }
}

impl Shading {
    /// Colour of a face receiving `diffuse` sunlight.
    #[must_use]
    pub fn shade(&self, diffuse: f64) -> Rgb<u8> {
        let intensity = (self.ambient + (1.0 - self.ambient) * diffuse).clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        // Truncation: value is clamped to [0, 255]
        let scale = |c: u8| (f64::from(c) * intensity).round().clamp(0.0, 255.0) as u8;
        Rgb(self.part_color.map(scale))
    }
}

/// Renders `mesh` (already in world space) to a new image.
///
/// Faces are flat shaded and lit from both sides: a face seen from behind
/// uses its flipped normal. Faces with a vertex behind the camera are
/// dropped.
#[must_use]
pub fn rasterize(
    mesh: &IndexedMesh,
    camera: &Camera,
    sun: &SunLight,
    shading: &Shading,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, Rgb(shading.background));
    let mut depth = vec![f64::INFINITY; width as usize * height as usize];
    let view = camera.view();

    for tri in mesh.triangles() {
        let Some(normal) = tri.normal() else {
            continue;
        };
        let centroid = tri.centroid();
        let facing = if normal.dot(&(camera.location - centroid)) < 0.0 {
            -normal
        } else {
            normal
        };
        let color = shading.shade(sun.diffuse(&facing));

        let projected = tri
            .vertices()
            .map(|v| camera.project_view(&(view * v), width, height));
        let [Some(p0), Some(p1), Some(p2)] = projected else {
            continue;
        };
        fill_triangle(&mut image, &mut depth, [p0, p1, p2], color);
    }

    image
}

/// Signed double area of `(a, b, (x, y))`.
fn edge(a: &ScreenPoint, b: &ScreenPoint, x: f64, y: f64) -> f64 {
    (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn fill_triangle(image: &mut RgbImage, depth: &mut [f64], p: [ScreenPoint; 3], color: Rgb<u8>) {
    let [p0, p1, p2] = p;
    let area = edge(&p0, &p1, p2.x, p2.y);
    if area.abs() < f64::EPSILON {
        return;
    }

    let (w, h) = image.dimensions();
    let x_min = p0.x.min(p1.x).min(p2.x).floor().max(0.0);
    let y_min = p0.y.min(p1.y).min(p2.y).floor().max(0.0);
    let x_max = p0.x.max(p1.x).max(p2.x).ceil().min(f64::from(w) - 1.0);
    let y_max = p0.y.max(p1.y).max(p2.y).ceil().min(f64::from(h) - 1.0);
    if x_min > x_max || y_min > y_max {
        return;
    }

    // Truncation: bounds are clamped to the image
    for y in (y_min as u32)..=(y_max as u32) {
        let cy = f64::from(y) + 0.5;
        for x in (x_min as u32)..=(x_max as u32) {
            let cx = f64::from(x) + 0.5;
            let b0 = edge(&p1, &p2, cx, cy) / area;
            let b1 = edge(&p2, &p0, cx, cy) / area;
            let b2 = edge(&p0, &p1, cx, cy) / area;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }

            // Perspective-correct depth
            let z = 1.0 / (b0 / p0.depth + b1 / p1.depth + b2 / p2.depth);
            let idx = y as usize * w as usize + x as usize;
            if z < depth[idx] {
                depth[idx] = z;
                image.put_pixel(x, y, color);
            }
        }
    }
}
