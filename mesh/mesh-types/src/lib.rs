//! Core mesh types for BrickScan.
//!
//! This crate provides the geometry the part renderer works on:
//!
//! - [`IndexedMesh`] - A triangle mesh with indexed vertex positions
//! - [`Triangle`] - A concrete triangle with resolved positions
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Units
//!
//! Coordinates are `f64` and unit-agnostic. LDraw exports use LDraw units
//! (1 LDU = 0.4 mm); nothing here depends on that.
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Rotations are XYZ Euler angles: the X rotation is
//! applied first, then Y, then Z.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Point3};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Point3::new(2.0, 2.0, 2.0));
//! mesh.vertices.push(Point3::new(4.0, 2.0, 2.0));
//! mesh.vertices.push(Point3::new(2.0, 4.0, 2.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! mesh.center_on_origin();
//! assert!(mesh.bounds().center().coords.norm() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod mesh;
mod triangle;

pub use bounds::Aabb;
pub use mesh::{IndexedMesh, unit_cube};
pub use triangle::Triangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Rotation3, Vector3};
