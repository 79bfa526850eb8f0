//! Multi-angle rendering of part meshes.
//!
//! Produces the synthetic training images: every allowed STL part is
//! centred, framed and rendered once per entry of a fixed orientation
//! table, so the `view_index` in each file name always means the same pose.
//!
//! # Scene Context
//!
//! All render state lives in an explicit [`Scene`]: the [`Camera`], the
//! [`SunLight`], colours, resolution and the single part being rendered.
//! The CPU rasterizer is deterministic, so identical inputs give identical
//! files.
//!
//! # Example
//!
//! ```no_run
//! use render_scene::{AngleTable, RenderConfig, render_directory};
//!
//! let config = RenderConfig::new("stl_collection", "test_data")
//!     .with_whitelist("whitelist_parts.txt")
//!     .with_angles(AngleTable::Tilted);
//!
//! let report = render_directory(&config).unwrap();
//! println!("{} images", report.image_count());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod angles;
mod batch;
mod camera;
mod config;
mod error;
mod light;
mod raster;
mod scene;
mod whitelist;

pub use angles::{AngleTable, SURVEY_ANGLES, TILTED_ANGLES, rotation_from_degrees};
pub use batch::{RenderReport, RenderedPart, list_meshes, render_directory};
pub use camera::{Camera, CameraFraming, ScreenPoint};
pub use config::{OutputLayout, RenderConfig};
pub use error::{RenderError, Result};
pub use light::SunLight;
pub use raster::{Shading, rasterize};
pub use scene::Scene;
pub use whitelist::{Whitelist, normalize_name};
