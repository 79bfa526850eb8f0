//! Mesh file I/O for BrickScan.
//!
//! Part meshes travel between pipeline stages as STL files: the LDraw
//! converter writes them, the scene renderer reads them. This crate loads
//! both STL encodings and writes either one.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_stl, save_stl, StlEncoding};
//!
//! let mesh = load_stl("stl_collection/3001.stl").unwrap();
//! save_stl(&mesh, "copy.stl", StlEncoding::Ascii).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod stl;

pub use error::{IoError, IoResult};
pub use stl::{StlEncoding, load_stl, read_stl, save_stl, write_stl};

use std::path::Path;

/// Returns `true` if `path` names an STL file.
///
/// Matches the lowercase `.stl` extension only, which is what the LDraw
/// converter writes.
///
/// # Example
///
/// ```
/// assert!(mesh_io::is_stl_path("parts/3001.stl"));
/// assert!(!mesh_io::is_stl_path("parts/3001.STL"));
/// assert!(!mesh_io::is_stl_path("parts/3001.dat"));
/// ```
#[must_use]
pub fn is_stl_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().extension().is_some_and(|ext| ext == "stl")
}
