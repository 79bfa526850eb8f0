//! LDraw to STL batch conversion.
//!
//! Walks an LDraw library, picks the part files that live directly inside a
//! set of allow-listed directories and hands each one to an external
//! converter (LDView) that writes `<stem>.stl` into a flat output directory.
//!
//! - [`ConvertConfig`] - Where to read, where to write, what to skip
//! - [`ConverterTool`] - The external converter seam
//! - [`LdviewTool`] - The real LDView command line
//! - [`convert_all`] - Runs the batch and returns a [`ConversionReport`]
//!
//! # Failure Policy
//!
//! A converter that exits non-zero, or an executable that cannot be found,
//! is logged and recorded in the report; the batch carries on with the next
//! file. Nothing is retried and partial output is left in place. Only
//! problems with the output directory itself abort the run.
//!
//! # Example
//!
//! ```no_run
//! use ldraw_convert::{ConvertConfig, LdviewTool, convert_all};
//!
//! let config = ConvertConfig::new("ldraw_collection", "stl_collection")
//!     .with_allowed_dir("ldraw_collection/parts");
//! let tool = LdviewTool::from_config(&config);
//!
//! let report = convert_all(&config, &tool).unwrap();
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod convert;
mod error;
mod scan;
mod tool;

pub use config::{ConvertConfig, DEFAULT_EXCLUDED_SUBSTRINGS, LIBRARY_PART_DIRS};
pub use convert::{ConversionReport, FailedConversion, convert_all};
pub use error::{ConvertError, Result};
pub use scan::{collect_candidates, is_candidate_name, output_path_for};
pub use tool::{ConverterTool, LdviewTool, ToolStatus};
