//! Batch conversion driver.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::scan::{collect_candidates, output_path_for};
use crate::tool::{ConverterTool, ToolStatus};

/// A file the converter ran on but did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedConversion {
    /// Input part file.
    pub input: PathBuf,
    /// Exit code, `None` if the process was killed.
    pub code: Option<i32>,
}

/// Outcome of a conversion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Outputs written by successful runs.
    pub converted: Vec<PathBuf>,
    /// Inputs whose output already existed.
    pub skipped: Vec<PathBuf>,
    /// Runs that exited non-zero.
    pub failed: Vec<FailedConversion>,
    /// Inputs that could not be converted because the executable was missing.
    pub tool_missing: Vec<PathBuf>,
    /// Inputs whose run could not be started for another reason.
    pub launch_errors: Vec<PathBuf>,
}

impl ConversionReport {
    /// Total candidate files seen.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.converted.len()
            + self.skipped.len()
            + self.failed.len()
            + self.tool_missing.len()
            + self.launch_errors.len()
    }

    /// Returns `true` if no candidate file was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates() == 0
    }

    /// Number of times the converter was started.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.converted.len() + self.failed.len()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} candidates: {} converted, {} skipped, {} failed",
            self.candidates(),
            self.converted.len(),
            self.skipped.len(),
            self.failed.len()
        )?;
        if !self.tool_missing.is_empty() {
            write!(f, ", {} not attempted (converter not found)", self.tool_missing.len())?;
        }
        if !self.launch_errors.is_empty() {
            write!(f, ", {} could not be started", self.launch_errors.len())?;
        }
        Ok(())
    }
}

/// Converts every candidate part file under `config.input_root`.
///
/// Creates the output directory, collects candidates (see
/// [`collect_candidates`]) and runs `tool` once per file whose output does
/// not exist yet. Converter failures are logged and recorded; the batch
/// always visits every candidate.
///
/// # Errors
///
/// Returns an error if the config is invalid or the output directory cannot
/// be created.
pub fn convert_all<T: ConverterTool + ?Sized>(
    config: &ConvertConfig,
    tool: &T,
) -> Result<ConversionReport> {
    config.validate()?;

    fs::create_dir_all(&config.output_dir).map_err(|source| ConvertError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    info!(root = %config.input_root.display(), "Scanning LDraw library");
    let candidates = collect_candidates(
        &config.input_root,
        &config.allowed_dirs,
        &config.excluded_substrings,
    );

    let mut report = ConversionReport::default();
    if candidates.is_empty() {
        warn!("No valid .dat files found in the allowed directories");
        return Ok(report);
    }
    info!(count = candidates.len(), "Found files to convert");

    for input in candidates {
        let output = output_path_for(&input, &config.output_dir);
        let name = input.file_name().map(|n| n.to_string_lossy().into_owned());
        let name = name.as_deref().unwrap_or_default();

        if output.exists() {
            info!(file = name, "Skipping, STL already exists");
            report.skipped.push(input);
            continue;
        }

        info!(file = name, "Converting to STL");
        match tool.convert(&input, &output) {
            Ok(ToolStatus::Success) => {
                info!(output = %output.display(), "Saved");
                report.converted.push(output);
            }
            Ok(ToolStatus::Failed { code }) => {
                error!(file = name, ?code, "Converter exited with an error");
                report.failed.push(FailedConversion { input, code });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(
                    file = name,
                    "Converter executable not found, check the LDView path"
                );
                report.tool_missing.push(input);
            }
            Err(e) => {
                error!(file = name, error = %e, "Converter could not be started");
                report.launch_errors.push(input);
            }
        }
    }

    info!(%report, "Conversion finished");
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    /// Writes a one-line STL on success; fails for names containing `bad`.
    #[derive(Default)]
    struct FakeTool {
        calls: RefCell<Vec<PathBuf>>,
        missing: bool,
    }

    impl ConverterTool for FakeTool {
        fn convert(&self, input: &Path, output: &Path) -> std::io::Result<ToolStatus> {
            self.calls.borrow_mut().push(input.to_path_buf());
            if self.missing {
                return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "ldview"));
            }
            if input.to_string_lossy().contains("bad") {
                return Ok(ToolStatus::Failed { code: Some(3) });
            }
            fs::write(output, "solid fake\nendsolid fake\n")?;
            Ok(ToolStatus::Success)
        }
    }

    fn library() -> (TempDir, ConvertConfig) {
        let dir = TempDir::new().unwrap();
        let parts = dir.path().join("ldraw").join("parts");
        fs::create_dir_all(&parts).unwrap();
        for name in ["3001.dat", "3020.dat", "bad1.dat", "3001p01.dat", "notes.txt"] {
            fs::write(parts.join(name), "0 part").unwrap();
        }
        let config = ConvertConfig::new(dir.path().join("ldraw"), dir.path().join("stl"))
            .with_allowed_dir(parts);
        (dir, config)
    }

    #[test]
    fn converts_and_records_failures() {
        let (_dir, config) = library();
        let tool = FakeTool::default();

        let report = convert_all(&config, &tool).unwrap();
        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].code, Some(3));
        assert_eq!(tool.calls.borrow().len(), 3);
        assert!(config.output_dir.join("3001.stl").exists());
    }

    #[test]
    fn second_run_skips_existing() {
        let (_dir, config) = library();
        convert_all(&config, &FakeTool::default()).unwrap();

        let tool = FakeTool::default();
        let report = convert_all(&config, &tool).unwrap();
        assert_eq!(report.skipped.len(), 2);
        // Only the failing file is retried
        assert_eq!(tool.calls.borrow().len(), 1);
    }

    #[test]
    fn missing_tool_keeps_going() {
        let (_dir, config) = library();
        let tool = FakeTool {
            missing: true,
            ..FakeTool::default()
        };
        let report = convert_all(&config, &tool).unwrap();
        assert_eq!(report.tool_missing.len(), 3);
        assert_eq!(report.invocations(), 0);
        assert!(report.to_string().contains("converter not found"));
    }

    #[test]
    fn empty_library_gives_empty_report() {
        let dir = TempDir::new().unwrap();
        let config = ConvertConfig::new(dir.path(), dir.path().join("out"))
            .with_allowed_dir(dir.path());
        let report = convert_all(&config, &FakeTool::default()).unwrap();
        assert!(report.is_empty());
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ConvertConfig::new(dir.path(), dir.path().join("out"));
        let err = convert_all(&config, &FakeTool::default()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig { .. }));
    }

    #[test]
    fn unusable_output_dir_is_the_only_io_failure() {
        let (dir, mut config) = library();
        let blocker = dir.path().join("stl_is_a_file");
        fs::write(&blocker, "").unwrap();
        config.output_dir = blocker.join("stl");

        let tool = FakeTool::default();
        let err = convert_all(&config, &tool).unwrap_err();
        assert!(matches!(err, ConvertError::OutputDir { ref path, .. } if *path == config.output_dir));
        assert!(tool.calls.borrow().is_empty());
    }

    #[test]
    fn report_display() {
        let report = ConversionReport {
            converted: vec![PathBuf::from("a.stl")],
            skipped: vec![PathBuf::from("b.dat"), PathBuf::from("c.dat")],
            ..ConversionReport::default()
        };
        assert_eq!(
            report.to_string(),
            "3 candidates: 1 converted, 2 skipped, 0 failed"
        );
    }
}
