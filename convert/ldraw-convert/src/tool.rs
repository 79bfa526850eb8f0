//! External converter invocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::ConvertConfig;

/// How a single converter run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Exit code zero.
    Success,
    /// Non-zero exit, or killed by a signal (`code` is `None`).
    Failed {
        /// Process exit code, if any.
        code: Option<i32>,
    },
}

/// Converts one LDraw file to one STL file.
///
/// Implementations report a missing executable as an
/// [`std::io::ErrorKind::NotFound`] error; every other outcome of a run that
/// actually started is a [`ToolStatus`].
pub trait ConverterTool {
    /// Converts `input` into `output`.
    ///
    /// # Errors
    ///
    /// Returns the error raised while starting the tool.
    fn convert(&self, input: &Path, output: &Path) -> std::io::Result<ToolStatus>;
}

/// The LDView command-line exporter.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use ldraw_convert::LdviewTool;
///
/// let tool = LdviewTool::new("LDView64");
/// let args = tool.args(Path::new("3001.dat"), Path::new("out/3001.stl"));
/// assert_eq!(args[1], "-ExportFile=out/3001.stl");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdviewTool {
    executable: PathBuf,
    width: u32,
    height: u32,
}

impl LdviewTool {
    /// Creates a tool with the default 800x600 save size.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            width: 800,
            height: 600,
        }
    }

    /// Creates a tool from the executable and size in a config.
    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            executable: config.ldview_path.clone(),
            width: config.save_width,
            height: config.save_height,
        }
    }

    /// The executable this tool runs.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments passed to LDView, input first.
    #[must_use]
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut export = OsString::from("-ExportFile=");
        export.push(output);
        vec![
            input.as_os_str().to_os_string(),
            export,
            OsString::from("-ExportFormat=STL"),
            OsString::from("-AutoCrop"),
            OsString::from(format!("-SaveWidth={}", self.width)),
            OsString::from(format!("-SaveHeight={}", self.height)),
        ]
    }
}

impl ConverterTool for LdviewTool {
    fn convert(&self, input: &Path, output: &Path) -> std::io::Result<ToolStatus> {
        let args = self.args(input, output);
        debug!(exe = %self.executable.display(), ?args, "Running LDView");

        let status = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .status()?;

        if status.success() {
            Ok(ToolStatus::Success)
        } else {
            Ok(ToolStatus::Failed {
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_line_matches_ldview_export() {
        let tool = LdviewTool::new("ldview");
        let args = tool.args(Path::new("parts/3001.dat"), Path::new("stl/3001.stl"));
        let args: Vec<_> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            [
                "parts/3001.dat",
                "-ExportFile=stl/3001.stl",
                "-ExportFormat=STL",
                "-AutoCrop",
                "-SaveWidth=800",
                "-SaveHeight=600",
            ]
        );
    }

    #[test]
    fn size_comes_from_config() {
        let config = ConvertConfig::default()
            .with_ldview_path("LDView64.exe")
            .with_size(1024, 768);
        let tool = LdviewTool::from_config(&config);
        assert_eq!(tool.executable(), Path::new("LDView64.exe"));

        let args = tool.args(Path::new("a.dat"), Path::new("a.stl"));
        assert_eq!(args[4], "-SaveWidth=1024");
        assert_eq!(args[5], "-SaveHeight=768");
    }

    #[test]
    fn missing_executable_is_not_found() {
        let tool = LdviewTool::new("/definitely/not/here/ldview-brickscan");
        let err = tool
            .convert(Path::new("a.dat"), Path::new("a.stl"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failed() {
        let tool = LdviewTool::new("false");
        let status = tool.convert(Path::new("a.dat"), Path::new("a.stl")).unwrap();
        assert!(matches!(status, ToolStatus::Failed { code: Some(1) }));
    }
}
