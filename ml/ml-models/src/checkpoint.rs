//! Saving and restoring module weights with Burn's file recorders.
//!
//! The recorder is picked from the file extension: `.bin` for the compact
//! full-precision binary record, `.json` for a pretty-printed record that
//! can be inspected by hand. Both work for any [`Module`], so the same two
//! functions store whole classifiers and bare feature extractors.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinFileRecorder, FileRecorder, FullPrecisionSettings, PrettyJsonFileRecorder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};

/// Record layout on disk.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use ml_models::CheckpointFormat;
///
/// assert_eq!(
///     CheckpointFormat::from_path(Path::new("models/parts.json")),
///     Some(CheckpointFormat::Json)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointFormat {
    /// Full-precision binary record, `.bin`.
    #[default]
    Binary,
    /// Pretty JSON record, `.json`.
    Json,
}

impl CheckpointFormat {
    /// Format for an extension; recorders rewrite any other extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Self::Binary, Self::Json]
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }

    /// Format named by the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }

    /// Extension the recorder writes.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Binary => "binary",
            Self::Json => "json",
        })
    }
}

fn write_record<B, M, R>(model: &M, path: &Path, recorder: &R) -> Result<()>
where
    B: Backend,
    M: Module<B>,
    R: FileRecorder<B>,
{
    model
        .clone()
        .save_file(path.to_path_buf(), recorder)
        .map_err(|e| ModelError::save_failed(path, e))
}

fn read_record<B, M, R>(model: M, path: &Path, recorder: &R, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
    R: FileRecorder<B>,
{
    model
        .load_file(path.to_path_buf(), recorder, device)
        .map_err(|e| ModelError::load_failed(path, e))
}

/// Writes the weights of `model` next to `path`.
///
/// The extension of `path` is replaced with the format's own and missing
/// parent directories are created. Returns the file written.
///
/// # Errors
///
/// Returns [`ModelError::Io`] if the directory cannot be created and
/// [`ModelError::Record`] if the recorder fails.
pub fn save_checkpoint<B, M>(model: &M, path: &Path, format: CheckpointFormat) -> Result<PathBuf>
where
    B: Backend,
    M: Module<B>,
{
    let target = path.with_extension(format.extension());
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        CheckpointFormat::Binary => write_record::<B, M, _>(
            model,
            &target,
            &BinFileRecorder::<FullPrecisionSettings>::new(),
        )?,
        CheckpointFormat::Json => write_record::<B, M, _>(
            model,
            &target,
            &PrettyJsonFileRecorder::<FullPrecisionSettings>::new(),
        )?,
    }

    debug!(path = %target.display(), %format, "Checkpoint written");
    Ok(target)
}

/// Restores weights saved by [`save_checkpoint`] into `model`.
///
/// `model` supplies the architecture; it must match the one that was saved.
///
/// # Errors
///
/// Returns [`ModelError::CheckpointNotFound`], [`ModelError::UnsupportedFormat`]
/// for an extension other than `.bin`/`.json`, or [`ModelError::Record`] when
/// the record does not fit.
pub fn load_checkpoint<B, M>(model: M, path: &Path, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    if !path.is_file() {
        return Err(ModelError::not_found(path));
    }
    let format = CheckpointFormat::from_path(path).ok_or_else(|| ModelError::unsupported_format(path))?;

    let model = match format {
        CheckpointFormat::Binary => read_record::<B, M, _>(
            model,
            path,
            &BinFileRecorder::<FullPrecisionSettings>::new(),
            device,
        )?,
        CheckpointFormat::Json => read_record::<B, M, _>(
            model,
            path,
            &PrettyJsonFileRecorder::<FullPrecisionSettings>::new(),
            device,
        )?,
    };

    debug!(path = %path.display(), %format, "Checkpoint restored");
    Ok(model)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use burn::nn::{Linear, LinearConfig};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn weights(layer: &Linear<TestBackend>) -> Vec<f32> {
        layer.weight.val().into_data().iter::<f32>().collect()
    }

    #[test]
    fn extensions_pick_the_recorder() {
        assert_eq!(
            CheckpointFormat::from_path(Path::new("/models/parts.bin")),
            Some(CheckpointFormat::Binary)
        );
        assert_eq!(
            CheckpointFormat::from_extension("JSON"),
            Some(CheckpointFormat::Json)
        );
        assert_eq!(CheckpointFormat::from_extension("mpk"), None);
        assert_eq!(CheckpointFormat::from_path(Path::new("parts")), None);
        assert_eq!(CheckpointFormat::default().to_string(), "binary");
    }

    #[test]
    fn both_formats_restore_the_same_weights() {
        let device = <TestBackend as Backend>::Device::default();
        let tmp = tempfile::tempdir().unwrap();
        let head: Linear<TestBackend> = LinearConfig::new(4, 3).init(&device);

        for format in [CheckpointFormat::Binary, CheckpointFormat::Json] {
            let written =
                save_checkpoint::<TestBackend, _>(&head, &tmp.path().join("run/head.tmp"), format)
                    .unwrap();
            assert_eq!(written, tmp.path().join("run").join(format!("head.{}", format.extension())));

            let blank: Linear<TestBackend> = LinearConfig::new(4, 3).init(&device);
            let restored = load_checkpoint::<TestBackend, _>(blank, &written, &device).unwrap();
            assert_eq!(weights(&restored), weights(&head));
        }
    }

    #[test]
    fn unreadable_checkpoints() {
        let device = <TestBackend as Backend>::Device::default();
        let tmp = tempfile::tempdir().unwrap();
        let head: Linear<TestBackend> = LinearConfig::new(2, 2).init(&device);

        let absent = load_checkpoint::<TestBackend, _>(head.clone(), &tmp.path().join("no.bin"), &device);
        assert!(matches!(absent, Err(ModelError::CheckpointNotFound(_))));

        let onnx = tmp.path().join("head.onnx");
        std::fs::write(&onnx, b"\x08\x07").unwrap();
        let foreign = load_checkpoint::<TestBackend, _>(head.clone(), &onnx, &device);
        assert!(matches!(foreign, Err(ModelError::UnsupportedFormat(_))));

        let truncated = tmp.path().join("head.json");
        std::fs::write(&truncated, b"{ \"item\": ").unwrap();
        let broken = load_checkpoint::<TestBackend, _>(head, &truncated, &device);
        assert!(matches!(broken, Err(ModelError::Record { action: "load", .. })));
    }
}
