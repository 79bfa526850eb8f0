//! Pretrained extractor weights.
//!
//! Two sources are accepted:
//! - a torchvision `mobilenet_v2` state dict (`.pth`/`.pt`), read with
//!   `burn-import`'s PyTorch recorder; its `features.*` keys are renamed onto
//!   [`MobileNetV2`]'s fields and the `classifier.*` keys are left unused
//! - a record written by [`save_checkpoint`](crate::save_checkpoint)
//!   (`.bin`/`.json`)

use std::path::Path;

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, Recorder};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use tracing::debug;

use crate::checkpoint::load_checkpoint;
use crate::error::{ModelError, Result};
use crate::mobilenet::{INVERTED_RESIDUAL_SETTINGS, MobileNetV2, MobileNetV2Config, MobileNetV2Record};

/// Extensions read as PyTorch pickles.
const TORCH_EXTENSIONS: [&str; 2] = ["pth", "pt"];

fn rename(from: &str, to: &str) -> (String, String) {
    (format!(r"^{from}\.([a-z_]+)$"), format!("{to}.$1"))
}

/// Regex rules renaming torchvision `mobilenet_v2` keys to record keys.
///
/// torchvision numbers the stem `features.0`, the inverted residual blocks
/// `features.1` to `features.17` and the last 1×1 convolution `features.18`;
/// inside each, a convolution and its batch norm sit at consecutive indices.
/// The layout does not depend on the width multiplier.
///
/// # Example
///
/// ```
/// use ml_models::torchvision_key_remap;
///
/// let rules = torchvision_key_remap();
/// assert!(rules.contains(&(
///     r"^features\.18\.1\.([a-z_]+)$".to_string(),
///     "head.norm.$1".to_string()
/// )));
/// ```
#[must_use]
pub fn torchvision_key_remap() -> Vec<(String, String)> {
    let mut rules = vec![
        rename(r"features\.0\.0", "stem.conv"),
        rename(r"features\.0\.1", "stem.norm"),
    ];

    let expansions = INVERTED_RESIDUAL_SETTINGS
        .iter()
        .flat_map(|&(expansion, _, repeats, _)| std::iter::repeat_n(expansion, repeats));
    for (block, expansion) in expansions.enumerate() {
        let torch = format!(r"features\.{}\.conv", block + 1);
        let ours = format!("blocks.{block}");
        let layers: &[(&str, &str)] = if expansion == 1 {
            &[
                (r"0\.0", "depthwise.conv"),
                (r"0\.1", "depthwise.norm"),
                ("1", "project.conv"),
                ("2", "project.norm"),
            ]
        } else {
            &[
                (r"0\.0", "expand.conv"),
                (r"0\.1", "expand.norm"),
                (r"1\.0", "depthwise.conv"),
                (r"1\.1", "depthwise.norm"),
                ("2", "project.conv"),
                ("3", "project.norm"),
            ]
        };
        rules.extend(
            layers
                .iter()
                .map(|(from, to)| rename(&format!(r"{torch}\.{from}"), &format!("{ours}.{to}"))),
        );
    }

    let blocks: usize = INVERTED_RESIDUAL_SETTINGS.iter().map(|&(_, _, repeats, _)| repeats).sum();
    let head = blocks + 1;
    rules.push(rename(&format!(r"features\.{head}\.0"), "head.conv"));
    rules.push(rename(&format!(r"features\.{head}\.1"), "head.norm"));
    rules
}

/// Loads a torchvision `mobilenet_v2` state dict into a fresh extractor.
///
/// # Errors
///
/// Returns [`ModelError::InvalidConfig`] unless the width multiplier is 1.0
/// (the only width torchvision publishes), [`ModelError::CheckpointNotFound`]
/// for a missing file and [`ModelError::Record`] when the file cannot be read
/// or its tensors do not fit.
pub fn load_torchvision<B: Backend>(
    config: &MobileNetV2Config,
    path: &Path,
    device: &B::Device,
) -> Result<MobileNetV2<B>> {
    if (config.width_multiplier - 1.0).abs() > f32::EPSILON {
        return Err(ModelError::invalid_config(format!(
            "torchvision weights need width_multiplier 1.0, not {}",
            config.width_multiplier
        )));
    }
    if !path.is_file() {
        return Err(ModelError::not_found(path));
    }

    let args = torchvision_key_remap()
        .iter()
        .fold(LoadArgs::new(path.to_path_buf()), |args, (pattern, replacement)| {
            args.with_key_remap(pattern, replacement)
        });
    let record: MobileNetV2Record<B> = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .map_err(|e| ModelError::load_failed(path, e))?;

    debug!(path = %path.display(), "torchvision weights restored");
    Ok(config.init(device).load_record(record))
}

/// Loads extractor weights, picking the reader from the extension of `path`.
///
/// `.pth` and `.pt` go to [`load_torchvision`]; anything else to
/// [`load_checkpoint`].
///
/// # Errors
///
/// See [`load_torchvision`] and [`load_checkpoint`].
pub fn load_backbone<B: Backend>(
    config: &MobileNetV2Config,
    path: &Path,
    device: &B::Device,
) -> Result<MobileNetV2<B>> {
    let torch = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TORCH_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)));
    if torch {
        load_torchvision(config, path, device)
    } else {
        load_checkpoint::<B, _>(config.init(device), path, device)
    }
}
