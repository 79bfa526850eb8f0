//! Project settings read from `brickscan.toml`.
//!
//! Every stage section is optional and falls back to the stage's defaults.
//! Relative paths are resolved against `root`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ldraw_convert::ConvertConfig;
use ml_dataset::SplitConfig;
use ml_training::TrainingConfig;
use render_scene::RenderConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "brickscan.toml";

/// Prediction defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictSettings {
    /// Image to classify.
    pub image: PathBuf,
    /// Saved classifier; falls back to `[train] checkpoint`.
    pub checkpoint: Option<PathBuf>,
}

impl Default for PredictSettings {
    fn default() -> Self {
        Self {
            image: PathBuf::from("test_brick.png"),
            checkpoint: None,
        }
    }
}

/// All stage configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Project directory the stage paths are relative to; empty means the
    /// working directory.
    pub root: PathBuf,
    /// `[convert]` section.
    pub convert: ConvertConfig,
    /// `[render]` section.
    pub render: RenderConfig,
    /// `[split]` section.
    pub split: SplitConfig,
    /// `[train]` section.
    pub train: TrainingConfig,
    /// `[predict]` section.
    pub predict: PredictSettings,
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid settings")
    }

    /// Loads `path`, or `brickscan.toml` if present, or the defaults.
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !default.is_file() {
                    info!("No settings file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        info!(path = %path.display(), "Loading settings");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Resolves every stage path against [`root`](Self::root).
    ///
    /// Absolute paths are kept as they are. The LDView executable is left
    /// alone so it can still be found on `PATH`.
    #[must_use]
    pub fn rooted(mut self) -> Self {
        let root = self.root.clone();
        let join = |path: &mut PathBuf| *path = root.join(&*path);

        join(&mut self.convert.input_root);
        join(&mut self.convert.output_dir);
        self.convert.allowed_dirs.iter_mut().for_each(join);

        join(&mut self.render.mesh_dir);
        join(&mut self.render.output_dir);
        self.render.whitelist.iter_mut().for_each(join);

        join(&mut self.split.source_dir);
        join(&mut self.split.dest_dir);

        join(&mut self.train.data_dir);
        self.train.backbone_weights.iter_mut().for_each(join);
        self.train.checkpoint.iter_mut().for_each(join);

        join(&mut self.predict.image);
        self.predict.checkpoint.iter_mut().for_each(join);
        self
    }

    /// Resolves a path given on the command line against
    /// [`root`](Self::root), the way [`rooted`](Self::rooted) treats the
    /// file's paths.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Checkpoint used for prediction, if any is configured.
    #[must_use]
    pub fn predict_checkpoint(&self) -> Option<&Path> {
        self.predict
            .checkpoint
            .as_deref()
            .or(self.train.checkpoint.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ml_training::EvaluationSplit;
    use render_scene::{AngleTable, OutputLayout};

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.train.epochs, 6);
        assert_eq!(settings.split.dest_dir, PathBuf::from("train_val_split"));
    }

    #[test]
    fn sections_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            root = "/data/lego"

            [convert]
            allowed_dirs = ["ldraw_collection/parts"]
            save_width = 640

            [render]
            angles = "survey"
            layout = "flat"

            [split]
            seed = 42

            [train]
            epochs = 10
            evaluation_split = "train"
            checkpoint = "models/parts.bin"
            "#,
        )
        .unwrap();

        assert_eq!(settings.convert.save_width, 640);
        assert_eq!(settings.convert.save_height, 600);
        assert_eq!(settings.render.angles, AngleTable::Survey);
        assert_eq!(settings.render.layout, OutputLayout::Flat);
        assert_eq!(settings.split.seed, Some(42));
        assert_eq!(settings.train.evaluation_split, EvaluationSplit::Train);

        let rooted = settings.rooted();
        assert_eq!(
            rooted.convert.allowed_dirs,
            vec![PathBuf::from("/data/lego/ldraw_collection/parts")]
        );
        assert_eq!(rooted.render.mesh_dir, PathBuf::from("/data/lego/stl_collection"));
        assert_eq!(
            rooted.render.whitelist,
            Some(PathBuf::from("/data/lego/whitelist_parts.txt"))
        );
        assert_eq!(rooted.convert.ldview_path, PathBuf::from("ldview"));
        assert_eq!(
            rooted.predict_checkpoint(),
            Some(Path::new("/data/lego/models/parts.bin"))
        );
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(Settings::from_toml("[blender]\nsamples = 4").is_err());
    }

    #[test]
    fn absolute_paths_survive_rooting() {
        let mut settings = Settings::default();
        settings.root = PathBuf::from("project");
        settings.split.source_dir = PathBuf::from("/mnt/renders");

        let rooted = settings.rooted();
        assert_eq!(rooted.split.source_dir, PathBuf::from("/mnt/renders"));
        assert_eq!(rooted.split.dest_dir, PathBuf::from("project/train_val_split"));
    }

    #[test]
    fn flag_paths_resolve_like_file_paths() {
        let mut settings = Settings::default();
        settings.root = PathBuf::from("/data");
        settings.convert.allowed_dirs = vec![PathBuf::from("ldraw_collection/parts")];
        let rooted = settings.rooted();

        assert_eq!(
            rooted.resolve("ldraw_collection/parts"),
            rooted.convert.allowed_dirs[0]
        );
        assert_eq!(rooted.resolve("/mnt/parts"), PathBuf::from("/mnt/parts"));
        assert_eq!(Settings::default().resolve("a.png"), PathBuf::from("a.png"));
    }

    #[test]
    fn predict_checkpoint_prefers_its_own_section() {
        let mut settings = Settings::default();
        assert!(settings.predict_checkpoint().is_none());

        settings.train.checkpoint = Some(PathBuf::from("a.bin"));
        assert_eq!(settings.predict_checkpoint(), Some(Path::new("a.bin")));

        settings.predict.checkpoint = Some(PathBuf::from("b.json"));
        assert_eq!(settings.predict_checkpoint(), Some(Path::new("b.json")));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("none.toml"))).is_err());
    }
}
