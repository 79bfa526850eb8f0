//! Renders a directory of part meshes.

use std::fs;
use std::path::{Path, PathBuf};

use mesh_io::{is_stl_path, load_stl};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::angles::rotation_from_degrees;
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::scene::Scene;
use crate::whitelist::{Whitelist, normalize_name};

/// Images written for one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPart {
    /// Normalized part name.
    pub name: String,
    /// Files written, in view order.
    pub images: Vec<PathBuf>,
}

/// Outcome of a render batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Parts rendered, in file order.
    pub rendered: Vec<RenderedPart>,
    /// Normalized names of meshes not on the whitelist.
    pub skipped: Vec<String>,
}

impl RenderReport {
    /// Total images written.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.rendered.iter().map(|part| part.images.len()).sum()
    }
}

/// Lists `*.stl` files directly inside `dir`, sorted.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_meshes(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut meshes = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_stl_path(&path) {
            meshes.push(path);
        }
    }
    meshes.sort();
    Ok(meshes)
}

/// Renders every allowed mesh in `config.mesh_dir` from every angle of the
/// configured table.
///
/// Any load or write error stops the batch; images already written stay on
/// disk.
///
/// # Errors
///
/// Returns an error if the config is invalid, the whitelist or mesh
/// directory cannot be read, a mesh fails to parse, or an image cannot be
/// written.
pub fn render_directory(config: &RenderConfig) -> Result<RenderReport> {
    config.validate()?;

    let whitelist = match &config.whitelist {
        Some(path) => {
            let whitelist = Whitelist::load(path)?;
            info!(path = %path.display(), names = whitelist.len(), "Loaded whitelist");
            Some(whitelist)
        }
        None => None,
    };

    fs::create_dir_all(&config.output_dir)?;
    let mut scene = Scene::from_config(config);
    let mut report = RenderReport::default();

    for path in list_meshes(&config.mesh_dir)? {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = normalize_name(&stem);

        if whitelist.as_ref().is_some_and(|w| !w.allows(&name)) {
            debug!(file = %path.display(), "Not on the whitelist, skipping");
            report.skipped.push(name);
            continue;
        }

        info!(part = %name, "Rendering part");
        let mesh = load_stl(&path).map_err(|source| RenderError::Mesh {
            path: path.clone(),
            source,
        })?;
        if mesh.is_empty() {
            warn!(part = %name, "Mesh has no faces, views will be blank");
        }

        scene.add_part(name.clone(), mesh);
        scene.fit_camera(config.framing, config.padding);
        fs::create_dir_all(config.layout.part_dir(&config.output_dir, &stem))?;

        let mut images = Vec::with_capacity(config.angles.len());
        for (index, angles) in config.angles.angles().iter().enumerate() {
            debug!(part = %name, view = index, ?angles, "Rendering view");
            scene.set_rotation(rotation_from_degrees(*angles));
            let image_path = config.layout.image_path(&config.output_dir, &stem, index);
            scene.render_to(&image_path)?;
            images.push(image_path);
        }

        scene.remove_part();
        info!(part = %name, views = images.len(), "Part done");
        report.rendered.push(RenderedPart { name, images });
    }

    info!(
        parts = report.rendered.len(),
        images = report.image_count(),
        skipped = report.skipped.len(),
        "Rendering complete"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::angles::AngleTable;
    use mesh_io::{StlEncoding, save_stl};
    use mesh_types::unit_cube;
    use tempfile::TempDir;

    #[test]
    fn list_meshes_sorted_lowercase_only() {
        let dir = TempDir::new().unwrap();
        for name in ["b.stl", "a.stl", "c.STL", "d.dat"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.stl")).unwrap();

        let meshes = list_meshes(dir.path()).unwrap();
        assert_eq!(
            meshes,
            vec![dir.path().join("a.stl"), dir.path().join("b.stl")]
        );
    }

    #[test]
    fn without_whitelist_renders_all() {
        let dir = TempDir::new().unwrap();
        let meshes = dir.path().join("stl");
        fs::create_dir(&meshes).unwrap();
        save_stl(&unit_cube(), meshes.join("3001.stl"), StlEncoding::Binary).unwrap();
        save_stl(&unit_cube(), meshes.join("3024.stl"), StlEncoding::Ascii).unwrap();

        let config = RenderConfig::new(&meshes, dir.path().join("out"))
            .without_whitelist()
            .with_angles(AngleTable::Survey)
            .with_size(32, 24);
        let report = render_directory(&config).unwrap();

        assert_eq!(report.rendered.len(), 2);
        assert_eq!(report.image_count(), 16);
        assert!(dir.path().join("out/3024/3024_view_7.png").is_file());
    }

    #[test]
    fn corrupt_mesh_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.stl"), "solid x\nfacet\nouter loop\nvertex 1 2\n").unwrap();
        let config = RenderConfig::new(dir.path(), dir.path().join("out"))
            .without_whitelist()
            .with_angles(AngleTable::Survey);
        let err = render_directory(&config).unwrap_err();
        assert!(matches!(err, RenderError::Mesh { .. }));
    }

    #[test]
    fn missing_whitelist_aborts() {
        let dir = TempDir::new().unwrap();
        let config = RenderConfig::new(dir.path(), dir.path().join("out"))
            .with_whitelist(dir.path().join("whitelist_parts.txt"));
        assert!(matches!(
            render_directory(&config),
            Err(RenderError::Whitelist { .. })
        ));
    }
}
