//! Whitelist filtering and output layout of a full render batch.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;

use mesh_io::{StlEncoding, save_stl};
use mesh_types::{IndexedMesh, Vector3, unit_cube};
use render_scene::{AngleTable, CameraFraming, OutputLayout, RenderConfig, render_directory};
use tempfile::TempDir;

fn part(scale: Vector3<f64>) -> IndexedMesh {
    let mut mesh = unit_cube();
    for v in &mut mesh.vertices {
        v.coords.component_mul_assign(&scale);
    }
    mesh.translate(Vector3::new(40.0, -12.0, 3.0));
    mesh
}

fn stl_collection(root: &Path) -> std::path::PathBuf {
    let dir = root.join("stl_collection");
    fs::create_dir_all(&dir).unwrap();
    save_stl(&part(Vector3::new(16.0, 32.0, 9.6)), dir.join("Brick2x4.stl"), StlEncoding::Binary).unwrap();
    save_stl(&part(Vector3::new(8.0, 8.0, 3.2)), dir.join("Plate1x1.stl"), StlEncoding::Binary).unwrap();
    save_stl(&part(Vector3::new(16.0, 16.0, 8.0)), dir.join("Wheel16.stl"), StlEncoding::Binary).unwrap();
    dir
}

#[test]
fn whitelisted_parts_are_rendered_per_class() {
    let work = TempDir::new().unwrap();
    let meshes = stl_collection(work.path());
    let whitelist = work.path().join("whitelist_parts.txt");
    fs::write(&whitelist, "Brick2x4, Plate1x1").unwrap();
    let out = work.path().join("test_data");

    let config = RenderConfig::new(&meshes, &out)
        .with_whitelist(&whitelist)
        .with_angles(AngleTable::Survey)
        .with_size(40, 30);
    let report = render_directory(&config).unwrap();

    let names: Vec<_> = report.rendered.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["brick2x4", "plate1x1"]);
    assert_eq!(report.skipped, ["wheel16"]);

    for i in 0..8 {
        assert!(out.join(format!("brick2x4/brick2x4_view_{i}.png")).is_file());
    }
    assert!(!out.join("wheel16").exists());

    let image = image::open(out.join("brick2x4/brick2x4_view_0.png")).unwrap();
    assert_eq!((image.width(), image.height()), (40, 30));
}

#[test]
fn tilted_table_names_ninety_one_views() {
    let work = TempDir::new().unwrap();
    let meshes = stl_collection(work.path());
    let whitelist = work.path().join("whitelist_parts.txt");
    fs::write(&whitelist, "plate1x1\n").unwrap();
    let out = work.path().join("test_data");

    let config = RenderConfig::new(&meshes, &out)
        .with_whitelist(&whitelist)
        .with_size(16, 12);
    let report = render_directory(&config).unwrap();

    assert_eq!(report.image_count(), 91);
    assert!(out.join("plate1x1/plate1x1_view_90.png").is_file());
    assert!(!out.join("plate1x1/plate1x1_view_91.png").exists());
}

#[test]
fn rendering_is_deterministic() {
    let work = TempDir::new().unwrap();
    let meshes = stl_collection(work.path());
    let first = work.path().join("first");
    let second = work.path().join("second");

    for out in [&first, &second] {
        let config = RenderConfig::new(&meshes, out)
            .without_whitelist()
            .with_angles(AngleTable::Survey)
            .with_layout(OutputLayout::Flat)
            .with_framing(CameraFraming::MaxExtent)
            .with_size(24, 18);
        render_directory(&config).unwrap();
    }

    for name in ["Brick2x4_view_0.png", "Wheel16_view_5.png"] {
        let a = fs::read(first.join(name)).unwrap();
        let b = fs::read(second.join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}
