//! Candidate discovery.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Returns `true` if `name` is an LDraw part file worth converting.
///
/// The name must end in `.dat` (case-sensitive) and contain none of the
/// excluded substrings.
///
/// # Example
///
/// ```
/// use ldraw_convert::is_candidate_name;
///
/// let excluded = ["s0", "--", "p0"];
/// assert!(is_candidate_name("3001.dat", &excluded));
/// assert!(!is_candidate_name("3001s01.dat", &excluded));
/// assert!(!is_candidate_name("3001.DAT", &excluded));
/// ```
#[must_use]
pub fn is_candidate_name<S: AsRef<str>>(name: &str, excluded: &[S]) -> bool {
    name.ends_with(".dat") && !excluded.iter().any(|x| name.contains(x.as_ref()))
}

/// Output path for an input part file: `<output_dir>/<stem>.stl`.
#[must_use]
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .unwrap_or(input.as_os_str())
        .to_os_string();
    name.push(".stl");
    output_dir.join(name)
}

/// `path` with `.` components dropped; `./parts` and `parts` name the same
/// directory.
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Walks `input_root` and collects every candidate file that sits directly
/// inside one of `allowed_dirs`.
///
/// Directories are compared after dropping `.` components, but otherwise
/// literally, so allowed dirs must share the input root's prefix. The result
/// is a sorted set, so a file reachable twice is only converted once.
/// Unreadable entries are logged and skipped.
#[must_use]
pub fn collect_candidates<S: AsRef<str>>(
    input_root: &Path,
    allowed_dirs: &[PathBuf],
    excluded: &[S],
) -> BTreeSet<PathBuf> {
    let allowed: Vec<PathBuf> = allowed_dirs.iter().map(|d| without_cur_dir(d)).collect();
    let mut candidates = BTreeSet::new();

    for entry in WalkDir::new(input_root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            debug!(dir = %entry.path().display(), "Scanning directory");
            continue;
        }

        let path = entry.path();
        let Some(parent) = path.parent() else {
            continue;
        };
        let parent = without_cur_dir(parent);
        if !allowed.contains(&parent) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if is_candidate_name(&name, excluded) {
            candidates.insert(path.to_path_buf());
        }
    }

    debug!(count = candidates.len(), "Collected candidate part files");
    candidates
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EXCLUDED: [&str; 3] = ["s0", "--", "p0"];

    #[test]
    fn candidate_names() {
        assert!(is_candidate_name("3001.dat", &EXCLUDED));
        assert!(is_candidate_name("3626cp01.dat", &EXCLUDED));
        assert!(!is_candidate_name("973p01.dat", &EXCLUDED));
        assert!(!is_candidate_name("4-4--edge.dat", &EXCLUDED));
        assert!(!is_candidate_name("3001s02.dat", &EXCLUDED));
        assert!(!is_candidate_name("3001.ldr", &EXCLUDED));
        assert!(!is_candidate_name("readme.txt", &EXCLUDED));
    }

    #[test]
    fn output_path_is_flat() {
        let out = output_path_for(Path::new("/lib/parts/3001.dat"), Path::new("/stl"));
        assert_eq!(out, PathBuf::from("/stl/3001.stl"));
    }

    #[test]
    fn output_path_keeps_dotted_stems() {
        let out = output_path_for(Path::new("parts/u9001.v2.dat"), Path::new("stl"));
        assert_eq!(out, PathBuf::from("stl/u9001.v2.stl"));
    }

    #[test]
    fn only_direct_children_of_allowed_dirs() {
        let root = TempDir::new().unwrap();
        let parts = root.path().join("parts");
        let nested = parts.join("s");
        let other = root.path().join("p");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(&other).unwrap();

        fs::write(parts.join("3001.dat"), "0 Brick 2 x 4").unwrap();
        fs::write(parts.join("3001s01.dat"), "0 ~Sub").unwrap();
        fs::write(nested.join("3002.dat"), "0 nested").unwrap();
        fs::write(other.join("4-4edge.dat"), "0 prim").unwrap();

        let found = collect_candidates(root.path(), &[parts.clone()], &EXCLUDED);
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![parts.join("3001.dat")]);
    }

    #[test]
    fn leading_dot_does_not_hide_a_directory() {
        assert_eq!(
            without_cur_dir(Path::new("./ldraw_collection/parts")),
            PathBuf::from("ldraw_collection/parts")
        );
        assert_eq!(without_cur_dir(Path::new("/lib/./parts")), PathBuf::from("/lib/parts"));
        assert_eq!(without_cur_dir(Path::new(".")), PathBuf::new());
    }

    #[test]
    fn missing_root_yields_nothing() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");
        let found = collect_candidates(&missing, &[missing.clone()], &EXCLUDED);
        assert!(found.is_empty());
    }
}
