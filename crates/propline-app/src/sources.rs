// Filesystem inputs: projection exports and screenshot enumeration.

use std::path::{Path, PathBuf};

/// Read one projection export as text.
pub fn read_projection_text(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Files directly under `dir` whose extension matches one of `extensions`
/// (case-insensitive), in sorted path order. Subdirectories are not walked.
pub fn discover_images(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if matches {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}
