use std::path::Path;

/// Files expected at the root of a ComfyUI checkout
pub const MARKER_FILES: [&str; 3] = ["main.py", "nodes.py", "execution.py"];

/// Markers that must be present for a directory to count as an installation.
///
/// Two of three keeps forks and trimmed layouts in; a stray directory with
/// two generically named files will also pass.
pub const MIN_MARKERS: usize = 2;

/// Check if `path` looks like a ComfyUI installation
pub fn verify_installation(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }

    let found = MARKER_FILES
        .iter()
        .filter(|marker| path.join(marker).exists())
        .count();

    found >= MIN_MARKERS
}
