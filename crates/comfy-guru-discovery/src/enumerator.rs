use crate::Result;
use std::path::{Path, PathBuf};

/// File name patterns ComfyUI launchers commonly write to
pub const LOG_FILE_PATTERNS: [&str; 5] = [
    "*.log",
    "console.txt",
    "output.txt",
    "stderr.txt",
    "stdout.txt",
];

/// Subdirectory checked in addition to the installation root
pub const LOGS_SUBDIR: &str = "logs";

/// Log files at the top of `installation` and in `installation/logs`.
///
/// Only regular files are returned (a symlink to a file counts). Nothing
/// deeper than `logs/` is searched and no deduplication happens here.
pub fn enumerate_logs(installation: &Path) -> Result<Vec<PathBuf>> {
    let mut logs = collect_in(installation)?;

    let logs_dir = installation.join(LOGS_SUBDIR);
    if logs_dir.is_dir() {
        logs.extend(collect_in(&logs_dir)?);
    }

    Ok(logs)
}

fn collect_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let mut logs = Vec::new();

    for pattern in LOG_FILE_PATTERNS {
        let full = Path::new(&escaped).join(pattern);
        for entry in glob::glob(&full.to_string_lossy())? {
            match entry {
                Ok(path) if path.is_file() => logs.push(path),
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable glob entry");
                }
            }
        }
    }

    Ok(logs)
}
