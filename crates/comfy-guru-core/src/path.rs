use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "comfy-guru";

/// Resolve a configuration file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. `env_var` environment variable (with tilde expansion)
/// 3. System config directory (`<config_dir>/comfy-guru/<file_name>`)
/// 4. ~/.comfy-guru/<file_name> (fallback for systems without a config directory)
pub fn resolve_config_file(
    explicit_path: Option<&str>,
    env_var: &str,
    file_name: &str,
) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var(env_var)
        && !env_path.trim().is_empty()
    {
        return Ok(expand_tilde(env_path.trim()));
    }

    Ok(config_dir()?.join(file_name))
}

/// Directory holding the default settings and pattern catalog
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Ok(dir.join(APP_DIR_NAME));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(format!(".{}", APP_DIR_NAME)));
    }

    Err(Error::Config(
        "Could not determine config directory: no HOME directory or system config directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Normalize a path for comparison (resolve to absolute, canonicalize if possible)
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Check if two paths are equivalent after normalization
pub fn paths_equal(path1: &Path, path2: &Path) -> bool {
    normalize_path(path1) == normalize_path(path2)
}

/// Last modification time, or `None` when the file is gone or unreadable
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Modification time for ranking. Missing files rank as the Unix epoch.
pub fn modified_at_or_epoch(path: &Path) -> DateTime<Utc> {
    match modified_time(path) {
        Some(time) => DateTime::<Utc>::from(time),
        None => {
            tracing::debug!(path = %path.display(), "no modification time, ranking as oldest");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_file(
            Some("/etc/comfy/settings.env"),
            "COMFY_GURU_TEST_UNUSED",
            "settings.env",
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/etc/comfy/settings.env"));
    }

    #[test]
    fn test_env_var_used_when_no_explicit_path() {
        let var = "COMFY_GURU_TEST_RESOLVE_ENV";
        unsafe {
            std::env::set_var(var, "/tmp/from-env.json");
        }

        let path = resolve_config_file(None, var, "error_patterns.json").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/from-env.json"));

        unsafe {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_lands_in_app_config_dir() {
        let path =
            resolve_config_file(None, "COMFY_GURU_TEST_NEVER_SET", "settings.env").unwrap();
        assert!(path.ends_with("settings.env"));
        assert!(
            path.parent()
                .and_then(|p| p.file_name())
                .is_some_and(|name| name.to_string_lossy().contains(APP_DIR_NAME))
        );
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/opt/ComfyUI"), PathBuf::from("/opt/ComfyUI"));
        assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_expand_tilde_uses_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/ComfyUI"), home.join("ComfyUI"));
        }
    }

    #[test]
    fn test_paths_equal_through_dot_segments() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a");
        std::fs::create_dir_all(&nested).unwrap();

        assert!(paths_equal(&nested, &temp_dir.path().join("a/../a")));
    }

    #[test]
    fn test_missing_file_ranks_as_epoch() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.log");
        assert_eq!(modified_at_or_epoch(&missing), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_modified_at_reflects_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("comfyui.log");
        std::fs::write(&log, "hello\n").unwrap();
        filetime::set_file_mtime(&log, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

        assert_eq!(modified_at_or_epoch(&log).timestamp(), 1_700_000_000);
    }
}
