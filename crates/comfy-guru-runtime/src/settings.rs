use crate::{Error, Result};
use comfy_guru_core::{expand_tilde, resolve_config_file};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "settings.env";
pub const SETTINGS_ENV_VAR: &str = "COMFY_GURU_SETTINGS";
pub const PATTERNS_FILE_NAME: &str = "error_patterns.json";
pub const PATTERNS_ENV_VAR: &str = "COMFY_GURU_PATTERNS";

/// Settings key (and environment variable) holding comma-separated installation roots
pub const PATHS_KEY: &str = "COMFYUI_PATHS";

/// Starting point written by `init`
pub const SETTINGS_TEMPLATE: &str = "\
# comfy-guru settings
#
# Comma-separated ComfyUI installation roots. Running servers started with
# --listen or --port are found automatically; list installations here to
# include them when ComfyUI is not running.
#
# COMFYUI_PATHS=~/ComfyUI,/opt/ComfyUI
COMFYUI_PATHS=
";

/// Settings file path: explicit → `COMFY_GURU_SETTINGS` → config dir
pub fn resolve_settings_path(explicit: Option<&str>) -> Result<PathBuf> {
    Ok(resolve_config_file(
        explicit,
        SETTINGS_ENV_VAR,
        SETTINGS_FILE_NAME,
    )?)
}

/// Pattern catalog path: explicit → `COMFY_GURU_PATTERNS` → config dir
pub fn resolve_patterns_path(explicit: Option<&str>) -> Result<PathBuf> {
    Ok(resolve_config_file(
        explicit,
        PATTERNS_ENV_VAR,
        PATTERNS_FILE_NAME,
    )?)
}

/// Values read from the settings file, fixed for the life of the process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub known_paths: Vec<PathBuf>,
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Load `path`. A missing file gives empty settings.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, relying on process scan");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|err| Error::Config(format!("{}: {}", path.display(), config_message(err))))
    }

    /// Parse `KEY=value` lines; `#` comments and blank lines are skipped
    pub fn parse(content: &str) -> Result<Self> {
        let mut values = BTreeMap::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::Config(format!(
                    "line {}: expected KEY=value, got {:?}",
                    index + 1,
                    line
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Config(format!("line {}: empty key", index + 1)));
            }
            values.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        let known_paths = values
            .get(PATHS_KEY)
            .map(|list| parse_path_list(list))
            .unwrap_or_default();

        Ok(Self {
            known_paths,
            values,
        })
    }

    /// Append paths from the `COMFYUI_PATHS` environment variable
    pub fn with_env_paths(mut self) -> Self {
        if let Ok(list) = std::env::var(PATHS_KEY) {
            self.known_paths.extend(parse_path_list(&list));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Split a comma-separated list, dropping blanks and expanding `~`
pub fn parse_path_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(expand_tilde)
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn config_message(err: Error) -> String {
    match err {
        Error::Config(msg) => msg,
        other => other.to_string(),
    }
}
