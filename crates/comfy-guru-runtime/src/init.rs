use crate::Result;
use crate::settings::SETTINGS_TEMPLATE;
use comfy_guru_engine::BUNDLED_CATALOG;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Created(PathBuf),
    /// Left untouched
    Existing(PathBuf),
}

impl FileStatus {
    pub fn path(&self) -> &Path {
        match self {
            FileStatus::Created(path) | FileStatus::Existing(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResult {
    pub settings: FileStatus,
    pub patterns: FileStatus,
}

pub struct InitService;

impl InitService {
    /// Write the settings template and bundled catalog where they are missing
    pub fn run(settings_path: &Path, patterns_path: &Path) -> Result<InitResult> {
        Ok(InitResult {
            settings: write_if_missing(settings_path, SETTINGS_TEMPLATE)?,
            patterns: write_if_missing(patterns_path, BUNDLED_CATALOG)?,
        })
    }
}

fn write_if_missing(path: &Path, content: &str) -> Result<FileStatus> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "keeping existing file");
        return Ok(FileStatus::Existing(path.to_path_buf()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "created");
    Ok(FileStatus::Created(path.to_path_buf()))
}
