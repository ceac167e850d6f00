use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Name reported in `discovery_method`; there is exactly one strategy.
pub const DISCOVERY_METHOD: &str = "simple_active";

/// How an installation entered the discovery set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallSource {
    /// Listed in the settings file and verified on disk
    Known,
    /// Found through a running server process
    Active,
}

/// A directory believed to contain a working ComfyUI checkout.
///
/// Lives for one discovery pass. Two installations are the same when their
/// canonical `root_path` is equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub root_path: PathBuf,
    pub verified: bool,
    pub source: InstallSource,
}

impl Installation {
    pub fn known(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            verified: true,
            source: InstallSource::Known,
        }
    }

    pub fn active(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            verified: false,
            source: InstallSource::Active,
        }
    }
}

/// A log file with the modification time captured when it was ranked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFile {
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>, modified_at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            modified_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Outcome of one discovery pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Canonical installation roots, sorted and unique
    pub installations: BTreeSet<PathBuf>,
    /// Log files, most recently modified first. May contain duplicates.
    pub log_files: Vec<PathBuf>,
    /// Wall-clock duration of the pass in seconds
    #[serde(rename = "discovery_time")]
    pub elapsed_seconds: f64,
    /// Known paths that verified successfully
    pub known_count: usize,
    /// Installations reported by the process scanner
    pub active_count: usize,
    pub discovery_method: String,
}

impl Default for DiscoveryResult {
    fn default() -> Self {
        Self {
            installations: BTreeSet::new(),
            log_files: Vec::new(),
            elapsed_seconds: 0.0,
            known_count: 0,
            active_count: 0,
            discovery_method: DISCOVERY_METHOD.to_string(),
        }
    }
}

impl DiscoveryResult {
    pub fn is_empty(&self) -> bool {
        self.installations.is_empty() && self.log_files.is_empty()
    }

    /// Most recently modified log, if any
    pub fn latest_log(&self) -> Option<&Path> {
        self.log_files.first().map(PathBuf::as_path)
    }
}
