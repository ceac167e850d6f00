use crate::enumerator::enumerate_logs;
use crate::process::{ProcessLister, SystemProcessLister};
use crate::scanner::ActiveScanner;
use crate::verifier::verify_installation;
use comfy_guru_core::{modified_at_or_epoch, normalize_path};
use comfy_guru_types::{DiscoveryResult, Installation, LogFile};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// Inputs for a discovery pass, fixed at construction
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Installation roots from the settings file
    pub known_paths: Vec<PathBuf>,
    /// Whether to look for running ComfyUI servers
    pub scan_processes: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            known_paths: Vec::new(),
            scan_processes: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_known_paths(known_paths: Vec<PathBuf>) -> Self {
        Self {
            known_paths,
            ..Self::default()
        }
    }
}

/// Installations found by one pass, keyed by canonical root
struct InstallationSet {
    by_root: BTreeMap<PathBuf, Installation>,
    known_count: usize,
    active_count: usize,
}

/// Finds installations and ranks their logs.
///
/// Every call to [`Discovery::discover`] starts from scratch; installations
/// and servers come and go between calls and nothing is cached.
pub struct Discovery {
    config: DiscoveryConfig,
    scanner: ActiveScanner,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_lister(config, Box::new(SystemProcessLister::default()))
    }

    pub fn with_lister(config: DiscoveryConfig, lister: Box<dyn ProcessLister>) -> Self {
        Self {
            config,
            scanner: ActiveScanner::new(lister),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run one discovery pass. Never fails; unreadable pieces contribute nothing.
    pub fn discover(&self) -> DiscoveryResult {
        let start = Instant::now();
        let set = self.collect_installations();

        let mut logs = Vec::new();
        for installation in set.by_root.values() {
            match enumerate_logs(&installation.root_path) {
                Ok(found) => {
                    tracing::debug!(
                        path = %installation.root_path.display(),
                        source = ?installation.source,
                        count = found.len(),
                        "enumerated logs"
                    );
                    logs.extend(found);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %installation.root_path.display(),
                        error = %err,
                        "failed to enumerate logs"
                    );
                }
            }
        }

        // Newest first; vanished files sink to the bottom. Stable sort keeps
        // enumeration order among equal timestamps.
        let mut ranked: Vec<LogFile> = logs
            .into_iter()
            .map(|path| {
                let modified_at = modified_at_or_epoch(&path);
                LogFile::new(path, modified_at)
            })
            .collect();
        ranked.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

        let result = DiscoveryResult {
            installations: set.by_root.into_keys().collect(),
            log_files: ranked.into_iter().map(|log| log.path).collect(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
            known_count: set.known_count,
            active_count: set.active_count,
            ..DiscoveryResult::default()
        };

        tracing::info!(
            installations = result.installations.len(),
            logs = result.log_files.len(),
            elapsed = format!("{:.2}s", result.elapsed_seconds),
            "discovery completed"
        );

        result
    }

    /// Installations with their provenance, without touching logs
    pub fn installations(&self) -> Vec<Installation> {
        self.collect_installations().by_root.into_values().collect()
    }

    fn collect_installations(&self) -> InstallationSet {
        let mut by_root: BTreeMap<PathBuf, Installation> = BTreeMap::new();

        let mut known_count = 0;
        for path in &self.config.known_paths {
            if !verify_installation(path) {
                tracing::debug!(path = %path.display(), "known path not found or incomplete");
                continue;
            }
            let root = normalize_path(path);
            tracing::debug!(path = %root.display(), "known installation verified");
            by_root
                .entry(root.clone())
                .or_insert_with(|| Installation::known(root));
            known_count += 1;
        }

        let active = if self.config.scan_processes {
            self.scanner.scan()
        } else {
            Default::default()
        };
        if active.is_empty() {
            tracing::debug!("no running ComfyUI processes found");
        }
        let active_count = active.len();
        for root in active {
            by_root
                .entry(root.clone())
                .or_insert_with(|| Installation::active(root));
        }

        InstallationSet {
            by_root,
            known_count,
            active_count,
        }
    }
}
