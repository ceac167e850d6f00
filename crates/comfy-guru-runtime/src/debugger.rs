use crate::Result;
use crate::settings::{Settings, resolve_patterns_path, resolve_settings_path};
use crate::tail::{TailOutcome, tail_log};
use comfy_guru_discovery::{Discovery, DiscoveryConfig, ProcessLister};
use comfy_guru_engine::{
    ErrorFinder, FindOptions, PatternCatalog, find_workflow, gpu_memory_warnings,
};
use comfy_guru_types::{DiscoveryResult, ErrorFinding};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where configuration comes from; `None` falls back to env vars and the config dir
#[derive(Debug, Clone, Default)]
pub struct DebuggerOptions {
    pub settings_path: Option<String>,
    pub patterns_path: Option<String>,
    pub disable_process_scan: bool,
}

/// The operations exposed as tools.
///
/// Settings and the pattern catalog are read once in [`Debugger::open`] and
/// never change afterwards; every call below is independent.
pub struct Debugger {
    discovery: Discovery,
    catalog: PatternCatalog,
    settings_path: Option<PathBuf>,
    patterns_path: Option<PathBuf>,
}

impl Debugger {
    /// Resolve and load settings and catalog.
    ///
    /// Missing files are fine; malformed ones are configuration errors.
    pub fn open(options: DebuggerOptions) -> Result<Self> {
        let settings_path = resolve_settings_path(options.settings_path.as_deref())?;
        let patterns_path = resolve_patterns_path(options.patterns_path.as_deref())?;

        let settings = Settings::load_from(&settings_path)?.with_env_paths();
        let catalog = PatternCatalog::load(&patterns_path)?;

        tracing::debug!(
            settings = %settings_path.display(),
            patterns = %patterns_path.display(),
            known_paths = settings.known_paths.len(),
            catalog_size = catalog.len(),
            "configuration loaded"
        );

        let config = DiscoveryConfig {
            known_paths: settings.known_paths,
            scan_processes: !options.disable_process_scan,
        };

        Ok(Self {
            discovery: Discovery::new(config),
            catalog,
            settings_path: Some(settings_path),
            patterns_path: Some(patterns_path),
        })
    }

    /// Assemble from already-loaded parts
    pub fn from_parts(
        config: DiscoveryConfig,
        lister: Box<dyn ProcessLister>,
        catalog: PatternCatalog,
    ) -> Self {
        Self {
            discovery: Discovery::with_lister(config, lister),
            catalog,
            settings_path: None,
            patterns_path: None,
        }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    pub fn patterns_path(&self) -> Option<&Path> {
        self.patterns_path.as_deref()
    }

    /// Discover installations and rank their logs
    pub fn get_logs(&self) -> DiscoveryResult {
        self.discovery.discover()
    }

    pub fn find_errors(&self, log_path: &Path, options: &FindOptions) -> Result<Vec<ErrorFinding>> {
        Ok(ErrorFinder::new(&self.catalog).find_errors(log_path, options)?)
    }

    pub fn gpu_memory_warnings(
        &self,
        log_path: &Path,
        options: &FindOptions,
    ) -> Result<Vec<ErrorFinding>> {
        Ok(gpu_memory_warnings(log_path, options)?)
    }

    pub fn find_workflow(
        &self,
        workflow_id: &str,
        log_path: &Path,
        options: &FindOptions,
    ) -> Result<Vec<ErrorFinding>> {
        Ok(find_workflow(log_path, workflow_id, options)?)
    }

    pub fn tail_log(
        &self,
        log_path: &Path,
        deadline: Option<Duration>,
        on_line: impl FnMut(&str),
    ) -> Result<TailOutcome> {
        tail_log(log_path, deadline, on_line)
    }
}
