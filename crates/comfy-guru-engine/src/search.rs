use crate::catalog::PatternCatalog;
use crate::finder::{ErrorFinder, FindOptions};
use crate::Result;
use comfy_guru_types::ErrorFinding;
use std::path::Path;

/// GPU memory pressure in `log_path`, using the built-in GPU catalog
pub fn gpu_memory_warnings(log_path: &Path, options: &FindOptions) -> Result<Vec<ErrorFinding>> {
    let catalog = PatternCatalog::gpu_memory()?;
    ErrorFinder::new(&catalog).find_errors(log_path, options)
}

/// Lines of `log_path` that mention `workflow_id` verbatim
pub fn find_workflow(
    log_path: &Path,
    workflow_id: &str,
    options: &FindOptions,
) -> Result<Vec<ErrorFinding>> {
    let catalog = PatternCatalog::workflow(workflow_id)?;
    ErrorFinder::new(&catalog).find_errors(log_path, options)
}
