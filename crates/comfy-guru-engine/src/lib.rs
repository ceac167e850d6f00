// Error types
pub mod error;

// Pattern catalog and scanning
pub mod catalog;
pub mod finder;
pub mod search;

pub use catalog::{BUNDLED_CATALOG, GPU_MEMORY_CATEGORY, PatternCatalog, WORKFLOW_CATEGORY};
pub use error::{Error, Result};
pub use finder::{DEFAULT_CONTEXT_LINES, ErrorFinder, FindOptions};
pub use search::{find_workflow, gpu_memory_warnings};
