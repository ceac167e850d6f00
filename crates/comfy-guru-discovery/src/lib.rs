// Error types
pub mod error;

// Discovery building blocks
pub mod enumerator;
pub mod process;
pub mod scanner;
pub mod verifier;

// Orchestration
pub mod orchestrator;

pub use enumerator::{LOG_FILE_PATTERNS, LOGS_SUBDIR, enumerate_logs};
pub use error::{Error, Result};
pub use orchestrator::{Discovery, DiscoveryConfig};
pub use process::{ProcessEntry, ProcessListing, ProcessLister, StaticProcessLister, SystemProcessLister};
pub use scanner::{ActiveScanner, ENTRY_POINT, SERVER_FLAGS};
pub use verifier::{MARKER_FILES, MIN_MARKERS, verify_installation};
