pub mod debugger;
pub mod error;
pub mod init;
pub mod settings;
pub mod tail;

pub use debugger::{Debugger, DebuggerOptions};
pub use error::{Error, Result};
pub use init::{FileStatus, InitResult, InitService};
pub use settings::{
    PATHS_KEY, PATTERNS_ENV_VAR, SETTINGS_ENV_VAR, Settings, resolve_patterns_path,
    resolve_settings_path,
};
pub use tail::{TailOutcome, follow_command, tail_log};
