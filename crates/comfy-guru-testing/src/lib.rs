//! Testing infrastructure for comfy-guru integration tests.
//!
//! - `TestWorld`: isolated config dir plus fake ComfyUI installations
//! - `fixtures`: installation and log builders, sample log content
//! - `assertions`: checks over the JSON the CLI and MCP tools print
//! - `process`: background process management for `tail` and `serve`

pub mod assertions;
pub mod fixtures;
pub mod process;
pub mod world;

pub use fixtures::ComfyInstall;
pub use world::{CliResult, TestWorld};
