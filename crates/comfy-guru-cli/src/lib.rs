// comfy-guru layering
//
// types     -> serializable data model shared by every layer
// core      -> path and subprocess helpers with no domain knowledge
// discovery -> verifier, process scanner, log enumerator, orchestrator
// engine    -> pattern catalog and the line scanner built on it
// runtime   -> settings, the Debugger facade, log tailing
// cli       -> this crate: argument parsing, terminal output, MCP over stdio
//
// Everything below the CLI is synchronous and holds no shared mutable state.
// The MCP server handles one request at a time, so a slow `tail_log` call
// blocks the channel for at most its `follow_seconds`.

mod args;
mod commands;
mod handlers;
mod logging;
pub mod mcp;
mod output;
pub mod types;

pub use args::{Cli, Commands};
pub use commands::run;
