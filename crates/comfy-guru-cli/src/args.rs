use crate::types::{LogLevel, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "comfy-guru")]
#[command(about = "Find ComfyUI logs and diagnose the errors in them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (default: $COMFY_GURU_SETTINGS, then the config dir)
    #[arg(long, global = true)]
    pub settings: Option<String>,

    /// Error pattern catalog (default: $COMFY_GURU_PATTERNS, then the config dir)
    #[arg(long, global = true)]
    pub patterns: Option<String>,

    /// Only use installations listed in settings
    #[arg(long, global = true)]
    pub no_process_scan: bool,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the tools over MCP (JSON-RPC on stdin/stdout)
    Serve,

    /// Discover installations and list their logs, newest first
    Logs,

    /// Scan a log for known error patterns
    Errors {
        log: PathBuf,

        #[arg(long, default_value = "5")]
        context: usize,

        /// Skip the log unless it changed within this many minutes
        #[arg(long)]
        last_minutes: Option<u64>,
    },

    /// Scan a log for GPU memory pressure
    Gpu {
        log: PathBuf,

        #[arg(long, default_value = "5")]
        context: usize,
    },

    /// Find the lines mentioning a workflow or prompt id
    Workflow {
        id: String,

        log: PathBuf,

        #[arg(long, default_value = "5")]
        context: usize,
    },

    /// Follow a log as it grows
    Tail {
        log: PathBuf,

        /// Stop after this many seconds instead of following until interrupted
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Write the settings template and default pattern catalog
    Init,
}
