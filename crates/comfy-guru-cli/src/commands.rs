use super::args::{Cli, Commands};
use super::handlers;
use crate::logging;
use anyhow::Result;
use comfy_guru_runtime::{Debugger, DebuggerOptions, resolve_settings_path};

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let Some(command) = cli.command else {
        show_guidance(cli.settings.as_deref())?;
        return Ok(());
    };

    let options = DebuggerOptions {
        settings_path: cli.settings.clone(),
        patterns_path: cli.patterns.clone(),
        disable_process_scan: cli.no_process_scan,
    };
    let open = || Debugger::open(options.clone());

    match command {
        // Runs without loading settings or catalog
        Commands::Init => {
            handlers::init::handle(cli.settings.as_deref(), cli.patterns.as_deref(), cli.format)
        }
        Commands::Serve => handlers::serve::handle(open()?),
        Commands::Logs => handlers::logs::handle(&open()?, cli.format),
        Commands::Errors {
            log,
            context,
            last_minutes,
        } => handlers::find::handle_errors(&open()?, &log, context, last_minutes, cli.format),
        Commands::Gpu { log, context } => {
            handlers::find::handle_gpu(&open()?, &log, context, cli.format)
        }
        Commands::Workflow { id, log, context } => {
            handlers::find::handle_workflow(&open()?, &id, &log, context, cli.format)
        }
        Commands::Tail { log, seconds } => {
            handlers::tail::handle(&open()?, &log, seconds, cli.format)
        }
    }
}

fn show_guidance(settings: Option<&str>) -> Result<()> {
    let settings_path = resolve_settings_path(settings)?;

    println!("comfy-guru - ComfyUI log finder and error diagnosis\n");

    if !settings_path.exists() {
        println!("Get started:");
        println!("  comfy-guru init\n");
        println!("The init command will:");
        println!("  1. Write a settings file for your installation paths");
        println!("  2. Write the default error pattern catalog\n");
    } else {
        println!("Quick commands:");
        println!("  comfy-guru logs                   # Find installations and their logs");
        println!("  comfy-guru errors <LOG>           # Scan a log for errors");
        println!("  comfy-guru tail <LOG>             # Follow a log");
        println!("  comfy-guru serve                  # Run as an MCP server\n");
    }

    println!("For more commands:");
    println!("  comfy-guru --help");

    Ok(())
}
