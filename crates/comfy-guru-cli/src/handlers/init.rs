use crate::output::{self, Palette};
use crate::types::OutputFormat;
use anyhow::Result;
use comfy_guru_runtime::{FileStatus, InitService, resolve_patterns_path, resolve_settings_path};
use serde_json::json;

pub fn handle(settings: Option<&str>, patterns: Option<&str>, format: OutputFormat) -> Result<()> {
    let settings_path = resolve_settings_path(settings)?;
    let patterns_path = resolve_patterns_path(patterns)?;

    let result = InitService::run(&settings_path, &patterns_path)?;

    if format.is_json() {
        return output::print_json(&json!({
            "settings": status_json(&result.settings),
            "patterns": status_json(&result.patterns),
        }));
    }

    let palette = Palette::detect();
    print_status("Settings", &result.settings, palette);
    print_status("Patterns", &result.patterns, palette);

    println!();
    println!("Next steps:");
    println!("  1. List your installations in COMFYUI_PATHS:");
    println!("       {}", settings_path.display());
    println!("  2. Check what is found:");
    println!("       comfy-guru logs");

    Ok(())
}

fn print_status(label: &str, status: &FileStatus, palette: Palette) {
    let state = match status {
        FileStatus::Created(_) => palette.ok("created"),
        FileStatus::Existing(_) => palette.dim("kept"),
    };
    println!("{}: {} {}", label, state, status.path().display());
}

fn status_json(status: &FileStatus) -> serde_json::Value {
    let state = match status {
        FileStatus::Created(_) => "created",
        FileStatus::Existing(_) => "existing",
    };
    json!({ "path": status.path().display().to_string(), "status": state })
}
