use crate::mcp::{errors_payload, matches_payload, warnings_payload};
use crate::output::{self, Palette};
use crate::types::OutputFormat;
use anyhow::Result;
use comfy_guru_engine::FindOptions;
use comfy_guru_runtime::Debugger;
use comfy_guru_types::ErrorFinding;
use std::path::Path;

pub fn handle_errors(
    debugger: &Debugger,
    log: &Path,
    context: usize,
    last_minutes: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let options = FindOptions::with_context(context).recency(last_minutes);
    let findings = debugger.find_errors(log, &options)?;
    print_findings(&findings, "errors", format, errors_payload)
}

pub fn handle_gpu(
    debugger: &Debugger,
    log: &Path,
    context: usize,
    format: OutputFormat,
) -> Result<()> {
    let findings = debugger.gpu_memory_warnings(log, &FindOptions::with_context(context))?;
    print_findings(&findings, "warnings", format, warnings_payload)
}

pub fn handle_workflow(
    debugger: &Debugger,
    id: &str,
    log: &Path,
    context: usize,
    format: OutputFormat,
) -> Result<()> {
    let findings = debugger.find_workflow(id, log, &FindOptions::with_context(context))?;
    print_findings(&findings, "matches", format, matches_payload)
}

fn print_findings(
    findings: &[ErrorFinding],
    noun: &str,
    format: OutputFormat,
    payload: fn(&[ErrorFinding]) -> serde_json::Value,
) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&payload(findings)),
        OutputFormat::Plain => {
            print!("{}", output::render_findings(findings, noun, Palette::detect()));
            Ok(())
        }
    }
}
