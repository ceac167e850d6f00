use comfy_guru_engine::{DEFAULT_CONTEXT_LINES, FindOptions};
use comfy_guru_runtime::{Debugger, TailOutcome};
use comfy_guru_types::ErrorFinding;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_FOLLOW_SECONDS: u64 = 10;
pub const MAX_FOLLOW_SECONDS: u64 = 120;

/// How a tool call failed
#[derive(Debug)]
pub enum ToolError {
    /// Returned to the caller as a tool result flagged `isError`
    Failed(String),
    /// Returned as a JSON-RPC internal error
    Internal(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Failed(msg) | ToolError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<comfy_guru_runtime::Error> for ToolError {
    fn from(err: comfy_guru_runtime::Error) -> Self {
        ToolError::Failed(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Internal(err.to_string())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FindErrorsArgs {
    /// Log file to scan, usually one returned by get_logs
    pub log_path: String,
    /// Only scan the log if it was modified within this many minutes
    #[serde(default)]
    pub last_minutes: Option<u64>,
    /// Lines of context kept on each side of a match (default: 5)
    #[serde(default)]
    pub context_lines: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TailLogArgs {
    /// Log file to follow
    pub path: String,
    /// How long to collect new lines before returning (default: 10, max: 120)
    #[serde(default)]
    pub follow_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GpuWarningsArgs {
    /// Log file to scan
    pub log_path: String,
    /// Lines of context kept on each side of a match (default: 5)
    #[serde(default)]
    pub context_lines: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FindWorkflowArgs {
    /// Workflow or prompt id as printed by ComfyUI
    pub workflow_id: String,
    /// Log file to search
    pub log_path: String,
    /// Lines of context kept on each side of a match (default: 5)
    #[serde(default)]
    pub context_lines: Option<usize>,
}

pub fn errors_payload(findings: &[ErrorFinding]) -> Value {
    json!({ "errors": findings })
}

pub fn warnings_payload(findings: &[ErrorFinding]) -> Value {
    json!({ "warnings": findings })
}

pub fn matches_payload(findings: &[ErrorFinding]) -> Value {
    json!({ "matches": findings })
}

pub fn tail_payload(lines: &[String], outcome: &TailOutcome) -> Value {
    json!({
        "lines": lines,
        "message": outcome.message,
    })
}

fn find_options(context_lines: Option<usize>) -> FindOptions {
    FindOptions::with_context(context_lines.unwrap_or(DEFAULT_CONTEXT_LINES))
}

pub fn handle_get_logs(debugger: &Debugger) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(debugger.get_logs())?)
}

pub fn handle_find_errors(debugger: &Debugger, args: FindErrorsArgs) -> Result<Value, ToolError> {
    let options = find_options(args.context_lines).recency(args.last_minutes);
    let findings = debugger.find_errors(Path::new(&args.log_path), &options)?;
    Ok(errors_payload(&findings))
}

pub fn handle_tail_log(debugger: &Debugger, args: TailLogArgs) -> Result<Value, ToolError> {
    let seconds = args
        .follow_seconds
        .unwrap_or(DEFAULT_FOLLOW_SECONDS)
        .min(MAX_FOLLOW_SECONDS);

    let mut lines = Vec::new();
    let outcome = debugger.tail_log(
        Path::new(&args.path),
        Some(Duration::from_secs(seconds)),
        |line| lines.push(line.to_string()),
    )?;
    Ok(tail_payload(&lines, &outcome))
}

pub fn handle_gpu_memory_warnings(
    debugger: &Debugger,
    args: GpuWarningsArgs,
) -> Result<Value, ToolError> {
    let findings =
        debugger.gpu_memory_warnings(Path::new(&args.log_path), &find_options(args.context_lines))?;
    Ok(warnings_payload(&findings))
}

pub fn handle_find_workflow(
    debugger: &Debugger,
    args: FindWorkflowArgs,
) -> Result<Value, ToolError> {
    let findings = debugger.find_workflow(
        &args.workflow_id,
        Path::new(&args.log_path),
        &find_options(args.context_lines),
    )?;
    Ok(matches_payload(&findings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfy_guru_discovery::{DiscoveryConfig, StaticProcessLister};
    use comfy_guru_engine::PatternCatalog;
    use tempfile::TempDir;

    fn debugger() -> Debugger {
        Debugger::from_parts(
            DiscoveryConfig {
                known_paths: Vec::new(),
                scan_processes: false,
            },
            Box::new(StaticProcessLister::default()),
            PatternCatalog::from_json_str(r#"{"CudaError": ["CUDA out of memory"]}"#).unwrap(),
        )
    }

    #[test]
    fn test_find_errors_defaults_context_to_five() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("comfyui.log");
        let lines: Vec<String> = (1..=12).map(|i| format!("line {i}")).collect();
        let mut content = lines.join("\n");
        content.push_str("\nCUDA out of memory\nafter\n");
        std::fs::write(&log, content).unwrap();

        let args: FindErrorsArgs =
            serde_json::from_value(json!({ "log_path": log.display().to_string() })).unwrap();
        let payload = handle_find_errors(&debugger(), args).unwrap();

        let errors = payload["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["line_number"], 13);
        assert_eq!(
            errors[0]["context"],
            "line 8\nline 9\nline 10\nline 11\nline 12\nCUDA out of memory\nafter"
        );
    }

    #[test]
    fn test_missing_log_is_a_tool_failure() {
        let args: FindErrorsArgs =
            serde_json::from_value(json!({ "log_path": "/nonexistent/comfyui.log" })).unwrap();

        match handle_find_errors(&debugger(), args) {
            Err(ToolError::Failed(msg)) => {
                assert_eq!(msg, "Log file not found: /nonexistent/comfyui.log")
            }
            other => panic!("expected tool failure, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        let result: Result<FindErrorsArgs, _> =
            serde_json::from_value(json!({ "log_path": "a.log", "contxt_lines": 2 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_get_logs_shape() {
        let payload = handle_get_logs(&debugger()).unwrap();
        assert_eq!(payload["installations"], json!([]));
        assert_eq!(payload["log_files"], json!([]));
        assert_eq!(payload["discovery_method"], "simple_active");
    }

    #[test]
    fn test_payload_wrappers() {
        assert_eq!(errors_payload(&[]), json!({ "errors": [] }));
        assert_eq!(warnings_payload(&[]), json!({ "warnings": [] }));
        assert_eq!(matches_payload(&[]), json!({ "matches": [] }));
    }
}
