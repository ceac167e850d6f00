//! MCP JSON-RPC server.

use comfy_guru_runtime::Debugger;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, Write};

use super::tools::{
    FindErrorsArgs, FindWorkflowArgs, GpuWarningsArgs, TailLogArgs, ToolError, handle_find_errors,
    handle_find_workflow, handle_get_logs, handle_gpu_memory_warnings, handle_tail_log,
};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

pub struct ComfyGuruServer {
    debugger: Debugger,
}

impl ComfyGuruServer {
    pub fn new(debugger: Debugger) -> Self {
        Self { debugger }
    }

    /// Convert serde deserialization error to MCP-compliant JSON-RPC error
    fn parse_validation_error(tool_name: &str, error: serde_json::Error) -> JsonRpcError {
        let error_msg = error.to_string();

        if error_msg.contains("missing field")
            && let Some(field_start) = error_msg.find('`')
            && let Some(field_end) = error_msg[field_start + 1..].find('`')
        {
            let field_name = &error_msg[field_start + 1..field_start + 1 + field_end];
            return JsonRpcError {
                code: -32602,
                message: format!("Invalid params: missing required field \"{}\"", field_name),
                data: Some(json!({
                    "missing": [field_name],
                    "tool": tool_name,
                })),
            };
        }

        JsonRpcError {
            code: -32602,
            message: format!("Invalid params: {}", error),
            data: Some(json!({
                "tool": tool_name,
                "detail": error_msg,
            })),
        }
    }

    fn parse_args<T: DeserializeOwned>(
        tool_name: &str,
        arguments: Value,
    ) -> Result<T, JsonRpcError> {
        serde_json::from_value(arguments).map_err(|e| Self::parse_validation_error(tool_name, e))
    }

    /// Handle one raw line. `None` means nothing should be written back.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => self.handle_request(request)?,
            Err(e) => parse_error(format!("Parse error: {}", e)),
        };
        encode(&response)
    }

    fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications carry no id and get no reply
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "notification");
            return None;
        };

        tracing::debug!(method = %request.method, "request");
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params),
            _ => JsonRpcResponse::failure(
                id,
                JsonRpcError::new(-32601, format!("Method not found: {}", request.method)),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "comfy-guru",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "comfy-guru MCP Server - ComfyUI log discovery and error diagnosis. Call get_logs first to find installations and their logs (newest first), then pass a log path to find_errors, monitor_gpu_memory_warnings or find_workflow_by_id."
            }),
        )
    }

    fn handle_list_tools(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "tools": [
                    {
                        "name": "get_logs",
                        "description": "Discover ComfyUI installations (configured paths plus running servers) and list their log files, most recently modified first. WORKFLOW: Call this first; the first log_files entry is usually the one to inspect.",
                        "inputSchema": {
                            "type": "object",
                            "properties": {}
                        }
                    },
                    {
                        "name": "find_errors",
                        "description": "Scan a log for known error patterns (CUDA, node, model, prompt, Python and server errors). Each finding carries its category, 1-based line number, the matched line and surrounding context. Set last_minutes to skip logs that have not changed recently.",
                        "inputSchema": input_schema::<FindErrorsArgs>(),
                    },
                    {
                        "name": "tail_log",
                        "description": "Collect the last lines of a log plus anything appended during follow_seconds. Blocks for the whole window, so keep it short.",
                        "inputSchema": input_schema::<TailLogArgs>(),
                    },
                    {
                        "name": "monitor_gpu_memory_warnings",
                        "description": "Scan a log for GPU memory pressure: CUDA out-of-memory errors, failed allocations and low-VRAM fallbacks.",
                        "inputSchema": input_schema::<GpuWarningsArgs>(),
                    },
                    {
                        "name": "find_workflow_by_id",
                        "description": "Find every line of a log that mentions a workflow or prompt id, with surrounding context.",
                        "inputSchema": input_schema::<FindWorkflowArgs>(),
                    }
                ]
            }),
        )
    }

    fn handle_call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::failure(id, JsonRpcError::new(-32602, "Missing params"));
        };

        let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::failure(id, JsonRpcError::new(-32602, "Missing tool name"));
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = match self.dispatch(tool_name, arguments) {
            Ok(result) => result,
            Err(error) => return JsonRpcResponse::failure(id, error),
        };

        match result {
            Ok(content) => JsonRpcResponse::success(id, text_content(&content, false)),
            Err(ToolError::Failed(message)) => {
                tracing::debug!(tool = tool_name, error = %message, "tool failed");
                JsonRpcResponse::success(id, text_content(&json!({ "error": message }), true))
            }
            Err(ToolError::Internal(message)) => {
                JsonRpcResponse::failure(id, JsonRpcError::new(-32603, message))
            }
        }
    }

    /// Outer error: the call itself was malformed. Inner: the tool ran and failed.
    fn dispatch(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Result<Value, ToolError>, JsonRpcError> {
        let result = match tool_name {
            "get_logs" => handle_get_logs(&self.debugger),
            "find_errors" => handle_find_errors(&self.debugger, Self::parse_args(tool_name, arguments)?),
            "tail_log" => handle_tail_log(&self.debugger, Self::parse_args(tool_name, arguments)?),
            "monitor_gpu_memory_warnings" => {
                handle_gpu_memory_warnings(&self.debugger, Self::parse_args(tool_name, arguments)?)
            }
            "find_workflow_by_id" => {
                handle_find_workflow(&self.debugger, Self::parse_args(tool_name, arguments)?)
            }
            _ => Err(ToolError::Internal(format!("Unknown tool: {}", tool_name))),
        };
        Ok(result)
    }

    /// Serve requests from `reader` until it is exhausted.
    ///
    /// A line that is not valid UTF-8 gets a parse error and the session
    /// keeps reading.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let reply = match std::str::from_utf8(&buf) {
                Ok(line) => self.handle_line(line),
                Err(e) => {
                    tracing::warn!(error = %e, "request line is not valid UTF-8");
                    encode(&parse_error(format!("Parse error: {}", e)))
                }
            };

            if let Some(response) = reply {
                writeln!(writer, "{}", response)?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

// No usable id in an unparseable request
fn parse_error(message: String) -> JsonRpcResponse {
    JsonRpcResponse::failure(
        Value::Number(serde_json::Number::from(-1)),
        JsonRpcError::new(-32700, message),
    )
}

fn encode(response: &JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response");
            None
        }
    }
}

fn input_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({ "type": "object" }))
}

fn text_content(content: &Value, is_error: bool) -> Value {
    let text = serde_json::to_string(content).unwrap_or_else(|_| content.to_string());
    let mut result = json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ]
    });
    if is_error {
        result["isError"] = json!(true);
    }
    result
}

/// Run the MCP server over stdio.
pub fn run_server(debugger: Debugger) -> anyhow::Result<()> {
    let server = ComfyGuruServer::new(debugger);
    tracing::info!("MCP server listening on stdio");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    server.serve(stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfy_guru_discovery::{DiscoveryConfig, StaticProcessLister};
    use comfy_guru_engine::PatternCatalog;
    use std::io::Cursor;

    fn server() -> ComfyGuruServer {
        ComfyGuruServer::new(Debugger::from_parts(
            DiscoveryConfig {
                known_paths: Vec::new(),
                scan_processes: false,
            },
            Box::new(StaticProcessLister::default()),
            PatternCatalog::empty(),
        ))
    }

    fn call(server: &ComfyGuruServer, request: Value) -> Value {
        let line = server
            .handle_line(&request.to_string())
            .expect("request should be answered");
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_notification_gets_no_reply() {
        let line = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string();
        assert!(server().handle_line(&line).is_none());
        assert!(server().handle_line("   ").is_none());
    }

    #[test]
    fn test_parse_error_uses_sentinel_id() {
        let response: Value =
            serde_json::from_str(&server().handle_line("{not json").unwrap()).unwrap();
        assert_eq!(response["id"], -1);
        assert_eq!(response["error"]["code"], -32700);
    }

    #[test]
    fn test_unknown_method() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 7, "method": "resources/list" }),
        );
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found: resources/list");
    }

    #[test]
    fn test_missing_required_field() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": { "name": "find_errors", "arguments": {} }
            }),
        );
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(
            response["error"]["message"],
            "Invalid params: missing required field \"log_path\""
        );
        assert_eq!(
            response["error"]["data"],
            json!({ "missing": ["log_path"], "tool": "find_errors" })
        );
    }

    #[test]
    fn test_missing_tool_name() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {} }),
        );
        assert_eq!(response["error"]["message"], "Missing tool name");
    }

    #[test]
    fn test_unknown_tool_is_internal_error() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": { "name": "get_gpu_stats" }
            }),
        );
        assert_eq!(response["error"]["code"], -32603);
        assert_eq!(response["error"]["message"], "Unknown tool: get_gpu_stats");
    }

    #[test]
    fn test_not_found_is_flagged_tool_result() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "find_errors",
                    "arguments": { "log_path": "/nonexistent/comfyui.log" }
                }
            }),
        );
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);

        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let content: Value = serde_json::from_str(text).unwrap();
        assert_eq!(
            content,
            json!({ "error": "Log file not found: /nonexistent/comfyui.log" })
        );
    }

    #[test]
    fn test_tools_list_names_and_schemas() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        );
        let tools = response["result"]["tools"].as_array().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            [
                "get_logs",
                "find_errors",
                "tail_log",
                "monitor_gpu_memory_warnings",
                "find_workflow_by_id"
            ]
        );

        let find_errors = &tools[1]["inputSchema"];
        assert_eq!(find_errors["required"], json!(["log_path"]));
        assert!(find_errors["properties"]["context_lines"].is_object());
    }

    #[test]
    fn test_serve_writes_one_line_per_reply() {
        let input = [
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }).to_string(),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
            String::new(),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" }).to_string(),
        ]
        .join("\n");

        let mut output = Vec::new();
        server().serve(Cursor::new(input), &mut output).unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(replies[1]["id"], 2);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"x"#.to_vec();
        input.extend_from_slice(b"\xff\"}\n");
        input.extend_from_slice(
            json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" })
                .to_string()
                .as_bytes(),
        );
        input.push(b'\n');

        let mut output = Vec::new();
        server().serve(Cursor::new(input), &mut output).unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], -1);
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"], json!({}));
    }
}
