use crate::mcp;
use anyhow::Result;
use comfy_guru_runtime::Debugger;

pub fn handle(debugger: Debugger) -> Result<()> {
    mcp::run_server(debugger)
}
