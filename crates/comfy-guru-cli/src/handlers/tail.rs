use crate::mcp::tail_payload;
use crate::output;
use crate::types::OutputFormat;
use anyhow::Result;
use comfy_guru_runtime::Debugger;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub fn handle(
    debugger: &Debugger,
    log: &Path,
    seconds: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let deadline = seconds.map(Duration::from_secs);

    match format {
        OutputFormat::Plain => {
            let stdout = std::io::stdout();
            let outcome = debugger.tail_log(log, deadline, |line| {
                let mut out = stdout.lock();
                let _ = writeln!(out, "{}", line);
                let _ = out.flush();
            })?;
            eprintln!("{}", outcome.message);
            Ok(())
        }
        OutputFormat::Json => {
            let mut lines = Vec::new();
            let outcome = debugger.tail_log(log, deadline, |line| lines.push(line.to_string()))?;
            output::print_json(&tail_payload(&lines, &outcome))
        }
    }
}
