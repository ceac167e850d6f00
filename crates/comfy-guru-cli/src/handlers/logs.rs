use crate::output::{self, Palette};
use crate::types::OutputFormat;
use anyhow::Result;
use comfy_guru_runtime::Debugger;

pub fn handle(debugger: &Debugger, format: OutputFormat) -> Result<()> {
    let result = debugger.get_logs();

    match format {
        OutputFormat::Json => output::print_json(&serde_json::to_value(&result)?),
        OutputFormat::Plain => {
            print!("{}", output::render_discovery(&result, Palette::detect()));
            Ok(())
        }
    }
}
