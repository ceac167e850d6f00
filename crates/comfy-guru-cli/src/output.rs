use comfy_guru_types::{DiscoveryResult, ErrorFinding};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde_json::Value;
use std::fmt::Write as _;

/// Styling for plain output; colors only when stdout is a terminal
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn category(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn ok(&self, text: &str) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn render_discovery(result: &DiscoveryResult, palette: Palette) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        palette.heading(&format!("Installations ({})", result.installations.len()))
    );
    if result.installations.is_empty() {
        let _ = writeln!(out, "  {}", palette.dim("none found"));
    }
    for root in &result.installations {
        let _ = writeln!(out, "  {}", root.display());
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        palette.heading(&format!("Log files ({}, newest first)", result.log_files.len()))
    );
    if result.log_files.is_empty() {
        let _ = writeln!(out, "  {}", palette.dim("none found"));
    }
    for path in &result.log_files {
        let _ = writeln!(out, "  {}", path.display());
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        palette.dim(&format!(
            "{} known, {} active, {:.2}s",
            result.known_count, result.active_count, result.elapsed_seconds
        ))
    );
    out
}

/// `noun` names what was searched for, e.g. "errors"
pub fn render_findings(findings: &[ErrorFinding], noun: &str, palette: Palette) -> String {
    let mut out = String::new();

    if findings.is_empty() {
        let _ = writeln!(out, "{}", palette.ok(&format!("No {} found", noun)));
        return out;
    }

    for (index, finding) in findings.iter().enumerate() {
        if index > 0 {
            let _ = writeln!(out);
        }
        let _ = writeln!(
            out,
            "{} {}",
            palette.category(&format!("[{}]", finding.category)),
            palette.dim(&format!(
                "{}:{}",
                finding.source_log_path.display(),
                finding.line_number
            ))
        );
        let _ = writeln!(out, "  {}", finding.matched_line);
        if finding.context_block != finding.matched_line {
            for line in finding.context_block.lines() {
                let _ = writeln!(out, "  {} {}", palette.dim("|"), line);
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}: {}", noun, findings.len());
    out
}
