//! Assertions over the JSON payloads printed by the CLI and MCP tools.
//!
//! - Finding counts and line ordering
//! - Installation and log counts from discovery

use anyhow::{Context, Result};
use serde_json::Value;

/// Assert that an `{"errors": [...]}` payload holds `expected` findings.
pub fn assert_finding_count(json: &Value, expected: usize) -> Result<()> {
    let errors = json["errors"]
        .as_array()
        .context("Expected 'errors' array in JSON")?;

    if errors.len() != expected {
        anyhow::bail!("Expected {} findings, got {}", expected, errors.len());
    }

    Ok(())
}

/// Assert that finding line numbers are strictly increasing.
pub fn assert_line_numbers_increasing(json: &Value) -> Result<()> {
    let errors = json["errors"]
        .as_array()
        .context("Expected 'errors' array in JSON")?;

    let mut previous = 0;
    for (i, finding) in errors.iter().enumerate() {
        let line = finding["line_number"]
            .as_u64()
            .with_context(|| format!("Finding {} missing line_number", i))?;
        if line <= previous {
            anyhow::bail!(
                "Finding {} has line {} after line {}",
                i,
                line,
                previous
            );
        }
        previous = line;
    }

    Ok(())
}

/// Assert the number of installations in a discovery payload.
pub fn assert_installation_count(json: &Value, expected: usize) -> Result<()> {
    let installations = json["installations"]
        .as_array()
        .context("Expected 'installations' array in JSON")?;

    if installations.len() != expected {
        anyhow::bail!(
            "Expected {} installations, got {}: {:?}",
            expected,
            installations.len(),
            installations
        );
    }

    Ok(())
}

/// Log file names from a discovery payload, in reported order.
pub fn log_file_names(json: &Value) -> Result<Vec<String>> {
    let logs = json["log_files"]
        .as_array()
        .context("Expected 'log_files' array in JSON")?;

    logs.iter()
        .map(|log| {
            let path = log.as_str().context("log_files entry is not a string")?;
            let name = std::path::Path::new(path)
                .file_name()
                .with_context(|| format!("log path has no file name: {}", path))?;
            Ok(name.to_string_lossy().into_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assert_finding_count() {
        let json = json!({"errors": [{"line_number": 1}, {"line_number": 4}]});

        assert!(assert_finding_count(&json, 2).is_ok());
        assert!(assert_finding_count(&json, 1).is_err());
        assert!(assert_finding_count(&json!({"error": "x"}), 0).is_err());
    }

    #[test]
    fn test_assert_line_numbers_increasing() {
        let ordered = json!({"errors": [{"line_number": 2}, {"line_number": 9}]});
        let repeated = json!({"errors": [{"line_number": 2}, {"line_number": 2}]});

        assert!(assert_line_numbers_increasing(&ordered).is_ok());
        assert!(assert_line_numbers_increasing(&repeated).is_err());
    }

    #[test]
    fn test_log_file_names() {
        let json = json!({"log_files": ["/opt/ComfyUI/logs/comfyui.log", "/opt/ComfyUI/console.txt"]});
        assert_eq!(
            log_file_names(&json).unwrap(),
            vec!["comfyui.log", "console.txt"]
        );
    }
}
