use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One pattern match against one log line, with surrounding context.
///
/// `line_number` is 1-based and refers to the file content as it was read
/// for this call; findings are not stable across rotation or appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFinding {
    #[serde(rename = "type")]
    pub category: String,
    pub line_number: usize,
    #[serde(rename = "error_line")]
    pub matched_line: String,
    #[serde(rename = "context")]
    pub context_block: String,
    #[serde(rename = "log_file")]
    pub source_log_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_uses_wire_names() {
        let finding = ErrorFinding {
            category: "CudaError".to_string(),
            line_number: 2,
            matched_line: "ERROR: CUDA out of memory".to_string(),
            context_block: "start\nERROR: CUDA out of memory\ndone".to_string(),
            source_log_path: PathBuf::from("/opt/ComfyUI/app.log"),
        };

        insta::assert_json_snapshot!(finding, @r###"
        {
          "type": "CudaError",
          "line_number": 2,
          "error_line": "ERROR: CUDA out of memory",
          "context": "start\nERROR: CUDA out of memory\ndone",
          "log_file": "/opt/ComfyUI/app.log"
        }
        "###);
    }

    #[test]
    fn test_finding_deserializes_wire_keys() {
        let json = r#"{
            "type": "NodeError",
            "line_number": 7,
            "error_line": "Error occurred when executing KSampler",
            "context": "Error occurred when executing KSampler",
            "log_file": "comfyui.log"
        }"#;
        let finding: ErrorFinding = serde_json::from_str(json).unwrap();
        assert_eq!(finding.category, "NodeError");
        assert_eq!(finding.line_number, 7);
    }
}
