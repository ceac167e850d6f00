use crate::{Error, Result};
use comfy_guru_types::ErrorPattern;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::path::Path;

/// Default catalog shipped with the binary and written by `init`
pub const BUNDLED_CATALOG: &str = include_str!("../data/error_patterns.json");

/// Category used by the GPU memory scan
pub const GPU_MEMORY_CATEGORY: &str = "GpuMemory";

/// Category used by workflow id lookups
pub const WORKFLOW_CATEGORY: &str = "Workflow";

const GPU_MEMORY_PATTERNS: [&str; 7] = [
    r"CUDA out of memory",
    r"torch\.cuda\.OutOfMemoryError",
    r"Tried to allocate [\d.]+ ?[KMG]i?B",
    r"(failed|unable) to allocate",
    r"low[ _-]?vram",
    r"switching to (lowvram|cpu)",
    r"not enough (GPU|video) memory",
];

#[derive(Debug, Clone)]
struct CompiledPattern {
    pattern: ErrorPattern,
    regex: Regex,
}

/// Ordered error patterns, compiled once.
///
/// Catalog order is significant: the first pattern that matches a line
/// decides its category, even if a later category would also match.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<CompiledPattern>,
}

impl PatternCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_patterns(patterns: impl IntoIterator<Item = ErrorPattern>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Parse `{"Category": ["regex", ...], ...}`, keeping document order
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(categories) = value else {
            return Err(Error::Config(
                "pattern catalog must be a JSON object of category -> [regex]".to_string(),
            ));
        };

        let mut patterns = Vec::new();
        for (category, list) in categories {
            let Value::Array(list) = list else {
                return Err(Error::Config(format!(
                    "patterns for category {} must be an array of strings",
                    category
                )));
            };
            for entry in list {
                let Value::String(regex) = entry else {
                    return Err(Error::Config(format!(
                        "pattern in category {} is not a string: {}",
                        category, entry
                    )));
                };
                patterns.push(ErrorPattern::new(category.clone(), regex));
            }
        }

        Self::from_patterns(patterns)
    }

    /// Load a catalog file. An absent file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no pattern catalog, no errors will be reported");
            return Ok(Self::empty());
        }

        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            patterns = catalog.len(),
            "loaded pattern catalog"
        );
        Ok(catalog)
    }

    /// Catalog compiled from [`BUNDLED_CATALOG`]
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    /// Fixed catalog for GPU memory pressure
    pub fn gpu_memory() -> Result<Self> {
        Self::from_patterns(
            GPU_MEMORY_PATTERNS
                .iter()
                .map(|regex| ErrorPattern::new(GPU_MEMORY_CATEGORY, *regex)),
        )
    }

    /// Single literal pattern matching a workflow or prompt id
    pub fn workflow(workflow_id: &str) -> Result<Self> {
        let workflow_id = workflow_id.trim();
        if workflow_id.is_empty() {
            return Err(Error::Config("workflow id must not be empty".to_string()));
        }
        Self::from_patterns([ErrorPattern::new(
            WORKFLOW_CATEGORY,
            regex::escape(workflow_id),
        )])
    }

    /// Category of the first pattern matching `line`
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(line))
            .map(|p| p.pattern.category.as_str())
    }

    /// Distinct categories in catalog order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.patterns {
            if !seen.contains(&p.pattern.category.as_str()) {
                seen.push(&p.pattern.category);
            }
        }
        seen
    }

    pub fn patterns(&self) -> impl Iterator<Item = &ErrorPattern> {
        self.patterns.iter().map(|p| &p.pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(pattern: ErrorPattern) -> Result<CompiledPattern> {
    let regex = RegexBuilder::new(&pattern.regex)
        .case_insensitive(pattern.case_insensitive)
        .build()
        .map_err(|source| Error::InvalidPattern {
            category: pattern.category.clone(),
            pattern: pattern.regex.clone(),
            source,
        })?;
    Ok(CompiledPattern { pattern, regex })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_order_is_kept() {
        let catalog = PatternCatalog::from_json_str(
            r#"{"Zeta": ["z"], "Alpha": ["a", "b"], "Mid": ["m"]}"#,
        )
        .unwrap();

        assert_eq!(catalog.categories(), vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_first_matching_category_wins() {
        let catalog = PatternCatalog::from_json_str(
            r#"{"CudaError": ["out of memory"], "GenericError": ["error"]}"#,
        )
        .unwrap();

        assert_eq!(
            catalog.first_match("RuntimeError: CUDA out of memory"),
            Some("CudaError")
        );
        assert_eq!(catalog.first_match("some other error"), Some("GenericError"));
        assert_eq!(catalog.first_match("all good"), None);
    }

    #[test]
    fn test_matching_is_case_insensitive_search() {
        let catalog = PatternCatalog::from_json_str(r#"{"CudaError": ["CUDA out of memory"]}"#)
            .unwrap();
        assert_eq!(
            catalog.first_match("prefix: cuda OUT of Memory, suffix"),
            Some("CudaError")
        );
    }

    #[test]
    fn test_absent_file_is_empty_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = PatternCatalog::load(&temp_dir.path().join("missing.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("error_patterns.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PatternCatalog::load(&path).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_wrong_shape_is_configuration_error() {
        for json in [r#"["CUDA"]"#, r#"{"CudaError": "CUDA"}"#, r#"{"CudaError": [42]}"#] {
            let err = PatternCatalog::from_json_str(json).unwrap_err();
            assert!(err.is_configuration(), "{json} should be rejected");
        }
    }

    #[test]
    fn test_invalid_regex_names_category() {
        let err = PatternCatalog::from_json_str(r#"{"Broken": ["(unclosed"]}"#).unwrap_err();
        match err {
            Error::InvalidPattern {
                category, pattern, ..
            } => {
                assert_eq!(category, "Broken");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bundled_catalog_compiles() {
        let catalog = PatternCatalog::bundled().unwrap();
        assert!(catalog.categories().contains(&"CudaError"));
        assert_eq!(
            catalog.first_match("Error occurred when executing KSampler:"),
            Some("NodeError")
        );
    }

    #[test]
    fn test_gpu_memory_catalog() {
        let catalog = PatternCatalog::gpu_memory().unwrap();
        assert_eq!(
            catalog.first_match("Tried to allocate 2.50 GiB (GPU 0; 8.00 GiB total capacity)"),
            Some(GPU_MEMORY_CATEGORY)
        );
        assert_eq!(
            catalog.first_match("Set vram state to: LOW_VRAM"),
            Some(GPU_MEMORY_CATEGORY)
        );
        assert_eq!(catalog.first_match("Prompt executed in 3.2 seconds"), None);
    }

    #[test]
    fn test_workflow_id_is_literal() {
        let catalog = PatternCatalog::workflow("a1b2.c3").unwrap();
        assert_eq!(catalog.first_match("got prompt a1b2.c3"), Some(WORKFLOW_CATEGORY));
        assert_eq!(catalog.first_match("got prompt a1b2xc3"), None);
    }

    #[test]
    fn test_empty_workflow_id_rejected() {
        assert!(PatternCatalog::workflow("  ").unwrap_err().is_configuration());
    }
}
