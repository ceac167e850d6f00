use serde::{Deserialize, Serialize};

/// A single catalog entry, before compilation.
///
/// Several patterns usually share one category; catalog order decides which
/// category wins when a line could match more than one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub category: String,
    pub regex: String,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
}

fn default_case_insensitive() -> bool {
    true
}

impl ErrorPattern {
    pub fn new(category: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            regex: regex.into(),
            case_insensitive: true,
        }
    }
}
