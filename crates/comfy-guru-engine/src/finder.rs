use crate::catalog::PatternCatalog;
use crate::{Error, Result};
use chrono::{TimeDelta, Utc};
use comfy_guru_core::modified_time;
use comfy_guru_types::ErrorFinding;
use std::path::Path;

/// Lines of context on each side of a match when the caller gives none
pub const DEFAULT_CONTEXT_LINES: usize = 5;

/// Knobs for one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    pub context_lines: usize,
    /// Skip the whole file when it was last modified longer ago than this.
    /// `None` and `Some(0)` both disable the filter.
    pub recency_minutes: Option<u64>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            recency_minutes: None,
        }
    }
}

impl FindOptions {
    pub fn with_context(context_lines: usize) -> Self {
        Self {
            context_lines,
            ..Self::default()
        }
    }

    pub fn recency(mut self, minutes: Option<u64>) -> Self {
        self.recency_minutes = minutes;
        self
    }
}

/// Scans log files with a [`PatternCatalog`]
#[derive(Debug, Clone, Copy)]
pub struct ErrorFinder<'a> {
    catalog: &'a PatternCatalog,
}

impl<'a> ErrorFinder<'a> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self { catalog }
    }

    /// Findings for `log_path` in line order.
    ///
    /// The whole file is read at once; undecodable bytes are replaced. The
    /// existence check happens once up front, so a file deleted mid-read
    /// surfaces as [`Error::Io`].
    pub fn find_errors(&self, log_path: &Path, options: &FindOptions) -> Result<Vec<ErrorFinding>> {
        if !log_path.exists() {
            return Err(Error::NotFound(log_path.to_path_buf()));
        }

        if let Some(minutes) = options.recency_minutes.filter(|m| *m > 0)
            && is_stale(log_path, minutes)
        {
            tracing::debug!(
                path = %log_path.display(),
                minutes,
                "log not modified within window, skipping"
            );
            return Ok(Vec::new());
        }

        let bytes = std::fs::read(log_path)?;
        let content = String::from_utf8_lossy(&bytes);
        let lines = split_lines(&content);

        let findings = self.scan_lines(&lines, options.context_lines, log_path);
        tracing::debug!(
            path = %log_path.display(),
            lines = lines.len(),
            findings = findings.len(),
            "scanned log"
        );
        Ok(findings)
    }

    /// Match every line against the catalog, in order
    pub fn scan_lines(
        &self,
        lines: &[&str],
        context_lines: usize,
        source: &Path,
    ) -> Vec<ErrorFinding> {
        let mut findings = Vec::new();
        if self.catalog.is_empty() {
            return findings;
        }

        for (i, line) in lines.iter().enumerate() {
            let Some(category) = self.catalog.first_match(line) else {
                continue;
            };

            let start = i.saturating_sub(context_lines);
            let end = i.saturating_add(context_lines).min(lines.len() - 1);
            let context_block = lines[start..=end].join("\n").trim().to_string();

            findings.push(ErrorFinding {
                category: category.to_string(),
                line_number: i + 1,
                matched_line: line.trim().to_string(),
                context_block,
                source_log_path: source.to_path_buf(),
            });
        }

        findings
    }
}

/// Split on LF, CRLF and bare CR. Progress bars redraw with a lone `\r`,
/// and each redraw counts as its own line.
fn split_lines(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&content[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&content[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// Older than the window. An unreadable mtime never filters.
fn is_stale(path: &Path, minutes: u64) -> bool {
    let Some(modified) = modified_time(path) else {
        return false;
    };
    let age = Utc::now().signed_duration_since(chrono::DateTime::<Utc>::from(modified));
    let window = TimeDelta::try_minutes(i64::try_from(minutes).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);
    age > window
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cuda_catalog() -> PatternCatalog {
        PatternCatalog::from_json_str(r#"{"CudaError": ["CUDA out of memory"]}"#).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cuda_example() {
        let temp_dir = TempDir::new().unwrap();
        let log = write(&temp_dir, "app.log", b"start\nERROR: CUDA out of memory\ndone\n");
        let catalog = cuda_catalog();

        let findings = ErrorFinder::new(&catalog)
            .find_errors(&log, &FindOptions::with_context(1))
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, "CudaError");
        assert_eq!(findings[0].line_number, 2);
        assert_eq!(findings[0].matched_line, "ERROR: CUDA out of memory");
        assert_eq!(
            findings[0].context_block,
            "start\nERROR: CUDA out of memory\ndone"
        );
        assert_eq!(findings[0].source_log_path, log);
    }

    #[test]
    fn test_missing_log_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.log");
        let catalog = cuda_catalog();

        let err = ErrorFinder::new(&catalog)
            .find_errors(&missing, &FindOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref p) if p == &missing));
        assert_eq!(
            err.to_string(),
            format!("Log file not found: {}", missing.display())
        );
    }

    #[test]
    fn test_context_clamped_at_file_edges() {
        let lines = ["CUDA out of memory", "b", "c", "d", "CUDA out of memory"];
        let catalog = cuda_catalog();
        let findings = ErrorFinder::new(&catalog).scan_lines(&lines, 2, Path::new("x.log"));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].context_block, "CUDA out of memory\nb\nc");
        assert_eq!(findings[1].context_block, "c\nd\nCUDA out of memory");
    }

    #[test]
    fn test_overlapping_windows_are_all_reported() {
        let lines = ["CUDA out of memory", "CUDA out of memory", "ok"];
        let catalog = cuda_catalog();
        let findings = ErrorFinder::new(&catalog).scan_lines(&lines, 5, Path::new("x.log"));

        let numbers: Vec<_> = findings.iter().map(|f| f.line_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(findings[0].context_block, findings[1].context_block);
    }

    #[test]
    fn test_zero_context_is_just_the_line() {
        let lines = ["  before", "  CUDA out of memory  ", "after"];
        let catalog = cuda_catalog();
        let findings = ErrorFinder::new(&catalog).scan_lines(&lines, 0, Path::new("x.log"));

        assert_eq!(findings[0].context_block, "CUDA out of memory");
        assert_eq!(findings[0].matched_line, "CUDA out of memory");
    }

    #[test]
    fn test_block_trimmed_but_inner_whitespace_kept() {
        let lines = ["", "  Traceback:", "CUDA out of memory", "    at frame", ""];
        let catalog = cuda_catalog();
        let findings = ErrorFinder::new(&catalog).scan_lines(&lines, 2, Path::new("x.log"));

        assert_eq!(
            findings[0].context_block,
            "Traceback:\nCUDA out of memory\n    at frame"
        );
    }

    #[test]
    fn test_empty_catalog_finds_nothing() {
        let catalog = PatternCatalog::empty();
        let findings =
            ErrorFinder::new(&catalog).scan_lines(&["CUDA out of memory"], 5, Path::new("x.log"));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_invalid_utf8_does_not_abort() {
        let temp_dir = TempDir::new().unwrap();
        let log = write(
            &temp_dir,
            "bin.log",
            b"garbage \xff\xfe here\r\nERROR: CUDA out of memory\r\n",
        );
        let catalog = cuda_catalog();

        let findings = ErrorFinder::new(&catalog)
            .find_errors(&log, &FindOptions::with_context(1))
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line_number, 2);
        assert!(findings[0].context_block.starts_with("garbage \u{FFFD}"));
        assert!(!findings[0].context_block.contains('\r'));
    }

    #[test]
    fn test_bare_carriage_return_splits_progress_redraws() {
        let temp_dir = TempDir::new().unwrap();
        let log = write(
            &temp_dir,
            "tqdm.log",
            b"  0%|     | 0/20\r 50%|##   | 10/20\rERROR: CUDA out of memory\ndone\n",
        );
        let catalog = cuda_catalog();

        let findings = ErrorFinder::new(&catalog)
            .find_errors(&log, &FindOptions::with_context(0))
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line_number, 3);
        assert_eq!(findings[0].matched_line, "ERROR: CUDA out of memory");
        assert_eq!(findings[0].context_block, "ERROR: CUDA out of memory");
    }

    #[test]
    fn test_split_lines_mixed_endings() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines("a\r\r\n"), vec!["a", ""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_stale_file_filtered_by_recency() {
        let temp_dir = TempDir::new().unwrap();
        let log = write(&temp_dir, "old.log", b"CUDA out of memory\n");
        filetime::set_file_mtime(&log, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
        let catalog = cuda_catalog();
        let finder = ErrorFinder::new(&catalog);

        let recent_only = FindOptions::default().recency(Some(30));
        assert!(finder.find_errors(&log, &recent_only).unwrap().is_empty());

        let no_window = FindOptions::default().recency(Some(0));
        assert_eq!(finder.find_errors(&log, &no_window).unwrap().len(), 1);
    }

    #[test]
    fn test_fresh_file_passes_recency() {
        let temp_dir = TempDir::new().unwrap();
        let log = write(&temp_dir, "new.log", b"CUDA out of memory\n");
        let catalog = cuda_catalog();

        let options = FindOptions::default().recency(Some(30));
        let findings = ErrorFinder::new(&catalog).find_errors(&log, &options).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_repeat_scan_is_identical() {
        let temp_dir = TempDir::new().unwrap();
        let log = write(
            &temp_dir,
            "app.log",
            b"a\nCUDA out of memory\nb\nCUDA out of memory again\n",
        );
        let catalog = cuda_catalog();
        let finder = ErrorFinder::new(&catalog);

        let first = finder.find_errors(&log, &FindOptions::default()).unwrap();
        let second = finder.find_errors(&log, &FindOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
