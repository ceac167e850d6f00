use crate::process::{ProcessEntry, ProcessListing, ProcessLister};
use comfy_guru_core::normalize_path;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// ComfyUI's server entry point
pub const ENTRY_POINT: &str = "main.py";

/// Flags that put ComfyUI in server mode
pub const SERVER_FLAGS: [&str; 2] = ["--listen", "--port"];

/// Finds installations behind running ComfyUI server processes
pub struct ActiveScanner {
    lister: Box<dyn ProcessLister>,
}

impl ActiveScanner {
    pub fn new(lister: Box<dyn ProcessLister>) -> Self {
        Self { lister }
    }

    /// Canonical roots of running installations.
    ///
    /// Never fails: a listing that times out or cannot run yields an empty set.
    pub fn scan(&self) -> BTreeSet<PathBuf> {
        let entries = match self.lister.list() {
            ProcessListing::Listed(entries) => entries,
            ProcessListing::TimedOut => {
                tracing::warn!("process listing timed out, skipping active detection");
                return BTreeSet::new();
            }
            ProcessListing::Unavailable(reason) => {
                tracing::debug!(%reason, "process listing unavailable");
                return BTreeSet::new();
            }
        };

        let mut active = BTreeSet::new();
        for entry in entries.iter().filter(|e| looks_like_server(&e.command_line)) {
            if let Some(root) = installation_root(entry) {
                tracing::debug!(
                    root = %root.display(),
                    pid = ?entry.pid,
                    "found running ComfyUI"
                );
                active.insert(root);
            }
        }
        active
    }
}

/// A ComfyUI server command line names the entry point and a server flag
pub fn looks_like_server(command_line: &str) -> bool {
    command_line.contains(ENTRY_POINT) && SERVER_FLAGS.iter().any(|f| command_line.contains(f))
}

/// Directory holding the entry point of `entry`, if it exists on disk.
///
/// A bare `main.py` (or any relative script path) is resolved against the
/// process working directory; without one the entry is skipped rather than
/// guessed against our own cwd.
pub fn installation_root(entry: &ProcessEntry) -> Option<PathBuf> {
    let script = split_command_line(&entry.command_line)
        .into_iter()
        .find(|token| is_entry_point(token))?;

    let dir = script[..script.len() - ENTRY_POINT.len()].trim_end_matches(['/', '\\']);
    let dir = PathBuf::from(if dir.is_empty() { "." } else { dir });

    let candidate = if is_absolute_any(&dir) {
        dir
    } else {
        entry.cwd.as_ref()?.join(dir)
    };

    if candidate.is_dir() {
        Some(normalize_path(&candidate))
    } else {
        None
    }
}

fn is_entry_point(token: &str) -> bool {
    token == ENTRY_POINT
        || token.ends_with(&format!("/{}", ENTRY_POINT))
        || token.ends_with(&format!("\\{}", ENTRY_POINT))
}

/// Absolute on this host, or a Windows drive path seen from anywhere
fn is_absolute_any(path: &std::path::Path) -> bool {
    if path.is_absolute() {
        return true;
    }
    let s = path.to_string_lossy();
    let bytes = s.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Split a command line on whitespace, honoring double quotes
pub fn split_command_line(command_line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in command_line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
