//! Fake ComfyUI installations and sample logs.

use anyhow::Result;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Files that make a directory look like a ComfyUI checkout
pub const MARKER_FILES: [&str; 3] = ["main.py", "nodes.py", "execution.py"];

/// Startup followed by a CUDA out-of-memory traceback
pub const CUDA_OOM_LOG: &str = "\
Total VRAM 8192 MB, total RAM 32768 MB
Set vram state to: NORMAL_VRAM
Starting server

To see the GUI go to: http://127.0.0.1:8188
got prompt
!!! Exception during processing !!! CUDA out of memory. Tried to allocate 2.50 GiB
Traceback (most recent call last):
  File \"/opt/ComfyUI/execution.py\", line 151, in recursive_execute
torch.cuda.OutOfMemoryError: CUDA out of memory.
Prompt executed in 4.12 seconds
";

/// A custom node failing inside the executor
pub const NODE_ERROR_LOG: &str = "\
got prompt
Error occurred when executing KSampler:

mat1 and mat2 shapes cannot be multiplied (154x2048 and 768x320)
Prompt executed in 0.51 seconds
";

/// A quiet session with nothing to report
pub const CLEAN_LOG: &str = "\
Starting server
got prompt
Prompt executed in 1.02 seconds
";

/// A fake installation rooted somewhere in a temp dir
#[derive(Debug, Clone)]
pub struct ComfyInstall {
    root: PathBuf,
}

impl ComfyInstall {
    /// Create `root` with all marker files
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_markers(root, &MARKER_FILES)
    }

    /// Create `root` with only the given marker files
    pub fn with_markers(root: impl Into<PathBuf>, markers: &[&str]) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        for marker in markers {
            fs::write(root.join(marker), "")?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a log relative to the root, creating parent dirs
    pub fn write_log(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a log and pin its modification time (seconds since the epoch)
    pub fn write_log_at(&self, relative: &str, content: &str, unix_secs: i64) -> Result<PathBuf> {
        let path = self.write_log(relative, content)?;
        set_mtime(&path, unix_secs)?;
        Ok(path)
    }
}

/// Pin a file's modification time
pub fn set_mtime(path: &Path, unix_secs: i64) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0))?;
    Ok(())
}
