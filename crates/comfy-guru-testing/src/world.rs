//! TestWorld pattern for declarative integration test setup.
//!
//! Provides a fluent interface for:
//! - Creating an isolated config directory (settings + pattern catalog)
//! - Building fake ComfyUI installations with logs
//! - Executing CLI commands against that configuration

use anyhow::Result;
use assert_cmd::Command;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixtures::ComfyInstall;

/// Environment variables that would leak the developer's own setup into tests
const ISOLATED_ENV: [&str; 4] = [
    "COMFYUI_PATHS",
    "COMFY_GURU_SETTINGS",
    "COMFY_GURU_PATTERNS",
    "RUST_LOG",
];

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use comfy_guru_testing::TestWorld;
///
/// let mut world = TestWorld::new();
/// let install = world.install("ComfyUI");
/// install.write_log("comfyui.log", "got prompt\n").unwrap();
///
/// let result = world.run(&["logs"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    cwd: PathBuf,
    config_dir: PathBuf,
    known_paths: Vec<PathBuf>,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let config_dir = base_path.join(".comfy-guru");

        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        Self {
            cwd: base_path,
            temp_dir,
            config_dir,
            known_paths: Vec::new(),
            env_vars: HashMap::new(),
        }
    }

    /// Get the config directory holding settings and patterns.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.env")
    }

    pub fn patterns_path(&self) -> PathBuf {
        self.config_dir.join("error_patterns.json")
    }

    /// Get the temp directory root.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Known paths written to the settings file so far.
    pub fn known_paths(&self) -> &[PathBuf] {
        &self.known_paths
    }

    /// Create a full installation under the temp root and list it in settings.
    pub fn install(&mut self, name: &str) -> ComfyInstall {
        let install = self.unlisted_install(name);
        self.add_known_path(install.root().to_path_buf());
        install
    }

    /// Create a full installation that settings do not mention.
    pub fn unlisted_install(&self, name: &str) -> ComfyInstall {
        ComfyInstall::create(self.temp_dir.path().join(name))
            .expect("Failed to create installation")
    }

    /// Add a path to `COMFYUI_PATHS`, whether or not it exists.
    pub fn add_known_path(&mut self, path: impl Into<PathBuf>) {
        self.known_paths.push(path.into());
        self.write_settings();
    }

    /// Replace the settings file with raw content.
    pub fn with_settings_content(self, content: &str) -> Self {
        std::fs::write(self.settings_path(), content).expect("Failed to write settings");
        self
    }

    /// Write the pattern catalog file.
    pub fn with_patterns(self, json: &str) -> Self {
        std::fs::write(self.patterns_path(), json).expect("Failed to write patterns");
        self
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    fn write_settings(&self) {
        let paths: Vec<String> = self
            .known_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let content = format!("# written by TestWorld\nCOMFYUI_PATHS={}\n", paths.join(","));
        std::fs::write(self.settings_path(), content).expect("Failed to write settings");
    }

    /// Global flags pointing the CLI at this world's configuration.
    /// The host's process table is never scanned.
    pub fn global_args(&self) -> Vec<OsString> {
        vec![
            "--settings".into(),
            self.settings_path().into(),
            "--patterns".into(),
            self.patterns_path().into(),
            "--no-process-scan".into(),
        ]
    }

    /// Configure a CLI command with this test environment's settings.
    ///
    /// The caller must provide the base command (e.g., from `cargo_bin_cmd!("comfy-guru")`).
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.args(self.global_args()).current_dir(&self.cwd);
        for key in ISOLATED_ENV {
            cmd.env_remove(key);
        }
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    /// Same as [`TestWorld::configure_command`] for commands that run in the background.
    pub fn configure_std_command<'a>(
        &self,
        cmd: &'a mut std::process::Command,
    ) -> &'a mut std::process::Command {
        cmd.args(self.global_args()).current_dir(&self.cwd);
        for key in ISOLATED_ENV {
            cmd.env_remove(key);
        }
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    /// Execute a command using the project's binary and return the result.
    ///
    /// # Note
    /// This method uses `Command::cargo_bin()` which requires the binary to be
    /// built, which cargo test does automatically for the cli crate.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("comfy-guru")
            .map_err(|e| anyhow::anyhow!("Failed to find comfy-guru binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    /// Check if the command succeeded.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
