use comfy_guru_core::output_with_timeout;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Upper bound for one call to the platform process-list tool
pub const LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// One running process as seen by a [`ProcessLister`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: Option<u32>,
    pub command_line: String,
    /// Working directory, when the platform exposes it
    pub cwd: Option<PathBuf>,
}

impl ProcessEntry {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            pid: None,
            command_line: command_line.into(),
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Result of asking the host for its process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessListing {
    Listed(Vec<ProcessEntry>),
    /// The listing tool did not finish within its timeout
    TimedOut,
    /// The tool is missing, failed, or the platform is unsupported
    Unavailable(String),
}

impl ProcessListing {
    /// Entries on success, empty otherwise
    pub fn into_entries(self) -> Vec<ProcessEntry> {
        match self {
            ProcessListing::Listed(entries) => entries,
            ProcessListing::TimedOut | ProcessListing::Unavailable(_) => Vec::new(),
        }
    }
}

/// Capability: list the command lines of running processes.
///
/// Implementations never fail; problems are reported through
/// [`ProcessListing::TimedOut`] and [`ProcessListing::Unavailable`].
pub trait ProcessLister: Send + Sync {
    fn list(&self) -> ProcessListing;
}

/// Lists processes through the host's own tools (`ps`, `wmic`)
#[derive(Debug, Clone)]
pub struct SystemProcessLister {
    timeout: Duration,
}

impl Default for SystemProcessLister {
    fn default() -> Self {
        Self {
            timeout: LIST_TIMEOUT,
        }
    }
}

impl SystemProcessLister {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run(&self, command: &mut Command, tool: &str) -> Result<String, ProcessListing> {
        match output_with_timeout(command, self.timeout) {
            Ok(Some(output)) if output.success() => Ok(output.stdout),
            Ok(Some(output)) => Err(ProcessListing::Unavailable(format!(
                "{} exited with {}",
                tool, output.status
            ))),
            Ok(None) => Err(ProcessListing::TimedOut),
            Err(err) => Err(ProcessListing::Unavailable(format!(
                "failed to run {}: {}",
                tool, err
            ))),
        }
    }
}

impl ProcessLister for SystemProcessLister {
    #[cfg(unix)]
    fn list(&self) -> ProcessListing {
        let stdout = match self.run(Command::new("ps").args(["-eo", "pid=,args="]), "ps") {
            Ok(stdout) => stdout,
            Err(listing) => return listing,
        };

        let entries = parse_ps_output(&stdout)
            .into_iter()
            .map(|mut entry| {
                entry.cwd = entry.pid.and_then(process_cwd);
                entry
            })
            .collect();

        ProcessListing::Listed(entries)
    }

    #[cfg(windows)]
    fn list(&self) -> ProcessListing {
        let mut command = Command::new("wmic");
        command.args([
            "process",
            "where",
            "name='python.exe'",
            "get",
            "ProcessId,CommandLine",
            "/format:csv",
        ]);

        match self.run(&mut command, "wmic") {
            Ok(stdout) => ProcessListing::Listed(parse_wmic_csv(&stdout)),
            Err(listing) => listing,
        }
    }

    #[cfg(not(any(unix, windows)))]
    fn list(&self) -> ProcessListing {
        ProcessListing::Unavailable("process listing is not supported on this platform".into())
    }
}

/// Fixed process table, for tests and for callers that already hold one
#[derive(Debug, Clone, Default)]
pub struct StaticProcessLister {
    listing: Option<ProcessListing>,
}

impl StaticProcessLister {
    pub fn new(entries: Vec<ProcessEntry>) -> Self {
        Self {
            listing: Some(ProcessListing::Listed(entries)),
        }
    }

    pub fn from_command_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(ProcessEntry::new).collect())
    }

    pub fn failing(listing: ProcessListing) -> Self {
        Self {
            listing: Some(listing),
        }
    }
}

impl ProcessLister for StaticProcessLister {
    fn list(&self) -> ProcessListing {
        self.listing
            .clone()
            .unwrap_or(ProcessListing::Listed(Vec::new()))
    }
}

/// Parse `ps -eo pid=,args=` output
pub fn parse_ps_output(stdout: &str) -> Vec<ProcessEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let (pid, args) = line.split_once(char::is_whitespace)?;
            let args = args.trim();
            if args.is_empty() {
                return None;
            }
            Some(ProcessEntry {
                pid: pid.parse().ok(),
                command_line: args.to_string(),
                cwd: None,
            })
        })
        .collect()
}

/// Parse `wmic ... get ProcessId,CommandLine /format:csv` output.
///
/// Columns come back alphabetically: `Node,CommandLine,ProcessId`. The
/// command line itself may contain commas, so the node is split off the
/// front and the pid off the back.
pub fn parse_wmic_csv(stdout: &str) -> Vec<ProcessEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (rest, pid) = line.rsplit_once(',')?;
            let (_node, command_line) = rest.split_once(',')?;
            if command_line.is_empty() || command_line == "CommandLine" {
                return None;
            }
            Some(ProcessEntry {
                pid: pid.trim().parse().ok(),
                command_line: command_line.to_string(),
                cwd: None,
            })
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn process_cwd(pid: u32) -> Option<PathBuf> {
    std::fs::read_link(format!("/proc/{}/cwd", pid)).ok()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn process_cwd(_pid: u32) -> Option<PathBuf> {
    None
}
