//! Background process management for long-running commands.
//!
//! `comfy-guru tail` and `comfy-guru serve` never exit on their own; tests
//! spawn them here, read what they print, and kill them on drop.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// A background process handle.
pub struct BackgroundProcess {
    child: Child,
    lines: Option<Receiver<String>>,
}

impl BackgroundProcess {
    /// Spawn with piped stdin and stdout; stdout lines are collected on a thread.
    pub fn spawn_piped(mut command: Command) -> std::io::Result<Self> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        let mut child = command.spawn()?;

        let lines = child.stdout.take().map(|stdout| {
            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
            rx
        });

        Ok(Self { child, lines })
    }

    /// Next stdout line, or `None` if nothing arrives within `timeout`.
    pub fn next_line(&self, timeout: Duration) -> Option<String> {
        self.lines.as_ref()?.recv_timeout(timeout).ok()
    }

    /// Keep reading until a line satisfies `pred` or `timeout` passes per line.
    pub fn wait_for_line(&self, timeout: Duration, pred: impl Fn(&str) -> bool) -> Option<String> {
        while let Some(line) = self.next_line(timeout) {
            if pred(&line) {
                return Some(line);
            }
        }
        None
    }

    /// Get mutable access to the process's stdin.
    pub fn stdin(&mut self) -> Option<&mut ChildStdin> {
        self.child.stdin.as_mut()
    }

    /// Close stdin so the child sees end of input.
    pub fn close_stdin(&mut self) {
        self.child.stdin.take();
    }

    /// Wait for the process to exit with a timeout.
    pub fn wait_timeout(
        &mut self,
        timeout: Duration,
    ) -> std::io::Result<Option<std::process::ExitStatus>> {
        // Simple polling implementation
        let start = std::time::Instant::now();
        loop {
            match self.child.try_wait()? {
                Some(status) => return Ok(Some(status)),
                None => {
                    if start.elapsed() > timeout {
                        return Ok(None);
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }

    /// Kill the process.
    pub fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill()
    }

    /// Get the process ID.
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for BackgroundProcess {
    fn drop(&mut self) {
        // Ensure process is killed when dropped
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_reads_lines_from_child() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo one; echo two"]);
        let mut proc = BackgroundProcess::spawn_piped(cmd).unwrap();

        let found = proc.wait_for_line(Duration::from_secs(5), |l| l == "two");
        assert_eq!(found.as_deref(), Some("two"));
        assert!(proc.wait_timeout(Duration::from_secs(5)).unwrap().is_some());
    }
}
