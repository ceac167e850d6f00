//! Bounded execution of external helper commands.
//!
//! Process listing shells out to platform tools (`ps`, `wmic`) which can hang
//! on a busy or misconfigured host. Every such call goes through
//! [`output_with_timeout`] so a stuck tool costs at most the timeout.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Output of a command that finished before its deadline
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `command` and capture stdout, giving up after `timeout`.
///
/// Returns `Ok(None)` when the deadline passes; the child is killed and
/// reaped before returning. Stdout is drained on a separate thread so a
/// chatty child cannot block on a full pipe while we poll. Invalid UTF-8 in
/// the output is replaced.
pub fn output_with_timeout(
    command: &mut Command,
    timeout: Duration,
) -> std::io::Result<Option<CapturedOutput>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;

    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // A grandchild may still hold the pipe; leave the reader detached.
                    drop(reader);
                    tracing::debug!(?timeout, "command timed out");
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let bytes = reader.join().unwrap_or_default();

    Ok(Some(CapturedOutput {
        status,
        stdout: String::from_utf8_lossy(&bytes).into_owned(),
    }))
}
