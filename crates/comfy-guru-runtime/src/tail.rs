use crate::{Error, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Lines of existing content shown before following
pub const INITIAL_LINES: usize = 10;

/// How a follow session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailOutcome {
    pub lines_seen: usize,
    pub message: String,
}

/// Platform follower for `path`
pub fn follow_command(path: &Path) -> Result<Command> {
    if cfg!(windows) {
        let mut command = Command::new("powershell.exe");
        command.args(["-NoProfile", "-Command", powershell_script(path).as_str()]);
        Ok(command)
    } else if cfg!(unix) {
        let mut command = Command::new("tail");
        command
            .args(["-n", &INITIAL_LINES.to_string(), "-F"])
            .arg(path);
        Ok(command)
    } else {
        Err(Error::Tail(format!(
            "unsupported operating system for tailing: {}",
            std::env::consts::OS
        )))
    }
}

/// `-Command` joins its arguments unquoted, so the whole script goes in one
/// argument with the path as a single-quoted literal.
fn powershell_script(path: &Path) -> String {
    let literal = path.to_string_lossy().replace('\'', "''");
    format!(
        "Get-Content -LiteralPath '{}' -Tail {} -Wait -Encoding UTF8",
        literal, INITIAL_LINES
    )
}

/// Follow `path`, handing each new line to `on_line`.
///
/// Returns when the follower exits, or when `deadline` passes (the follower
/// is killed then). Without a deadline this runs until the follower dies.
pub fn tail_log(
    path: &Path,
    deadline: Option<Duration>,
    mut on_line: impl FnMut(&str),
) -> Result<TailOutcome> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let mut child = follow_command(path)?
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| Error::Tail(err.to_string()))?;

    let Some(stdout) = child.stdout.take() else {
        let _ = child.kill();
        return Err(Error::Tail("follower has no stdout".to_string()));
    };

    tracing::debug!(path = %path.display(), pid = child.id(), "tailing log");

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("comfy-guru-tail".to_string())
        .spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let started = Instant::now();
    let mut lines_seen = 0;
    loop {
        let next = match deadline {
            Some(limit) => {
                let remaining = limit.saturating_sub(started.elapsed());
                rx.recv_timeout(remaining)
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match next {
            Ok(line) => {
                lines_seen += 1;
                on_line(&line);
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(path = %path.display(), "tail deadline reached");
                let _ = child.kill();
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = child.wait();

    Ok(TailOutcome {
        lines_seen,
        message: format!("Stopped tailing {}", path.display()),
    })
}
