//! Blocking execution of external tools with streamed, line-wise output.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Poll interval while waiting on a process whose output is not captured.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Runs one external process at a time.
///
/// The runner only executes and reports. Callers decide what a non-zero
/// exit status means, usually via [`ensure_success`].
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// A runner that waits for processes indefinitely.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill processes that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `command` to completion.
    ///
    /// With `capture_output`, every output line is logged as it arrives;
    /// `merge_stderr` folds stderr into that stream. Without capturing, the
    /// output is discarded.
    pub fn run(
        &self,
        command: &ToolCommand,
        merge_stderr: bool,
        capture_output: bool,
    ) -> Result<ExitStatus> {
        tracing::debug!("Running [{}]", command);

        if !capture_output {
            let mut cmd = command.to_command();
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            let mut guard = ChildGuard::spawn(command, cmd)?;
            return guard.wait(command, self.deadline());
        }

        let (mut guard, lines) = self.spawn_streaming(command, merge_stderr)?;
        let deadline = self.deadline();
        while let Some(line) = next_line(&lines, command, deadline)? {
            tracing::info!("{}", line);
        }
        guard.wait(command, deadline)
    }

    /// Run `command` and feed each output line to `find` until it returns a
    /// value.
    ///
    /// Returns `Ok(None)` if the output ends without a match. When a match is
    /// found the process is not waited for to completion; it is terminated
    /// before this returns.
    pub fn scan<T>(
        &self,
        command: &ToolCommand,
        merge_stderr: bool,
        mut find: impl FnMut(&str) -> Option<T>,
    ) -> Result<Option<T>> {
        tracing::debug!("Scanning output of [{}]", command);

        let (mut guard, lines) = self.spawn_streaming(command, merge_stderr)?;
        let deadline = self.deadline();
        while let Some(line) = next_line(&lines, command, deadline)? {
            tracing::trace!("{}", line);
            if let Some(found) = find(&line) {
                return Ok(Some(found));
            }
        }
        guard.wait(command, deadline)?;
        Ok(None)
    }

    fn deadline(&self) -> Option<(Instant, Duration)> {
        self.timeout.map(|t| (Instant::now() + t, t))
    }

    fn spawn_streaming(
        &self,
        command: &ToolCommand,
        merge_stderr: bool,
    ) -> Result<(ChildGuard, Receiver<String>)> {
        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null()).stdout(Stdio::piped());
        cmd.stderr(if merge_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut guard = ChildGuard::spawn(command, cmd)?;
        let (tx, rx) = mpsc::channel();

        if let Some(stdout) = guard.child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = guard.child.stderr.take() {
            forward_lines(stderr, tx.clone());
        }
        drop(tx);

        Ok((guard, rx))
    }
}

/// Map a non-zero exit status to [`Error::ProcessFailed`].
pub fn ensure_success(command: &ToolCommand, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::process_failed(command.tool_name(), status))
    }
}

/// Both pipes feed one channel, so lines arrive interleaved in the order
/// they are read.
fn forward_lines<R: Read + Send + 'static>(source: R, tx: mpsc::Sender<String>) {
    thread::spawn(move || {
        for line in BufReader::new(source).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

fn next_line(
    lines: &Receiver<String>,
    command: &ToolCommand,
    deadline: Option<(Instant, Duration)>,
) -> Result<Option<String>> {
    match deadline {
        None => Ok(lines.recv().ok()),
        Some((at, after)) => {
            let remaining = at.saturating_duration_since(Instant::now());
            match lines.recv_timeout(remaining) {
                Ok(line) => Ok(Some(line)),
                Err(RecvTimeoutError::Disconnected) => Ok(None),
                Err(RecvTimeoutError::Timeout) => Err(Error::Timeout {
                    tool: command.tool_name(),
                    after,
                }),
            }
        }
    }
}

/// Owns a running child. Dropping it kills the process if it is still
/// running and reaps it, on every exit path.
struct ChildGuard {
    child: Child,
}

impl ChildGuard {
    fn spawn(command: &ToolCommand, mut cmd: std::process::Command) -> Result<Self> {
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(command.program())
            } else {
                Error::Spawn {
                    tool: command.tool_name(),
                    source: e,
                }
            }
        })?;
        Ok(Self { child })
    }

    fn wait(
        &mut self,
        command: &ToolCommand,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<ExitStatus> {
        let Some((at, after)) = deadline else {
            return Ok(self.child.wait()?);
        };

        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= at {
                return Err(Error::Timeout {
                    tool: command.tool_name(),
                    after,
                });
            }
            thread::sleep(WAIT_POLL);
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            tracing::debug!("Terminating process {}", self.child.id());
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
