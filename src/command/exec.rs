//! `CommandRunner` backed by `std::process::Command`.

use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

use super::{command_line, CommandOutput, CommandRunner};
use crate::error::SupervisorError;

/// How long to wait for pipe reader threads after the child exits
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs commands as child processes with a wall-clock timeout.
#[derive(Debug, Clone)]
pub struct ExecCommandRunner {
    timeout: Duration,
}

impl ExecCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fail early if `program` cannot be found on `PATH`.
    pub fn check_available(program: &str) -> Result<()> {
        which::which(program)
            .map(|_| ())
            .with_context(|| format!("'{program}' was not found on PATH"))
    }
}

impl CommandRunner for ExecCommandRunner {
    fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = command_line(program, args);
        debug!(command = %line, "Running command");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn command: {line}"))?;

        // Pipes must be drained while waiting or a full buffer blocks the child
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let status = match child
            .wait_timeout(self.timeout)
            .with_context(|| format!("Failed to wait for command: {line}"))?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                anyhow::bail!(
                    "Command timed out after {}s: {line}",
                    self.timeout.as_secs()
                );
            }
        };

        let stdout = stdout_rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_default();
        let stderr = stderr_rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_default();

        if !status.success() {
            return Err(SupervisorError::CommandFailed {
                command: line,
                exit_code: status.code(),
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(mut stream) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stream.read_to_end(&mut buf);
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}
