//! External command execution
//!
//! Every interaction with the service manager and the service wrapper goes
//! through a [`CommandRunner`], so the lifecycle controller can be driven
//! against a scripted runner in tests.

mod exec;
#[cfg(any(test, feature = "test-util"))]
mod fake;

use anyhow::Result;

pub use exec::ExecCommandRunner;
#[cfg(any(test, feature = "test-util"))]
pub use fake::FakeCommandRunner;

/// Captured result of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }
}

/// Runs a program to completion and returns its output.
///
/// Implementations treat a non-zero exit status as an error
/// (`SupervisorError::CommandFailed`).
pub trait CommandRunner: Send + Sync {
    fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Render a program and its arguments as one line for logs and errors.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.trim());
    }
    line
}
