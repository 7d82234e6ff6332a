//! Error conditions callers need to branch on.
//!
//! Most fallible paths return `anyhow::Result` with context attached. The
//! variants here are the ones a caller may want to recover with
//! `anyhow::Error::downcast_ref::<SupervisorError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Process name cannot double as a service id and a path segment
    #[error("invalid process name '{name}': {reason}")]
    InvalidProcessName { name: String, reason: String },

    /// Process spec has no executable to run
    #[error("process '{name}' has an empty executable path")]
    MissingExecutable { name: String },

    /// Configuration document could not be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Services were still registered after the deletion poll budget ran out
    #[error("teardown incomplete: services still present after {attempts} attempts")]
    TeardownIncomplete { attempts: u32 },

    /// The supervisor was torn down and cannot monitor new jobs
    #[error("supervisor has exited; no further jobs can be monitored")]
    Exited,

    /// The failure channel already has a consumer
    #[error("failure dispatch loop is already running")]
    DispatchTaken,

    /// An external command ran but reported failure
    #[error("command '{command}' failed with exit code {exit_code:?}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}
