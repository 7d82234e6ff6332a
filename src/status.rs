//! Supervisor-level status and the stopped marker.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::service::RUNNING_STATE;

/// File name of the stopped marker inside the monit directory.
pub const STOPPED_MARKER_FILE_NAME: &str = "stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorStatus {
    Running,
    Failing,
    Stopped,
}

impl SupervisorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SupervisorStatus::Running => "running",
            SupervisorStatus::Failing => "failing",
            SupervisorStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SupervisorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapse the stopped marker and the manager's reported states into one
/// status.
///
/// The marker wins over anything the manager reports. A failed query counts
/// as failing, an empty report as running.
pub fn aggregate<E>(marker_present: bool, states: Result<&[String], E>) -> SupervisorStatus {
    if marker_present {
        return SupervisorStatus::Stopped;
    }

    match states {
        Err(_) => SupervisorStatus::Failing,
        Ok(states) if states.iter().all(|s| s == RUNNING_STATE) => SupervisorStatus::Running,
        Ok(_) => SupervisorStatus::Failing,
    }
}

/// Split state query output into one state name per line.
pub fn parse_states(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Zero-byte file recording that the supervisor was stopped on purpose.
#[derive(Debug, Clone)]
pub struct StoppedMarker {
    path: PathBuf,
}

impl StoppedMarker {
    pub fn new(monit_dir: &Path) -> Self {
        Self {
            path: monit_dir.join(STOPPED_MARKER_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    pub fn set(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create marker directory: {}", parent.display())
            })?;
        }
        fs::write(&self.path, b"")
            .with_context(|| format!("Failed to write stopped marker: {}", self.path.display()))
    }

    /// Remove the marker; an absent marker is already clear.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove stopped marker: {}", self.path.display())
            }),
        }
    }
}
