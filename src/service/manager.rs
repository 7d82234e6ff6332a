//! Bulk queries against the OS service manager
//!
//! Each query is a short script run through the configured interpreter. All
//! of them select services by [`SERVICE_DESCRIPTION`] so they only ever touch
//! services this supervisor installed.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use super::descriptor::SERVICE_DESCRIPTION;
use crate::command::{CommandOutput, CommandRunner};
use crate::config::SupervisorConfig;

/// Run-state literal the manager reports for a healthy service.
pub const RUNNING_STATE: &str = "Running";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceQuery {
    StartAll,
    StopAll,
    DeleteAll,
    States,
    DisableAutostart,
    Count,
}

impl ServiceQuery {
    /// Script body for this query.
    pub fn script(self) -> String {
        let selector = format!(
            "(get-wmiobject win32_service -filter \"description='{SERVICE_DESCRIPTION}'\")"
        );
        match self {
            ServiceQuery::StartAll => format!("{selector} | ForEach{{ Start-Service $_.Name }}"),
            ServiceQuery::StopAll => format!("{selector} | ForEach{{ Stop-Service $_.Name }}"),
            ServiceQuery::DeleteAll => format!("{selector} | ForEach{{ $_.delete() }}"),
            ServiceQuery::States => format!("{selector} | ForEach{{ $_.State }}"),
            ServiceQuery::DisableAutostart => format!(
                "{selector} | ForEach{{ Set-Service $_.Name -startuptype \"Disabled\" }}"
            ),
            ServiceQuery::Count => format!("{selector}.Length"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ServiceQuery::StartAll => "starting services",
            ServiceQuery::StopAll => "stopping services",
            ServiceQuery::DeleteAll => "deleting services",
            ServiceQuery::States => "querying service states",
            ServiceQuery::DisableAutostart => "disabling service autostart",
            ServiceQuery::Count => "counting services",
        }
    }
}

/// Issues [`ServiceQuery`] scripts through a [`CommandRunner`].
#[derive(Clone)]
pub struct ServiceManager {
    runner: Arc<dyn CommandRunner>,
    interpreter: String,
    interpreter_args: Vec<String>,
}

impl ServiceManager {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &SupervisorConfig) -> Self {
        Self {
            runner,
            interpreter: config.interpreter.clone(),
            interpreter_args: config.interpreter_args.clone(),
        }
    }

    pub fn run(&self, query: ServiceQuery) -> Result<CommandOutput> {
        let mut args = self.interpreter_args.clone();
        args.push(query.script());
        debug!(query = ?query, "Running service manager query");

        self.runner
            .run_command(&self.interpreter, &args)
            .with_context(|| format!("Service manager failed {}", query.label()))
    }

    /// Run-state names of every owned service, one per reported line.
    pub fn states(&self) -> Result<Vec<String>> {
        let output = self.run(ServiceQuery::States)?;
        Ok(crate::status::parse_states(&output.stdout))
    }

    /// Whether the count query reports that no owned services remain.
    pub fn none_remaining(&self) -> Result<bool> {
        let output = self.run(ServiceQuery::Count)?;
        Ok(output.stdout.trim() == "0")
    }

    /// Run the service wrapper's own `install` verb.
    pub fn install_wrapper(&self, wrapper_exe: &str) -> Result<CommandOutput> {
        self.runner.run_command(wrapper_exe, &["install".to_string()])
    }
}
