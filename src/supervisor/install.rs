//! Job registration: render descriptors, start tailers, install services.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::core::{JobSupervisor, RunningTailer};
use crate::error::SupervisorError;
use crate::job::{Job, ProcessSpec};
use crate::monitor::EventTailer;
use crate::service::descriptor::{
    WRAPPER_APP_CONFIG_BODY, WRAPPER_APP_CONFIG_FILE_NAME, WRAPPER_CONFIG_FILE_NAME,
    WRAPPER_EVENT_LOG_FILE_NAME, WRAPPER_EXE_FILE_NAME,
};

impl JobSupervisor {
    /// Register every process listed in the document at `config_path`.
    ///
    /// Process directories are created next to `config_path`. An empty
    /// document registers nothing.
    pub fn add_job(&self, job_name: &str, job_index: usize, config_path: &Path) -> Result<()> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read job config: {}", config_path.display()))?;

        if content.trim().is_empty() {
            debug!(
                job = job_name,
                "Skipping job configuration, empty config file {}",
                config_path.display()
            );
            return Ok(());
        }

        let job = Job::from_config(job_name, &content)?;
        let job_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

        debug!(
            job = job_name,
            index = job_index,
            "Configuring service wrapper with config {}",
            config_path.display()
        );
        self.install(&job, job_dir)
    }

    /// Install each of `job`'s processes as a service under `job_dir`.
    ///
    /// Stops at the first failure; processes already installed stay
    /// installed. Re-running is safe since install is idempotent per name.
    pub fn install(&self, job: &Job, job_dir: &Path) -> Result<()> {
        if self.monitor.is_exited() {
            return Err(SupervisorError::Exited.into());
        }

        for process in &job.processes {
            self.install_process(&job.name, process, job_dir)?;
        }

        info!(job = %job.name, processes = job.processes.len(), "Installed job services");
        Ok(())
    }

    fn install_process(&self, job_name: &str, process: &ProcessSpec, job_dir: &Path) -> Result<()> {
        process.validate_name()?;

        let log_dir = self.config.logs_dir().join(job_name).join(&process.name);
        fs::create_dir_all(&log_dir).with_context(|| {
            format!("Creating log directory for service '{}'", process.name)
        })?;

        let descriptor = process.service_descriptor(&log_dir)?;
        let rendered = descriptor.to_xml()?;

        let process_dir = job_dir.join(&process.name);
        fs::create_dir_all(&process_dir).with_context(|| {
            format!(
                "Creating job directory for service '{}' at '{}'",
                process.name,
                process_dir.display()
            )
        })?;

        // The old tailer's read offset is meaningless once the log is truncated
        self.retire_tailer(job_name, &process.name);

        // The wrapper appends one JSON record per failure to this file.
        let event_log = log_dir.join(WRAPPER_EVENT_LOG_FILE_NAME);
        fs::write(&event_log, b"").with_context(|| {
            format!(
                "Creating JSON event log for service '{}' at '{}'",
                process.name,
                event_log.display()
            )
        })?;
        self.monitor_process(job_name, &process.name, &event_log)
            .with_context(|| format!("Monitoring job for service '{}'", process.name))?;

        fs::write(process_dir.join(WRAPPER_CONFIG_FILE_NAME), rendered)
            .with_context(|| format!("Saving service config file for service '{}'", process.name))?;

        fs::write(
            process_dir.join(WRAPPER_APP_CONFIG_FILE_NAME),
            WRAPPER_APP_CONFIG_BODY,
        )
        .with_context(|| {
            format!(
                "Saving app runtime config file for service '{}'",
                process.name
            )
        })?;

        let wrapper_src = self.config.bin_dir().join(WRAPPER_EXE_FILE_NAME);
        let wrapper_exe = process_dir.join(WRAPPER_EXE_FILE_NAME);
        fs::copy(&wrapper_src, &wrapper_exe).with_context(|| {
            format!(
                "Copying service wrapper in job directory '{}'",
                process_dir.display()
            )
        })?;

        self.services
            .install_wrapper(&wrapper_exe.to_string_lossy())
            .with_context(|| format!("Creating service '{}'", process.name))?;

        debug!(job = job_name, process = %process.name, "Installed service");
        Ok(())
    }

    /// Spawn a tailer for `event_log` publishing into the shared channel.
    fn monitor_process(
        &self,
        job_name: &str,
        process_name: &str,
        event_log: &Path,
    ) -> Result<()> {
        let sender = self
            .events_tx
            .lock()
            .ok()
            .and_then(|tx| tx.clone())
            .ok_or(SupervisorError::Exited)?;

        let tailer = EventTailer::open(
            process_name,
            event_log,
            &self.monitor,
            sender,
            self.config.tail_backoff(),
        )?;
        let id = tailer.id();
        let thread = tailer.spawn()?;

        if let Ok(mut tailers) = self.tailers.lock() {
            tailers.retain(|_, t| !t.thread.is_finished());
            tailers.insert(
                (job_name.to_string(), process_name.to_string()),
                RunningTailer { id, thread },
            );
        }
        Ok(())
    }

    /// Stop and join the tailer already following this process's log, if
    /// any.
    fn retire_tailer(&self, job_name: &str, process_name: &str) {
        let key = (job_name.to_string(), process_name.to_string());
        let previous = self
            .tailers
            .lock()
            .ok()
            .and_then(|mut tailers| tailers.remove(&key));

        if let Some(previous) = previous {
            self.monitor.retire(previous.id);
            if previous.thread.join().is_err() {
                warn!(job = job_name, process = process_name, "Event log tailer panicked");
            }
            debug!(job = job_name, process = process_name, "Retired previous event log tailer");
        }
    }
}
