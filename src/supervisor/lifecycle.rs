//! Supervisor lifecycle: start, stop, status, teardown and failure dispatch.

use anyhow::{Context, Result};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

use super::core::JobSupervisor;
use crate::alert::FailureHandler;
use crate::error::SupervisorError;
use crate::monitor::run_dispatch;
use crate::service::ServiceQuery;
use crate::status::{aggregate, SupervisorStatus};

impl JobSupervisor {
    /// Resume tailers, start every owned service and clear the stopped
    /// marker.
    ///
    /// If the start query fails the marker is left in place.
    pub fn start(&self) -> Result<()> {
        self.monitor.start();

        self.services
            .run(ServiceQuery::StartAll)
            .context("Starting windows job process")?;

        self.marker.clear().context("Removing stopped file")?;

        info!("Started job services");
        Ok(())
    }

    /// Pause tailers, stop every owned service and write the stopped marker.
    ///
    /// A marker write failure is returned even though the services were
    /// stopped.
    pub fn stop(&self) -> Result<()> {
        self.monitor.stop();

        self.services
            .run(ServiceQuery::StopAll)
            .context("Stopping services")?;

        self.marker.set().context("Creating stopped file")?;

        info!("Stopped job services");
        Ok(())
    }

    /// Disable restart-on-boot for owned services without stopping them.
    pub fn unmonitor(&self) -> Result<()> {
        self.services.run(ServiceQuery::DisableAutostart)?;
        Ok(())
    }

    pub fn status(&self) -> SupervisorStatus {
        if self.marker.is_set() {
            return SupervisorStatus::Stopped;
        }

        let states = self.services.states();
        match &states {
            Ok(states) if states.is_empty() => {
                debug!("No statuses reported for job processes");
            }
            Ok(states) => debug!(?states, "Got statuses"),
            Err(e) => debug!("Querying service states failed: {e:#}"),
        }

        aggregate(false, states.as_deref())
    }

    /// Terminate all tailers, delete every owned service and wait until the
    /// service manager no longer reports any.
    ///
    /// Returns [`SupervisorError::TeardownIncomplete`] when services remain
    /// after the configured number of count polls. Terminal: the supervisor
    /// cannot monitor new jobs afterwards.
    pub fn remove_all_jobs(&self) -> Result<()> {
        self.monitor.exit();
        if let Ok(mut tx) = self.events_tx.lock() {
            tx.take();
        }

        self.services
            .run(ServiceQuery::DeleteAll)
            .context("Removing Windows job supervisor services")?;

        let max_retries = self.config.delete_max_retries;
        let interval = self.config.delete_poll_interval();
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            let gone = self
                .services
                .none_remaining()
                .context("Checking if Windows job supervisor services exist")?;
            if gone {
                break;
            }

            attempts += 1;
            if attempts >= max_retries {
                return Err(SupervisorError::TeardownIncomplete { attempts }.into());
            }
            debug!(
                "Waiting for services to be deleted: attempt ({attempts}) time ({:?})",
                start.elapsed()
            );
            thread::sleep(interval);
        }

        debug!(
            "Removed Windows job supervisor services: attempts ({attempts}) time ({:?})",
            start.elapsed()
        );
        Ok(())
    }

    /// Run the failure dispatch loop on the calling thread until the event
    /// channel closes, which happens after `remove_all_jobs` once every
    /// tailer has exited.
    ///
    /// Only one dispatch loop may run per supervisor.
    pub fn monitor_job_failures(&self, handler: FailureHandler) -> Result<()> {
        let events = self
            .events_rx
            .lock()
            .ok()
            .and_then(|mut rx| rx.take())
            .ok_or(SupervisorError::DispatchTaken)?;

        run_dispatch(events, handler);
        Ok(())
    }
}
