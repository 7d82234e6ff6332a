//! Core JobSupervisor struct and constructor.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::command::CommandRunner;
use crate::config::SupervisorConfig;
use crate::monitor::{FailureEvent, SyncMonitor};
use crate::service::ServiceManager;
use crate::status::StoppedMarker;

/// Supervises jobs registered as OS services.
///
/// `add_job`, `start`, `stop` and `remove_all_jobs` drive a single external
/// service manager and must not run concurrently; callers serialize them.
pub struct JobSupervisor {
    pub(super) config: SupervisorConfig,
    pub(super) runner: Arc<dyn CommandRunner>,
    pub(super) services: ServiceManager,
    pub(super) marker: StoppedMarker,
    pub(super) monitor: SyncMonitor,
    /// Cloned into every tailer; dropped on teardown so the dispatch loop
    /// can observe the channel closing.
    pub(super) events_tx: Mutex<Option<SyncSender<FailureEvent>>>,
    pub(super) events_rx: Mutex<Option<Receiver<FailureEvent>>>,
    pub(super) tailers: Mutex<HashMap<TailerKey, RunningTailer>>,
}

/// `(job, process)`; each event log has at most one tailer.
pub(super) type TailerKey = (String, String);

pub(super) struct RunningTailer {
    pub(super) id: u64,
    pub(super) thread: JoinHandle<()>,
}

impl JobSupervisor {
    pub fn new(config: SupervisorConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let (events_tx, events_rx) = mpsc::sync_channel(config.channel_capacity.max(1));
        Self {
            services: ServiceManager::new(Arc::clone(&runner), &config),
            marker: StoppedMarker::new(&config.monit_dir()),
            monitor: SyncMonitor::new(),
            events_tx: Mutex::new(Some(events_tx)),
            events_rx: Mutex::new(Some(events_rx)),
            tailers: Mutex::new(HashMap::new()),
            runner,
            config,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Gate shared by every tailer this supervisor spawned.
    pub fn monitor(&self) -> &SyncMonitor {
        &self.monitor
    }

    pub fn stopped_marker_path(&self) -> PathBuf {
        self.marker.path().to_path_buf()
    }

    /// Nothing to reload: the service manager owns process state.
    pub fn reload(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Per-process details are not tracked for OS services.
    pub fn processes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Number of tailer threads still running.
    pub fn active_tailers(&self) -> usize {
        self.tailers
            .lock()
            .map(|t| t.values().filter(|t| !t.thread.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Drop for JobSupervisor {
    /// Tailers must not outlive the supervisor that owns their channel.
    fn drop(&mut self) {
        self.monitor.exit();
    }
}
