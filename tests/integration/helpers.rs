//! Shared test helpers for supervisor integration tests

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use warden::command::FakeCommandRunner;
use warden::service::descriptor::WRAPPER_EVENT_LOG_FILE_NAME;
use warden::{JobSupervisor, SupervisorConfig};

/// Count query fragment; a "0" response lets teardown complete.
pub const COUNT_QUERY: &str = ".Length";

pub struct TestHost {
    pub temp: TempDir,
    pub fake: Arc<FakeCommandRunner>,
    pub supervisor: Arc<JobSupervisor>,
}

/// Test helper: Create a supervisor rooted in a temp dir with the service
/// wrapper binary in place.
pub fn setup_host() -> TestHost {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let mut config = SupervisorConfig::with_base_dir(temp.path());
    config.tail_backoff_ms = 10;
    config.delete_poll_interval_ms = 1;

    let bin_dir = config.bin_dir();
    fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
    fs::write(bin_dir.join("job-service-wrapper.exe"), b"wrapper")
        .expect("Failed to write wrapper exe");

    let fake = Arc::new(FakeCommandRunner::new());
    let supervisor = Arc::new(JobSupervisor::new(config, fake.clone()));
    TestHost {
        temp,
        fake,
        supervisor,
    }
}

/// Test helper: Write a job's process config under `jobs/<job>/monit`
pub fn write_job_config(root: &Path, job: &str, processes: &[&str]) -> PathBuf {
    let job_dir = root.join("jobs").join(job);
    fs::create_dir_all(&job_dir).expect("Failed to create job dir");

    let entries: Vec<String> = processes
        .iter()
        .map(|name| format!(r#"{{"name":"{name}","executable":"{name}.exe"}}"#))
        .collect();
    let path = job_dir.join("monit");
    fs::write(&path, format!(r#"{{"processes":[{}]}}"#, entries.join(",")))
        .expect("Failed to write job config");
    path
}

/// Path of the wrapper's failure event log for one process
pub fn event_log_path(supervisor: &JobSupervisor, job: &str, process: &str) -> PathBuf {
    supervisor
        .config()
        .logs_dir()
        .join(job)
        .join(process)
        .join(WRAPPER_EVENT_LOG_FILE_NAME)
}

/// Test helper: Append raw bytes to an event log, as the wrapper would
pub fn append_event_bytes(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .expect("Failed to open event log");
    file.write_all(bytes).expect("Failed to append to event log");
    file.flush().expect("Failed to flush event log");
}

/// Test helper: Append one complete "exited" record
pub fn append_exit_event(path: &Path, process: &str, exit_code: i64) {
    let record = format!(
        r#"{{"datetime":"2026-10-18T12:00:00Z","event":"exited","processName":"{process}","exitCode":{exit_code}}}"#
    );
    append_event_bytes(path, format!("{record}\n").as_bytes());
}

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
