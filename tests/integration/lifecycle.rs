//! Start, stop, status and teardown of a registered job.

use serial_test::serial;
use std::fs;
use std::time::Duration;

use warden::monitor::GateState;
use warden::service::descriptor::{ServiceDescriptor, WRAPPER_CONFIG_FILE_NAME};
use warden::{SupervisorError, SupervisorStatus};

use super::helpers::{setup_host, wait_until, write_job_config, COUNT_QUERY};

const STATES_QUERY: &str = "$_.State";

#[test]
#[serial]
fn test_job_lifecycle_round() {
    let host = setup_host();
    let config_path = write_job_config(host.temp.path(), "db", &["postgres", "backup"]);
    host.supervisor.add_job("db", 0, &config_path).unwrap();

    // One wrapper descriptor per process, next to the job's process config
    let job_dir = config_path.parent().unwrap();
    for process in ["postgres", "backup"] {
        let xml = fs::read_to_string(job_dir.join(process).join(WRAPPER_CONFIG_FILE_NAME))
            .expect("Expected a wrapper descriptor");
        let descriptor = ServiceDescriptor::from_xml(&xml).unwrap();
        assert_eq!(descriptor.id, process);
        assert_eq!(descriptor.executable, format!("{process}.exe"));
    }
    assert_eq!(host.supervisor.active_tailers(), 2);

    // The first answer is consumed, the second repeats
    host.fake.respond(STATES_QUERY, "Running\r\nRunning\r\n");
    host.fake.respond(STATES_QUERY, "Running\r\nStopped\r\n");
    host.supervisor.start().unwrap();
    assert_eq!(host.supervisor.status(), SupervisorStatus::Running);

    host.supervisor.stop().unwrap();
    assert_eq!(host.supervisor.monitor().state(), GateState::Stopped);
    assert_eq!(host.supervisor.status(), SupervisorStatus::Stopped);

    host.supervisor.start().unwrap();
    assert_eq!(host.supervisor.monitor().state(), GateState::Running);
    assert_eq!(host.supervisor.status(), SupervisorStatus::Failing);

    host.fake.respond(COUNT_QUERY, "2");
    host.fake.respond(COUNT_QUERY, "0");
    host.supervisor.remove_all_jobs().unwrap();
    assert_eq!(host.supervisor.monitor().state(), GateState::Exited);
    assert!(wait_until(Duration::from_secs(2), || {
        host.supervisor.active_tailers() == 0
    }));
}

#[test]
#[serial]
fn test_no_new_jobs_after_teardown() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "0");
    host.supervisor.remove_all_jobs().unwrap();

    let config_path = write_job_config(host.temp.path(), "late", &["web"]);
    let err = host.supervisor.add_job("late", 0, &config_path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SupervisorError>(),
        Some(SupervisorError::Exited)
    ));

    // start after exit leaves the gate exited
    host.supervisor.start().unwrap();
    assert_eq!(host.supervisor.monitor().state(), GateState::Exited);
}

#[test]
#[serial]
fn test_teardown_reports_remaining_services() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "4");

    let err = host.supervisor.remove_all_jobs().unwrap_err();
    match err.downcast_ref::<SupervisorError>() {
        Some(SupervisorError::TeardownIncomplete { attempts }) => {
            assert_eq!(*attempts, host.supervisor.config().delete_max_retries);
        }
        other => panic!("Expected TeardownIncomplete, got {other:?}"),
    }
}
