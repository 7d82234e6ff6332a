//! Crash events written by the service wrapper reach the failure handler
//! as alerts.

use serial_test::serial;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use warden::Alert;

use super::helpers::{
    append_event_bytes, append_exit_event, event_log_path, setup_host, write_job_config,
    COUNT_QUERY,
};

const ALERT_TIMEOUT: Duration = Duration::from_secs(5);

#[test]
#[serial]
fn test_exit_event_becomes_alert() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "0");
    let config_path = write_job_config(host.temp.path(), "app", &["web"]);
    host.supervisor
        .add_job("app", 0, &config_path)
        .expect("add_job should succeed");

    let (alerts_tx, alerts_rx) = mpsc::channel();
    let dispatcher = host.supervisor.clone();
    let dispatch = thread::spawn(move || {
        dispatcher.monitor_job_failures(Box::new(move |alert: Alert| -> anyhow::Result<()> {
            alerts_tx.send(alert)?;
            Ok(())
        }))
    });

    append_exit_event(&event_log_path(&host.supervisor, "app", "web"), "web", 3);

    let alert = alerts_rx
        .recv_timeout(ALERT_TIMEOUT)
        .expect("Expected an alert for the exit event");
    assert_eq!(alert.id, "web");
    assert_eq!(alert.service, "web");
    assert_eq!(alert.action, "Start");
    assert_eq!(alert.event, "pid failed");
    assert_eq!(alert.description, "exited with code 3");

    host.supervisor
        .remove_all_jobs()
        .expect("teardown should succeed");
    dispatch
        .join()
        .expect("dispatch thread panicked")
        .expect("dispatch loop should end cleanly");

    assert!(alerts_rx.try_recv().is_err(), "Expected exactly one alert");
}

#[test]
#[serial]
fn test_partial_and_malformed_records() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "0");
    let config_path = write_job_config(host.temp.path(), "app", &["worker"]);
    host.supervisor.add_job("app", 0, &config_path).unwrap();
    let log = event_log_path(&host.supervisor, "app", "worker");

    let (alerts_tx, alerts_rx) = mpsc::channel();
    let dispatcher = host.supervisor.clone();
    let dispatch = thread::spawn(move || {
        dispatcher.monitor_job_failures(Box::new(move |alert: Alert| -> anyhow::Result<()> {
            alerts_tx.send(alert)?;
            Ok(())
        }))
    });

    append_event_bytes(&log, b"{not json}\n");
    append_event_bytes(
        &log,
        br#"{"datetime":"2026-10-18T12:00:00Z","event":"exited","#,
    );
    thread::sleep(Duration::from_millis(50));
    append_event_bytes(&log, br#""processName":"worker","exitCode":-1}"#);
    append_event_bytes(&log, b"\n");

    let alert = alerts_rx.recv_timeout(ALERT_TIMEOUT).unwrap();
    assert_eq!(alert.description, "exited with code -1");

    host.supervisor.remove_all_jobs().unwrap();
    dispatch.join().unwrap().unwrap();
    assert!(alerts_rx.try_recv().is_err());
}

#[test]
#[serial]
fn test_events_from_several_processes() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "0");
    let config_path = write_job_config(host.temp.path(), "app", &["a", "b"]);
    host.supervisor.add_job("app", 0, &config_path).unwrap();

    let (alerts_tx, alerts_rx) = mpsc::channel();
    let dispatcher = host.supervisor.clone();
    let dispatch = thread::spawn(move || {
        dispatcher.monitor_job_failures(Box::new(move |alert: Alert| -> anyhow::Result<()> {
            alerts_tx.send(alert)?;
            Ok(())
        }))
    });

    let log_a = event_log_path(&host.supervisor, "app", "a");
    append_exit_event(&log_a, "a", 1);
    append_exit_event(&log_a, "a", 2);
    append_exit_event(&event_log_path(&host.supervisor, "app", "b"), "b", 9);

    let mut received: Vec<(String, String)> = (0..3)
        .map(|_| {
            let alert = alerts_rx.recv_timeout(ALERT_TIMEOUT).unwrap();
            (alert.id, alert.description)
        })
        .collect();

    // Order is only guaranteed per process
    let from_a: Vec<&str> = received
        .iter()
        .filter(|(id, _)| id == "a")
        .map(|(_, d)| d.as_str())
        .collect();
    assert_eq!(from_a, vec!["exited with code 1", "exited with code 2"]);

    received.sort();
    assert_eq!(received[2], ("b".to_string(), "exited with code 9".to_string()));

    host.supervisor.remove_all_jobs().unwrap();
    dispatch.join().unwrap().unwrap();
}

#[test]
#[serial]
fn test_handler_errors_do_not_stop_dispatch() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "0");
    let config_path = write_job_config(host.temp.path(), "app", &["web"]);
    host.supervisor.add_job("app", 0, &config_path).unwrap();

    let (alerts_tx, alerts_rx) = mpsc::channel();
    let dispatcher = host.supervisor.clone();
    let dispatch = thread::spawn(move || {
        dispatcher.monitor_job_failures(Box::new(move |alert: Alert| -> anyhow::Result<()> {
            alerts_tx.send(alert.description.clone())?;
            anyhow::bail!("alert sink unavailable")
        }))
    });

    let log = event_log_path(&host.supervisor, "app", "web");
    append_exit_event(&log, "web", 1);
    append_exit_event(&log, "web", 2);

    assert_eq!(
        alerts_rx.recv_timeout(ALERT_TIMEOUT).unwrap(),
        "exited with code 1"
    );
    assert_eq!(
        alerts_rx.recv_timeout(ALERT_TIMEOUT).unwrap(),
        "exited with code 2"
    );

    host.supervisor.remove_all_jobs().unwrap();
    dispatch.join().unwrap().unwrap();
}

#[test]
#[serial]
fn test_reregistered_job_reports_each_event_once() {
    let host = setup_host();
    host.fake.respond(COUNT_QUERY, "0");
    let config_path = write_job_config(host.temp.path(), "app", &["web"]);
    host.supervisor.add_job("app", 0, &config_path).unwrap();
    host.supervisor.add_job("app", 0, &config_path).unwrap();

    assert_eq!(host.supervisor.monitor().registered(), 1);
    assert_eq!(host.supervisor.active_tailers(), 1);

    let (alerts_tx, alerts_rx) = mpsc::channel();
    let dispatcher = host.supervisor.clone();
    let dispatch = thread::spawn(move || {
        dispatcher.monitor_job_failures(Box::new(move |alert: Alert| -> anyhow::Result<()> {
            alerts_tx.send(alert)?;
            Ok(())
        }))
    });

    append_exit_event(&event_log_path(&host.supervisor, "app", "web"), "web", 7);

    let alert = alerts_rx.recv_timeout(ALERT_TIMEOUT).unwrap();
    assert_eq!(alert.description, "exited with code 7");
    assert!(
        alerts_rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "one crash event must produce one alert"
    );

    host.supervisor.remove_all_jobs().unwrap();
    dispatch.join().unwrap().unwrap();
}
