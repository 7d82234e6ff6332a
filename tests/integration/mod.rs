//! Integration tests for the warden job supervisor
//!
//! These tests drive a supervisor end to end against a scripted service
//! manager: job registration, crash events flowing from the wrapper's event
//! log to alerts, and teardown.

pub mod failure_alerts;
pub mod helpers;
pub mod lifecycle;
