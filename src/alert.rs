//! Alert records handed to the failure handler.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::monitor::FailureEvent;

/// Action reported for a failed process; the wrapper restarts it.
pub const ALERT_ACTION: &str = "Start";

/// Event label reported for every wrapper failure record.
pub const ALERT_EVENT: &str = "pid failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl Alert {
    pub fn from_failure(event: &FailureEvent) -> Self {
        Self {
            action: ALERT_ACTION.to_string(),
            date: event.datetime.clone(),
            event: ALERT_EVENT.to_string(),
            id: event.process_name.clone(),
            service: event.process_name.clone(),
            description: format!("exited with code {}", event.exit_code),
        }
    }
}

/// Receives one alert per decoded failure event.
pub type FailureHandler = Box<dyn FnMut(Alert) -> Result<()> + Send>;
