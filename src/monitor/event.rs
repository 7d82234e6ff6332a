//! Failure records written by the service wrapper.

use serde::{Deserialize, Serialize};

/// One line of the wrapper's JSON event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub datetime: String,
    pub event: String,
    #[serde(rename = "processName")]
    pub process_name: String,
    #[serde(rename = "exitCode")]
    pub exit_code: i64,
}

impl FailureEvent {
    /// Decode one complete record. Surrounding whitespace, including the
    /// line terminator, is ignored.
    pub fn decode(record: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(record.trim_ascii())
    }
}
