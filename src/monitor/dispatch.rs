//! Single consumer turning failure events into alerts.

use std::sync::mpsc::Receiver;
use tracing::{debug, warn};

use super::event::FailureEvent;
use crate::alert::{Alert, FailureHandler};

/// Drain `events` until every sender is gone, handing each alert to
/// `handler` synchronously.
///
/// Handler errors are not inspected; the handler owns its own delivery
/// guarantees. Wrap it with [`log_errors`] to at least record failures.
/// Returns the number of alerts dispatched.
pub fn run_dispatch(events: Receiver<FailureEvent>, mut handler: FailureHandler) -> usize {
    let mut dispatched = 0;
    for event in events {
        debug!(
            process = %event.process_name,
            exit_code = event.exit_code,
            "Dispatching job failure"
        );
        let _ = handler(Alert::from_failure(&event));
        dispatched += 1;
    }
    debug!(dispatched, "Failure channel closed");
    dispatched
}

/// Wrap a handler so its errors are logged instead of dropped silently.
pub fn log_errors(mut handler: FailureHandler) -> FailureHandler {
    Box::new(move |alert: Alert| -> anyhow::Result<()> {
        let id = alert.id.clone();
        if let Err(e) = handler(alert) {
            warn!(process = %id, "Failure handler error: {e:#}");
        }
        Ok(())
    })
}
