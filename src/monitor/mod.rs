//! Failure monitoring for supervised processes
//!
//! One [`EventTailer`] per process streams the wrapper's JSON event log into
//! a shared bounded channel; [`run_dispatch`] drains it into alerts. A
//! [`SyncMonitor`] gate pauses, resumes and terminates all tailers together.

mod dispatch;
mod event;
mod gate;
mod tailer;


pub use dispatch::{log_errors, run_dispatch};
pub use event::FailureEvent;
pub use gate::{GateState, SyncMonitor, WaitHandle};
pub use tailer::{decode_record, EventTailer};
