//! Job supervisor backed by the OS service manager
//!
//! Each process of a job becomes one OS service via the service wrapper.
//! Start/stop/delete act on every owned service at once, and each process's
//! failure log is tailed into a single dispatch loop.

mod core;
mod install;
mod lifecycle;


pub use self::core::JobSupervisor;
