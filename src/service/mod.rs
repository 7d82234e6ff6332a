//! Projection of processes onto the OS service manager.

pub mod descriptor;
pub mod manager;

pub use descriptor::{ServiceDescriptor, SERVICE_DESCRIPTION};
pub use manager::{ServiceManager, ServiceQuery, RUNNING_STATE};
