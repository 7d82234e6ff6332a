pub mod alert;
pub mod command;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod monitor;
pub mod service;
pub mod status;
pub mod supervisor;

pub use alert::{Alert, FailureHandler};
pub use config::SupervisorConfig;
pub use error::SupervisorError;
pub use job::{Job, ProcessSpec};
pub use status::SupervisorStatus;
pub use supervisor::JobSupervisor;
