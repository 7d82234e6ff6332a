//! Service descriptors consumed by the service wrapper
//!
//! A descriptor is derived from a [`ProcessSpec`] on every install and
//! written next to the wrapper executable. The wrapper reads it to register
//! the process as an OS service that restarts on failure and appends its
//! output to the job's log directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::SupervisorError;
use crate::job::ProcessSpec;

/// Description attached to every service this supervisor owns. All bulk
/// service manager queries filter on it.
pub const SERVICE_DESCRIPTION: &str = "vcap";

/// Delay the wrapper waits before restarting a failed process.
pub const RESTART_DELAY: &str = "5 sec";

pub const WRAPPER_EXE_FILE_NAME: &str = "job-service-wrapper.exe";
pub const WRAPPER_CONFIG_FILE_NAME: &str = "job-service-wrapper.xml";
pub const WRAPPER_APP_CONFIG_FILE_NAME: &str = "job-service-wrapper.exe.config";

/// Structured failure log the wrapper appends to, one JSON object per line.
pub const WRAPPER_EVENT_LOG_FILE_NAME: &str = "job-service-wrapper.wrapper.log.json";

/// Runtime-support file pinning the wrapper to a supported runtime.
pub const WRAPPER_APP_CONFIG_BODY: &str = r#"
<configuration>
  <startup>
    <supportedRuntime version="v4.0" />
  </startup>
</configuration>
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMode {
    #[serde(rename = "@mode")]
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnFailure {
    #[serde(rename = "@action")]
    pub action: String,
    #[serde(rename = "@delay")]
    pub delay: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvBinding {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: String,
}

/// Rendered `<service>` document for one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "service")]
pub struct ServiceDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub executable: String,
    #[serde(rename = "argument", default)]
    pub arguments: Vec<String>,
    pub logpath: String,
    pub log: LogMode,
    pub onfailure: OnFailure,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvBinding>,
}

impl ProcessSpec {
    /// Build the descriptor for this process logging into `log_dir`.
    ///
    /// Executable and arguments are copied verbatim. Environment bindings are
    /// sorted by name so the rendered document is reproducible.
    pub fn service_descriptor(&self, log_dir: &Path) -> Result<ServiceDescriptor> {
        if self.executable.trim().is_empty() {
            return Err(SupervisorError::MissingExecutable {
                name: self.name.clone(),
            }
            .into());
        }

        let mut env: Vec<EnvBinding> = self
            .env
            .iter()
            .map(|(name, value)| EnvBinding {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        env.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ServiceDescriptor {
            id: self.name.clone(),
            name: self.name.clone(),
            description: SERVICE_DESCRIPTION.to_string(),
            executable: self.executable.clone(),
            arguments: self.args.clone(),
            logpath: log_dir.to_string_lossy().into_owned(),
            log: LogMode {
                mode: "append".to_string(),
            },
            onfailure: OnFailure {
                action: "restart".to_string(),
                delay: RESTART_DELAY.to_string(),
            },
            env,
        })
    }
}

impl ServiceDescriptor {
    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self)
            .with_context(|| format!("Rendering service config for service '{}'", self.id))
    }

    pub fn from_xml(content: &str) -> Result<Self> {
        quick_xml::de::from_str(content).context("Parsing service config document")
    }

    /// Environment bindings as a name → value map.
    pub fn env_map(&self) -> HashMap<String, String> {
        self.env
            .iter()
            .map(|binding| (binding.name.clone(), binding.value.clone()))
            .collect()
    }
}
