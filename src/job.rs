//! Jobs and the process specs they are registered with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SupervisorError;

/// One supervised worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Check that the name can serve as both a service id and a path segment.
    pub fn validate_name(&self) -> Result<()> {
        let invalid = |reason: &str| -> anyhow::Error {
            SupervisorError::InvalidProcessName {
                name: self.name.clone(),
                reason: reason.to_string(),
            }
            .into()
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.name == "." || self.name == ".." {
            return Err(invalid("name is a relative path component"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(invalid("name contains a path separator"));
        }
        if self.name.chars().any(|c| c.is_control() || c == ':') {
            return Err(invalid("name contains a reserved character"));
        }
        Ok(())
    }
}

/// Registration document: the processes belonging to one job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default)]
    pub processes: Vec<ProcessSpec>,
}

impl ProcessConfig {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            anyhow::Error::from(SupervisorError::InvalidConfig(format!(
                "malformed process config: {e}"
            )))
        })
    }
}

/// A named unit of deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub processes: Vec<ProcessSpec>,
}

impl Job {
    pub fn new(name: impl Into<String>, processes: Vec<ProcessSpec>) -> Self {
        Self {
            name: name.into(),
            processes,
        }
    }

    /// Parse a registration document for `name`.
    pub fn from_config(name: &str, content: &str) -> Result<Self> {
        let config = ProcessConfig::parse(content)
            .with_context(|| format!("Parsing process config for job '{name}'"))?;
        Ok(Self::new(name, config.processes))
    }
}
