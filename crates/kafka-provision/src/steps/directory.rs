//! Directory management steps

use std::path::PathBuf;

use super::{Host, Step, StepResult, quote};
use crate::error::StepError;

/// Ensure a directory exists with the given owner and mode
#[derive(Debug, Clone)]
pub struct EnsureDirectory {
    /// Directory path
    pub path: PathBuf,
    /// Directory owner (e.g., "kafka:kafka")
    pub owner: Option<String>,
    /// Directory mode (e.g., 0o755)
    pub mode: Option<u32>,
    /// Apply owner and mode to the whole tree
    pub recursive: bool,
    /// Description
    description: String,
}

impl EnsureDirectory {
    /// Create a new directory step
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = format!("Ensure directory {}", path.display());
        Self {
            path,
            owner: None,
            mode: None,
            recursive: false,
            description,
        }
    }

    /// Set directory owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set directory mode
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Apply owner and mode recursively
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

impl Step for EnsureDirectory {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, host: Host<'_>) -> Result<StepResult, StepError> {
        host.system.create_dir_all(&self.path)?;
        if let Some(owner) = &self.owner {
            host.system.set_owner(&self.path, owner, self.recursive)?;
        }
        if let Some(mode) = self.mode {
            host.system.set_mode(&self.path, mode, self.recursive)?;
        }
        Ok(StepResult::Applied)
    }

    fn to_bash(&self) -> Vec<String> {
        let path = quote(&self.path.display().to_string());
        let flag = if self.recursive { "-R " } else { "" };
        let mut cmds = vec![format!("mkdir -p {path}")];

        if let Some(owner) = &self.owner {
            cmds.push(format!("chown {flag}{owner} {path}"));
        }

        if let Some(mode) = self.mode {
            cmds.push(format!("chmod {flag}{mode:o} {path}"));
        }

        cmds
    }
}
