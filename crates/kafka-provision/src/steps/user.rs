//! User management steps

use tracing::debug;

use super::{Host, Step, StepResult, quote};
use crate::error::StepError;

/// Ensure a non-interactive system account exists
#[derive(Debug, Clone)]
pub struct EnsureUser {
    /// Username
    pub name: String,
    /// Login shell
    pub shell: String,
    /// Description
    description: String,
}

impl EnsureUser {
    /// System account with no login shell and no home directory
    pub fn system(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = format!("Ensure service account {name} exists");
        Self {
            name,
            shell: "/sbin/nologin".into(),
            description,
        }
    }
}

impl Step for EnsureUser {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, host: Host<'_>) -> Result<StepResult, StepError> {
        if host.system.user_exists(&self.name)? {
            debug!(user = %self.name, "account already exists");
            return Ok(StepResult::Skipped);
        }
        host.system.create_system_user(&self.name, &self.shell)?;
        Ok(StepResult::Applied)
    }

    fn to_bash(&self) -> Vec<String> {
        vec![format!(
            "useradd -r -M -s {} {}",
            quote(&self.shell),
            quote(&self.name)
        )]
    }

    fn check_command(&self) -> Option<String> {
        Some(format!("id {} >/dev/null 2>&1", quote(&self.name)))
    }
}
