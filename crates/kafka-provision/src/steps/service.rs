//! Systemd service registration steps

use std::path::PathBuf;

use super::{Host, Step, StepResult, quote};
use crate::error::StepError;

/// Install a unit file and make systemd pick it up
#[derive(Debug, Clone)]
pub struct RegisterService {
    /// Unit file path
    pub unit_path: PathBuf,
    /// Rendered unit definition
    pub unit: String,
    /// Description
    description: String,
}

impl RegisterService {
    /// Create a new service registration step
    pub fn new(unit_path: impl Into<PathBuf>, unit: impl Into<String>) -> Self {
        let unit_path = unit_path.into();
        let description = format!("Register systemd unit {}", unit_path.display());
        Self {
            unit_path,
            unit: unit.into(),
            description,
        }
    }
}

impl Step for RegisterService {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, host: Host<'_>) -> Result<StepResult, StepError> {
        if let Some(parent) = self.unit_path.parent() {
            host.system.create_dir_all(parent)?;
        }
        host.system.write_file(&self.unit_path, &self.unit)?;
        host.system.reload_service_manager()?;
        Ok(StepResult::Applied)
    }

    fn to_bash(&self) -> Vec<String> {
        vec![
            format!(
                "cat > {} << 'KAFKA_UNIT_EOF'\n{}\nKAFKA_UNIT_EOF",
                quote(&self.unit_path.display().to_string()),
                self.unit.trim_end_matches('\n')
            ),
            "systemctl daemon-reload".into(),
        ]
    }
}
