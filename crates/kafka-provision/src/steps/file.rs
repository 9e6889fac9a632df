//! File management steps

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use super::{Host, Step, StepResult, quote};
use crate::error::StepError;

/// Timestamp format embedded in backup file names
pub const BACKUP_STAMP: &str = "%Y%m%d%H%M%S";

/// Write a file with specified content
#[derive(Debug, Clone)]
pub struct WriteFile {
    /// File path
    pub path: PathBuf,
    /// File content
    pub content: String,
    /// File owner (e.g., "kafka:kafka")
    pub owner: Option<String>,
    /// Copy an existing file aside before overwriting it
    pub backup: bool,
    /// Description
    description: String,
}

impl WriteFile {
    /// Create a new file write step
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let description = format!("Write {}", path.display());
        Self {
            path,
            content: content.into(),
            owner: None,
            backup: false,
            description,
        }
    }

    /// Set file owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Keep a timestamped copy of any existing file
    pub fn with_backup(mut self) -> Self {
        self.backup = true;
        self
    }

    /// Backup path for a given stamp: `server.properties` -> `server.backup-<stamp>`
    pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
        path.with_extension(format!("backup-{stamp}"))
    }

    /// Generate a heredoc delimiter that won't appear in content
    fn heredoc_delimiter(&self) -> &'static str {
        if self.content.contains("KAFKA_EOF") {
            "__KAFKA_FILE_END__"
        } else {
            "KAFKA_EOF"
        }
    }
}

impl Step for WriteFile {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, host: Host<'_>) -> Result<StepResult, StepError> {
        if self.backup && host.system.exists(&self.path) {
            let stamp = Local::now().format(BACKUP_STAMP).to_string();
            let backup = Self::backup_path(&self.path, &stamp);
            debug!(from = %self.path.display(), to = %backup.display(), "backing up");
            host.system.copy_file(&self.path, &backup)?;
        }

        if let Some(parent) = self.path.parent() {
            host.system.create_dir_all(parent)?;
        }
        host.system.write_file(&self.path, &self.content)?;

        if let Some(owner) = &self.owner {
            host.system.set_owner(&self.path, owner, false)?;
        }
        Ok(StepResult::Applied)
    }

    fn to_bash(&self) -> Vec<String> {
        let path = quote(&self.path.display().to_string());
        let mut cmds = vec![];

        if self.backup {
            let backup = Self::backup_path(&self.path, "$(date +%Y%m%d%H%M%S)");
            // the stamp must stay outside single quotes to expand
            let backup = format!("\"{}\"", backup.display());
            cmds.push(format!("[ -f {path} ] && cp -p {path} {backup} || true"));
        }

        cmds.push(format!("mkdir -p \"$(dirname {path})\""));

        let delimiter = self.heredoc_delimiter();
        cmds.push(format!(
            "cat > {path} << '{delimiter}'\n{}\n{delimiter}",
            self.content.trim_end_matches('\n')
        ));

        if let Some(owner) = &self.owner {
            cmds.push(format!("chown {owner} {path}"));
        }

        cmds
    }
}
