//! Installation step definitions
//!
//! Each step implements the [`Step`] trait: it can be applied to the host
//! through [`SystemOps`]/[`Fetcher`] and rendered as equivalent bash.

mod archive;
mod directory;
mod file;
mod service;
mod user;

pub use archive::{InstallArchive, parse_published_sha512};
pub use directory::EnsureDirectory;
pub use file::WriteFile;
pub use service::RegisterService;
pub use user::EnsureUser;

use crate::error::StepError;
use crate::system::{Fetcher, SystemOps};

/// Result of applying a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Step changed the host
    Applied,
    /// Step was already satisfied, skipped
    Skipped,
}

/// Host capabilities handed to each step
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub system: &'a dyn SystemOps,
    pub fetcher: &'a dyn Fetcher,
}

impl<'a> Host<'a> {
    pub fn new(system: &'a dyn SystemOps, fetcher: &'a dyn Fetcher) -> Self {
        Self { system, fetcher }
    }
}

/// A single installation step
pub trait Step {
    /// Human-readable description of what this step does
    fn description(&self) -> &str;

    /// Perform the step on the host
    fn apply(&self, host: Host<'_>) -> Result<StepResult, StepError>;

    /// Render as bash commands
    fn to_bash(&self) -> Vec<String>;

    /// Check command to determine if step is already satisfied.
    ///
    /// If `Some(cmd)` is returned and the command succeeds (exit 0),
    /// the rendered script skips the step. If `None`, the step always runs.
    fn check_command(&self) -> Option<String> {
        None
    }
}

/// Single-quote a value for bash
pub(crate) fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
