//! Error types for installation

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a host operation (filesystem or subprocess)
#[derive(Debug, Error)]
pub enum SystemError {
    /// Filesystem operation failed
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program could not be found on `PATH`
    #[error("command not found: {program}")]
    NotFound { program: String },

    /// The program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("`{command}` exited with {status}{}", format_stderr(stderr))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The extracted archive did not have the expected layout
    #[error("unexpected archive layout in {}: {reason}", path.display())]
    ArchiveLayout { path: PathBuf, reason: String },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl SystemError {
    /// Wrap an IO error with the action and path that caused it
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failure while talking to the download mirror
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or body read failure
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Writing the downloaded body locally failed
    #[error("writing {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error raised by a single installation step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to render {name}: {message}")]
    Render { name: String, message: String },

    #[error("checksum mismatch for {archive}: expected {expected}, got {actual}")]
    Checksum {
        archive: String,
        expected: String,
        actual: String,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Coarse phase an operation failure is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fetching and choosing a version
    VersionDiscovery,
    /// Download, unpack, relocate, permission
    Install,
    /// Everything else in the install flow
    Installation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionDiscovery => f.write_str("version discovery"),
            Self::Install => f.write_str("install"),
            Self::Installation => f.write_str("installation"),
        }
    }
}

/// Terminal error of an installer run
#[derive(Debug, Error)]
pub enum InstallError {
    /// Checked before any mutation; nothing to clean up
    #[error("{0}")]
    Precondition(String),

    /// A phase failed part-way; completed work is left in place
    #[error("{phase} failed: {message}")]
    Operation { phase: Phase, message: String },
}

impl InstallError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn operation(phase: Phase, err: impl fmt::Display) -> Self {
        Self::Operation {
            phase,
            message: err.to_string(),
        }
    }

    /// Phase of an operation failure, `None` for preconditions
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Precondition(_) => None,
            Self::Operation { phase, .. } => Some(*phase),
        }
    }
}
