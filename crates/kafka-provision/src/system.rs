//! Host capabilities the installer depends on
//!
//! All subprocess and filesystem mutation goes through [`SystemOps`], and all
//! network access through [`Fetcher`], so the orchestration can run against
//! in-memory fakes.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FetchError, SystemError};

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero
    pub success: bool,
    /// Human-readable exit status (e.g. "exit status: 1")
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent command
    pub fn ok() -> Self {
        Self {
            success: true,
            status: "exit status: 0".into(),
            ..Self::default()
        }
    }

    /// A failed command with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: format!("exit status: {code}"),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Subprocess and filesystem access
///
/// Implementors provide the primitives; the account, ownership, archive and
/// service-manager operations are expressed on top of [`SystemOps::run`].
pub trait SystemOps {
    /// Effective user is root
    fn is_root(&self) -> bool;

    /// Run a program to completion. A non-zero exit is not an error here.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> Result<(), SystemError>;

    fn remove_dir_all(&self, path: &Path) -> Result<(), SystemError>;

    /// Move a file or directory, across filesystems if needed
    fn rename(&self, from: &Path, to: &Path) -> Result<(), SystemError>;

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), SystemError>;

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), SystemError>;

    /// Direct children of a directory
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, SystemError>;

    /// Create a fresh, empty directory for scratch work
    fn temp_dir(&self, prefix: &str) -> Result<PathBuf, SystemError>;

    /// Run a program and fail on non-zero exit
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        let output = self.run(program, args)?;
        if output.success {
            Ok(output)
        } else {
            Err(SystemError::CommandFailed {
                command: command_line(program, args),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }

    /// Identity lookup; a failed lookup means the account does not exist
    fn user_exists(&self, name: &str) -> Result<bool, SystemError> {
        Ok(self.run("id", &[name])?.success)
    }

    /// Create a system account without home directory
    fn create_system_user(&self, name: &str, shell: &str) -> Result<(), SystemError> {
        self.run_checked("useradd", &["-r", "-M", "-s", shell, name])
            .map(drop)
    }

    fn set_owner(&self, path: &Path, owner: &str, recursive: bool) -> Result<(), SystemError> {
        let path = path.to_string_lossy();
        let output = if recursive {
            self.run_checked("chown", &["-R", owner, &path])
        } else {
            self.run_checked("chown", &[owner, &path])
        };
        output.map(drop)
    }

    fn set_mode(&self, path: &Path, mode: u32, recursive: bool) -> Result<(), SystemError> {
        let path = path.to_string_lossy();
        let mode = format!("{mode:o}");
        let output = if recursive {
            self.run_checked("chmod", &["-R", &mode, &path])
        } else {
            self.run_checked("chmod", &[&mode, &path])
        };
        output.map(drop)
    }

    /// Unpack a gzipped tarball into `dest`
    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<(), SystemError> {
        let archive = archive.to_string_lossy();
        let dest = dest.to_string_lossy();
        self.run_checked("tar", &["-xzf", &archive, "-C", &dest])
            .map(drop)
    }

    /// Ask systemd to re-read unit files
    fn reload_service_manager(&self) -> Result<(), SystemError> {
        debug!("reloading systemd units");
        self.run_checked("systemctl", &["daemon-reload"]).map(drop)
    }
}

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Bytes written
    pub bytes: u64,
    /// Lowercase hex SHA-512 of the body
    pub sha512: String,
}

/// Network access to the release mirror
pub trait Fetcher {
    /// GET a URL and return the body as text
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Stream a URL into `dest`
    fn download(&self, url: &str, dest: &Path) -> Result<Download, FetchError>;
}

/// Shell-style rendering of a command for messages
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
