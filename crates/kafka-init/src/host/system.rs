//! Local host access through processes and the filesystem

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use kafka_provision::{CommandOutput, SystemError, SystemOps};
use tracing::debug;

/// The machine this binary runs on
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSystem;

impl HostSystem {
    pub fn new() -> Self {
        Self
    }
}

impl SystemOps for HostSystem {
    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        debug!(program, ?args, "running");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    SystemError::NotFound {
                        program: program.to_string(),
                    }
                } else {
                    SystemError::Spawn {
                        program: program.to_string(),
                        source,
                    }
                }
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), SystemError> {
        fs::create_dir_all(path).map_err(|e| SystemError::io("create", path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), SystemError> {
        fs::remove_dir_all(path).map_err(|e| SystemError::io("remove", path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), SystemError> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            // /tmp is often a separate tmpfs
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(from = %from.display(), to = %to.display(), "rename crosses devices, using mv");
                let from = from.to_string_lossy();
                let to = to.to_string_lossy();
                self.run_checked("mv", &[&from, &to]).map(drop)
            }
            Err(e) => Err(SystemError::io("move", from, e)),
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), SystemError> {
        fs::copy(from, to)
            .map(drop)
            .map_err(|e| SystemError::io("copy", from, e))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), SystemError> {
        fs::write(path, contents).map_err(|e| SystemError::io("write", path, e))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, SystemError> {
        let entries = fs::read_dir(path).map_err(|e| SystemError::io("read", path, e))?;
        entries
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .map_err(|e| SystemError::io("read", path, e))
            })
            .collect()
    }

    fn temp_dir(&self, prefix: &str) -> Result<PathBuf, SystemError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|e| SystemError::io("create", std::env::temp_dir(), e))?;
        Ok(dir.keep())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_output() {
        let output = HostSystem.run("sh", &["-c", "echo out; echo err >&2"]).unwrap();

        assert!(output.success);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_run_reports_failure_status() {
        let output = HostSystem.run("sh", &["-c", "exit 3"]).unwrap();

        assert!(!output.success);
        assert!(HostSystem.run_checked("sh", &["-c", "exit 3"]).is_err());
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = HostSystem
            .run("kafka-init-no-such-program", &[])
            .unwrap_err();

        assert!(matches!(err, SystemError::NotFound { .. }));
    }

    #[test]
    fn test_filesystem_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b");
        let file = dir.join("f.txt");

        HostSystem.create_dir_all(&dir).unwrap();
        HostSystem.write_file(&file, "hello").unwrap();
        HostSystem
            .copy_file(&file, &dir.join("g.txt"))
            .unwrap();

        let mut listed = HostSystem.list_dir(&dir).unwrap();
        listed.sort();
        assert_eq!(listed, [dir.join("f.txt"), dir.join("g.txt")]);

        let moved = tmp.path().join("moved");
        HostSystem.rename(&dir, &moved).unwrap();
        assert!(HostSystem.exists(&moved.join("f.txt")));
        assert!(!HostSystem.exists(&dir));

        HostSystem.remove_dir_all(&moved).unwrap();
        assert!(!HostSystem.exists(&moved));
    }

    #[test]
    fn test_temp_dir_is_kept() {
        let dir = HostSystem.temp_dir("kafka-init-test-").unwrap();

        assert!(dir.is_dir());
        assert!(
            dir.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("kafka-init-test-")
        );
        fs::remove_dir_all(dir).unwrap();
    }
}
