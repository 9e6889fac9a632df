//! In-memory host, mirror and reporter for tests

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, SystemError};
use crate::report::{Reporter, Severity};
use crate::system::{CommandOutput, Download, Fetcher, SystemOps, command_line};

/// Digest every fake download reports
pub const FAKE_SHA512: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\
                               aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

#[derive(Debug, Default)]
struct FakeState {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    users: BTreeSet<String>,
    commands: Vec<String>,
    missing: BTreeSet<String>,
    failing: BTreeSet<String>,
    pages: BTreeMap<String, String>,
    archives: BTreeMap<String, String>,
    downloads: Vec<String>,
    temp_counter: usize,
}

/// Simulated host implementing both [`SystemOps`] and [`Fetcher`]
///
/// Archives are files whose content is the name of the directory `tar`
/// "unpacks" from them.
#[derive(Debug)]
pub struct FakeHost {
    root: bool,
    state: RefCell<FakeState>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Root host with nothing installed
    pub fn new() -> Self {
        let host = Self {
            root: true,
            state: RefCell::default(),
        };
        host.state.borrow_mut().dirs.insert(PathBuf::from("/"));
        host
    }

    pub fn not_root(mut self) -> Self {
        self.root = false;
        self
    }

    pub fn with_user(self, name: &str) -> Self {
        self.state.borrow_mut().users.insert(name.into());
        self
    }

    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.add_dirs(path.as_ref());
        self
    }

    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dirs(parent);
        }
        self.state
            .borrow_mut()
            .files
            .insert(path.to_path_buf(), content.into());
        self
    }

    /// Program is not installed
    pub fn missing(self, program: &str) -> Self {
        self.state.borrow_mut().missing.insert(program.into());
        self
    }

    /// Program exits non-zero
    pub fn failing(self, program: &str) -> Self {
        self.state.borrow_mut().failing.insert(program.into());
        self
    }

    /// Serve `text` at `url`
    pub fn with_page(self, url: &str, text: &str) -> Self {
        self.state
            .borrow_mut()
            .pages
            .insert(url.into(), text.into());
        self
    }

    /// Serve an archive unpacking to `dist_name` at `url`
    pub fn with_archive(self, url: &str, dist_name: &str) -> Self {
        self.state
            .borrow_mut()
            .archives
            .insert(url.into(), dist_name.into());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    /// Commands run with `program`
    pub fn commands_of(&self, program: &str) -> Vec<String> {
        let prefix = format!("{program} ");
        self.commands()
            .into_iter()
            .filter(|c| c == program || c.starts_with(&prefix))
            .collect()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.state.borrow().downloads.clone()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.borrow().files.get(path.as_ref()).cloned()
    }

    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state.borrow().dirs.contains(path.as_ref())
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state.borrow().users.contains(name)
    }

    /// Files directly inside `dir`
    pub fn files_in(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        self.state
            .borrow()
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    fn add_dirs(&self, path: &Path) {
        let mut state = self.state.borrow_mut();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                state.dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    fn not_found(action: &'static str, path: &Path) -> SystemError {
        SystemError::io(action, path, io::Error::from(io::ErrorKind::NotFound))
    }

    fn untar(&self, args: &[&str]) -> CommandOutput {
        let (Some(archive), Some(dest)) = (args.get(1), args.get(3)) else {
            return CommandOutput::failed(2, "tar: bad arguments");
        };
        let Some(dist) = self.file(archive) else {
            return CommandOutput::failed(2, format!("tar: {archive}: Cannot open"));
        };
        let top = Path::new(dest).join(dist);
        self.add_dirs(&top.join("bin"));
        self.add_dirs(&top.join("config"));
        self.state
            .borrow_mut()
            .files
            .insert(top.join("config/server.properties"), "# shipped defaults\n".into());
        CommandOutput::ok()
    }
}

impl SystemOps for FakeHost {
    fn is_root(&self) -> bool {
        self.root
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        self.state
            .borrow_mut()
            .commands
            .push(command_line(program, args));

        if self.state.borrow().missing.contains(program) {
            return Err(SystemError::NotFound {
                program: program.into(),
            });
        }
        if self.state.borrow().failing.contains(program) {
            return Ok(CommandOutput::failed(1, format!("{program}: simulated failure")));
        }

        let output = match program {
            "id" => {
                if args.first().is_some_and(|u| self.has_user(u)) {
                    CommandOutput::ok()
                } else {
                    CommandOutput::failed(1, "id: no such user")
                }
            }
            "useradd" => {
                if let Some(name) = args.last() {
                    self.state.borrow_mut().users.insert((*name).into());
                }
                CommandOutput::ok()
            }
            "tar" => self.untar(args),
            _ => CommandOutput::ok(),
        };
        Ok(output)
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.borrow();
        state.dirs.contains(path) || state.files.contains_key(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), SystemError> {
        self.add_dirs(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), SystemError> {
        if !self.has_dir(path) {
            return Err(Self::not_found("remove", path));
        }
        let mut state = self.state.borrow_mut();
        state.dirs.retain(|p| !p.starts_with(path));
        state.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), SystemError> {
        if !self.exists(from) {
            return Err(Self::not_found("move", from));
        }
        let mut state = self.state.borrow_mut();
        let moved = |p: &Path| to.join(p.strip_prefix(from).unwrap_or(p));

        let dirs: Vec<PathBuf> = state.dirs.iter().filter(|p| p.starts_with(from)).cloned().collect();
        for dir in dirs {
            state.dirs.remove(&dir);
            state.dirs.insert(moved(&dir));
        }
        let files: Vec<PathBuf> = state.files.keys().filter(|p| p.starts_with(from)).cloned().collect();
        for file in files {
            if let Some(content) = state.files.remove(&file) {
                state.files.insert(moved(&file), content);
            }
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), SystemError> {
        let content = self.file(from).ok_or_else(|| Self::not_found("copy", from))?;
        self.state.borrow_mut().files.insert(to.to_path_buf(), content);
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), SystemError> {
        if path.parent().is_some_and(|p| !self.has_dir(p)) {
            return Err(Self::not_found("write", path));
        }
        self.state
            .borrow_mut()
            .files
            .insert(path.to_path_buf(), contents.into());
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, SystemError> {
        if !self.has_dir(path) {
            return Err(Self::not_found("read", path));
        }
        let state = self.state.borrow();
        let dirs = state.dirs.iter();
        let files = state.files.keys();
        Ok(dirs
            .chain(files)
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    fn temp_dir(&self, prefix: &str) -> Result<PathBuf, SystemError> {
        let n = {
            let mut state = self.state.borrow_mut();
            state.temp_counter += 1;
            state.temp_counter
        };
        let dir = PathBuf::from(format!("/tmp/{prefix}{n}"));
        self.add_dirs(&dir);
        Ok(dir)
    }
}

impl Fetcher for FakeHost {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.state
            .borrow()
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.into(),
                status: 404,
            })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<Download, FetchError> {
        self.state.borrow_mut().downloads.push(url.into());

        let dist = self.state.borrow().archives.get(url).cloned();
        let Some(dist) = dist else {
            return Err(FetchError::Transport {
                url: url.into(),
                message: "connection reset by peer".into(),
            });
        };
        self.write_file(dest, &dist).map_err(|e| FetchError::Write {
            path: dest.to_path_buf(),
            source: io::Error::other(e.to_string()),
        })?;
        Ok(Download {
            bytes: dist.len() as u64,
            sha512: FAKE_SHA512.into(),
        })
    }
}

/// Reporter that keeps everything it is told
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: RefCell<Vec<(Severity, String)>>,
    menus: RefCell<Vec<Vec<String>>>,
}

impl RecordingReporter {
    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.with_severity(Severity::Warning)
    }

    pub fn menus(&self) -> Vec<Vec<String>> {
        self.menus.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, severity: Severity, message: &str) {
        self.messages
            .borrow_mut()
            .push((severity, message.to_string()));
    }

    fn menu(&self, _title: &str, items: &[String]) {
        self.menus.borrow_mut().push(items.to_vec());
    }
}
