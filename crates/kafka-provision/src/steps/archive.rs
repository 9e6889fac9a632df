//! Release archive download and unpacking

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Host, Step, StepResult, quote};
use crate::error::{StepError, SystemError};
use crate::system::SystemOps;

/// Download a release tarball and replace the install root with its contents
///
/// Order matters: the archive is fully downloaded (and optionally verified)
/// before an existing install root is removed. Nothing is restored if a later
/// sub-step fails.
#[derive(Debug, Clone)]
pub struct InstallArchive {
    /// Archive URL
    pub url: String,
    /// Archive file name
    pub archive_name: String,
    /// Top-level directory inside the archive
    pub dist_name: String,
    /// Destination of the unpacked tree
    pub install_root: PathBuf,
    /// URL of the published SHA-512, when verification is wanted
    pub checksum_url: Option<String>,
    /// Description
    description: String,
}

impl InstallArchive {
    /// Create a new archive installation step
    pub fn new(
        url: impl Into<String>,
        archive_name: impl Into<String>,
        dist_name: impl Into<String>,
        install_root: impl Into<PathBuf>,
    ) -> Self {
        let install_root = install_root.into();
        let dist_name = dist_name.into();
        let description = format!("Install {dist_name} to {}", install_root.display());
        Self {
            url: url.into(),
            archive_name: archive_name.into(),
            dist_name,
            install_root,
            checksum_url: None,
            description,
        }
    }

    /// Verify against `<url>.sha512` before touching the install root
    pub fn verify_checksum(mut self) -> Self {
        self.checksum_url = Some(format!("{}.sha512", self.url));
        self
    }

    fn verify(&self, host: Host<'_>, actual: &str) -> Result<(), StepError> {
        let Some(url) = &self.checksum_url else {
            return Ok(());
        };
        let published = host.fetcher.fetch_text(url)?;
        let expected = parse_published_sha512(&published).ok_or_else(|| {
            StepError::Invalid(format!("no SHA-512 digest found in {url}"))
        })?;
        if expected != actual {
            return Err(StepError::Checksum {
                archive: self.archive_name.clone(),
                expected,
                actual: actual.to_string(),
            });
        }
        debug!(archive = %self.archive_name, "checksum verified");
        Ok(())
    }

    /// Download into `download_dir`, then swap the install root for the archive's tree
    fn replace_root(&self, host: Host<'_>, download_dir: &Path) -> Result<(), StepError> {
        let system = host.system;
        let archive = download_dir.join(&self.archive_name);
        debug!(url = %self.url, dest = %archive.display(), "downloading");
        let download = host.fetcher.download(&self.url, &archive)?;
        debug!(bytes = download.bytes, "download complete");
        self.verify(host, &download.sha512)?;

        if system.exists(&self.install_root) {
            debug!(path = %self.install_root.display(), "removing previous installation");
            system.remove_dir_all(&self.install_root)?;
        }

        let staging = system.temp_dir("kafka-staging-")?;
        let result = self.unpack(system, &archive, &staging);
        cleanup(system, &staging);
        result
    }

    fn unpack(&self, system: &dyn SystemOps, archive: &Path, staging: &Path) -> Result<(), StepError> {
        system.extract_archive(archive, staging)?;
        let unpacked = single_entry(system, staging)?;

        if let Some(parent) = self.install_root.parent() {
            system.create_dir_all(parent)?;
        }
        system.rename(&unpacked, &self.install_root)?;
        Ok(())
    }
}

/// Locate the single top-level entry of an unpacked archive
fn single_entry(system: &dyn SystemOps, dir: &Path) -> Result<PathBuf, SystemError> {
    let mut entries = system.list_dir(dir)?;
    if entries.len() != 1 {
        return Err(SystemError::ArchiveLayout {
            path: dir.to_path_buf(),
            reason: format!("expected one top-level directory, found {}", entries.len()),
        });
    }
    Ok(entries.remove(0))
}

fn cleanup(system: &dyn SystemOps, dir: &Path) {
    if let Err(e) = system.remove_dir_all(dir) {
        warn!("failed to clean up {}: {e}", dir.display());
    }
}

impl Step for InstallArchive {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, host: Host<'_>) -> Result<StepResult, StepError> {
        let download_dir = host.system.temp_dir("kafka-download-")?;
        let result = self.replace_root(host, &download_dir);
        cleanup(host.system, &download_dir);
        result.map(|()| StepResult::Applied)
    }

    fn to_bash(&self) -> Vec<String> {
        let root = quote(&self.install_root.display().to_string());
        let archive = format!("\"$KAFKA_TMP\"/{}", quote(&self.archive_name));
        let mut cmds = vec![
            "KAFKA_TMP=$(mktemp -d)".to_string(),
            "trap 'rm -rf \"$KAFKA_TMP\"' EXIT".to_string(),
            format!("curl -fSL {} -o {archive}", quote(&self.url)),
        ];

        if let Some(url) = &self.checksum_url {
            cmds.push(format!(
                r#"EXPECTED=$(curl -fsSL {} | cut -d: -f2- | tr -d ' \n' | tr 'A-F' 'a-f')
ACTUAL=$(sha512sum {archive} | cut -d' ' -f1)
[ "$EXPECTED" = "$ACTUAL" ] || {{ echo "checksum mismatch for {}" >&2; exit 1; }}"#,
                quote(url),
                self.archive_name
            ));
        }

        cmds.push(format!("rm -rf {root}"));
        cmds.push(format!("tar -xzf {archive} -C \"$KAFKA_TMP\""));
        if let Some(parent) = self.install_root.parent() {
            cmds.push(format!("mkdir -p {}", quote(&parent.display().to_string())));
        }
        cmds.push(format!("mv \"$KAFKA_TMP\"/{} {root}", quote(&self.dist_name)));
        cmds.push("rm -rf \"$KAFKA_TMP\"".to_string());
        cmds
    }
}

/// Extract the hex digest from a published `.sha512` file
///
/// Accepts both `gpg --print-md` output (`name: AB12 CD34 ...`, possibly
/// wrapped over several lines) and `sha512sum` output (`ab12...  name`).
pub fn parse_published_sha512(text: &str) -> Option<String> {
    let text = text.trim();
    let digest_part = match text.split_once(':') {
        Some((_, rest)) => rest,
        None => text.split_whitespace().next()?,
    };
    let digest: String = digest_part
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    (digest.len() == 128 && digest.bytes().all(|b| b.is_ascii_hexdigit())).then_some(digest)
}
