//! Installer context: fixed paths, naming conventions and per-run choices

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::version::Version;

/// Default download mirror (directory listing of all releases)
pub const DEFAULT_MIRROR: &str = "https://downloads.apache.org/kafka";
/// Default Scala build of the binary distribution
pub const DEFAULT_SCALA_VERSION: &str = "2.13";

/// Everything one installer run needs to know about the target host
#[derive(Debug, Clone)]
pub struct InstallerContext {
    /// Where the unpacked distribution lives
    pub install_root: PathBuf,
    /// Broker data directory
    pub data_dir: PathBuf,
    /// Broker log segment directory (`log.dirs`)
    pub log_dir: PathBuf,
    /// Scala build tag in the archive name (e.g. "2.13")
    pub runtime_variant: String,
    /// Account the broker runs as
    pub service_user: String,
    /// Base URL of the release mirror
    pub mirror: String,
    /// systemd unit directory
    pub unit_dir: PathBuf,
    /// Unit name without the `.service` suffix
    pub unit_name: String,
    /// Unit the broker requires and starts after
    pub coordination_unit: String,
    /// `JAVA_HOME` exported to the broker
    pub java_home: String,
    selected_version: Option<Version>,
    config_file: Option<PathBuf>,
}

impl Default for InstallerContext {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("/opt/kafka"),
            data_dir: PathBuf::from("/data/kafka"),
            log_dir: PathBuf::from("/data/kafka-logs"),
            runtime_variant: DEFAULT_SCALA_VERSION.into(),
            service_user: "kafka".into(),
            mirror: DEFAULT_MIRROR.into(),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            unit_name: "kafka".into(),
            coordination_unit: "zookeeper.service".into(),
            java_home: "/usr/lib/jvm/java".into(),
            selected_version: None,
            config_file: None,
        }
    }
}

impl InstallerContext {
    /// Create a new context builder
    pub fn builder() -> InstallerContextBuilder {
        InstallerContextBuilder::default()
    }

    /// Version chosen for this run, if any
    pub fn selected_version(&self) -> Option<Version> {
        self.selected_version
    }

    /// Record the chosen version. A version can only be chosen once.
    pub fn select_version(&mut self, version: Version) -> Result<(), InstallError> {
        match self.selected_version {
            Some(existing) => Err(InstallError::precondition(format!(
                "version already selected ({existing})"
            ))),
            None => {
                self.selected_version = Some(version);
                Ok(())
            }
        }
    }

    /// Selected version, or an error if selection has not happened yet
    pub fn require_version(&self) -> Result<Version, InstallError> {
        self.selected_version
            .ok_or_else(|| InstallError::precondition("no Kafka version selected"))
    }

    /// Configuration file written by this run, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Record that the configuration file has been written
    pub fn set_config_file(&mut self, path: impl Into<PathBuf>) {
        self.config_file = Some(path.into());
    }

    /// Canonical broker configuration path inside the install root
    pub fn config_path(&self) -> PathBuf {
        self.install_root.join("config").join("server.properties")
    }

    /// Full unit file path
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(format!("{}.service", self.unit_name))
    }

    /// `user:group` owner string for chown
    pub fn owner(&self) -> String {
        format!("{0}:{0}", self.service_user)
    }

    /// Archive file name, `kafka_{variant}-{version}.tgz`
    pub fn archive_name(&self, version: Version) -> String {
        format!("{}.tgz", self.dist_name(version))
    }

    /// Top-level directory name inside the archive
    pub fn dist_name(&self, version: Version) -> String {
        format!("kafka_{}-{version}", self.runtime_variant)
    }

    /// Download URL of the release archive
    pub fn download_url(&self, version: Version) -> String {
        format!(
            "{}/{version}/{}",
            self.mirror.trim_end_matches('/'),
            self.archive_name(version)
        )
    }

    /// URL of the mirror's directory listing
    pub fn index_url(&self) -> String {
        format!("{}/", self.mirror.trim_end_matches('/'))
    }

    /// Create a test context rooted under `root`
    #[cfg(test)]
    pub fn test_context(root: &Path) -> Self {
        Self::builder()
            .install_root(root.join("opt/kafka"))
            .data_dir(root.join("data/kafka"))
            .log_dir(root.join("data/kafka-logs"))
            .unit_dir(root.join("etc/systemd/system"))
            .mirror("https://mirror.test/kafka/")
            .build()
    }
}

/// Builder for `InstallerContext`
#[derive(Debug, Clone, Default)]
pub struct InstallerContextBuilder {
    context: InstallerContext,
}

impl InstallerContextBuilder {
    /// Set the install root
    pub fn install_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.install_root = path.into();
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.data_dir = path.into();
        self
    }

    /// Set the log directory
    pub fn log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.log_dir = path.into();
        self
    }

    /// Set the Scala build tag
    pub fn runtime_variant(mut self, variant: impl Into<String>) -> Self {
        self.context.runtime_variant = variant.into();
        self
    }

    /// Set the service account name
    pub fn service_user(mut self, user: impl Into<String>) -> Self {
        self.context.service_user = user.into();
        self
    }

    /// Set the release mirror
    pub fn mirror(mut self, mirror: impl Into<String>) -> Self {
        self.context.mirror = mirror.into();
        self
    }

    /// Set the systemd unit directory
    pub fn unit_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.unit_dir = path.into();
        self
    }

    /// Set the unit name
    pub fn unit_name(mut self, name: impl Into<String>) -> Self {
        self.context.unit_name = name.into();
        self
    }

    /// Set the unit the broker depends on
    pub fn coordination_unit(mut self, unit: impl Into<String>) -> Self {
        self.context.coordination_unit = unit.into();
        self
    }

    /// Set `JAVA_HOME` for the unit
    pub fn java_home(mut self, path: impl Into<String>) -> Self {
        self.context.java_home = path.into();
        self
    }

    /// Build the context
    pub fn build(self) -> InstallerContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_follows_naming_convention() {
        let ctx = InstallerContext::default();
        let url = ctx.download_url(Version::new(3, 7, 0));
        assert_eq!(
            url,
            "https://downloads.apache.org/kafka/3.7.0/kafka_2.13-3.7.0.tgz"
        );
    }

    #[test]
    fn test_mirror_trailing_slash_is_ignored() {
        let ctx = InstallerContext::builder().mirror("https://m.test/kafka/").build();
        assert_eq!(ctx.index_url(), "https://m.test/kafka/");
        assert!(ctx.download_url(Version::new(1, 0, 0)).starts_with("https://m.test/kafka/1.0.0/"));
    }

    #[test]
    fn test_version_can_only_be_selected_once() {
        let mut ctx = InstallerContext::default();
        assert!(ctx.require_version().is_err());

        ctx.select_version(Version::new(3, 7, 0)).unwrap();
        assert!(ctx.select_version(Version::new(3, 8, 0)).is_err());
        assert_eq!(ctx.require_version().unwrap(), Version::new(3, 7, 0));
    }

    #[test]
    fn test_default_paths() {
        let ctx = InstallerContext::default();
        assert_eq!(ctx.config_path(), Path::new("/opt/kafka/config/server.properties"));
        assert_eq!(ctx.unit_path(), Path::new("/etc/systemd/system/kafka.service"));
        assert_eq!(ctx.owner(), "kafka:kafka");
        assert!(ctx.config_file().is_none());
    }
}
