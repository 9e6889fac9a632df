//! Install orchestration
//!
//! Runs the whole flow top to bottom:
//!
//! `Start -> PrivilegeOk -> DependencyOk -> VersionSelected -> UserReady ->
//! Installed -> Configured -> ServiceRegistered -> Done`
//!
//! Any failure moves straight to `Failed`. There is no resumption and no
//! rollback of stages that already applied.

use tracing::{debug, info};

use crate::context::InstallerContext;
use crate::error::{InstallError, Phase};
use crate::manifest::{InstallOptions, Manifest, Stage};
use crate::report::Reporter;
use crate::select::{InputSource, VersionPrompt};
use crate::steps::{Host, StepResult};
use crate::system::{Fetcher, SystemOps};
use crate::version::{self, OFFERED_VERSIONS, Version};

/// Progress of an installer run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Start,
    PrivilegeOk,
    DependencyOk,
    VersionSelected,
    UserReady,
    Installed,
    Configured,
    ServiceRegistered,
    Done,
    Failed,
}

/// How the version to install is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChoice {
    /// Offer the latest releases and ask
    Prompt,
    /// Install this release without asking
    Pinned(Version),
}

/// Fetch every release published on the context's mirror, ascending
pub fn discover_versions(
    ctx: &InstallerContext,
    fetcher: &dyn Fetcher,
) -> Result<Vec<Version>, InstallError> {
    let url = ctx.index_url();
    debug!(%url, "fetching release index");
    let html = fetcher
        .fetch_text(&url)
        .map_err(|e| InstallError::operation(Phase::VersionDiscovery, e))?;

    let versions = version::parse_index(&html);
    if versions.is_empty() {
        return Err(InstallError::operation(
            Phase::VersionDiscovery,
            format!("no releases listed at {url}"),
        ));
    }
    debug!(count = versions.len(), "releases found");
    Ok(versions)
}

/// Single-host Kafka installer
pub struct Installer<'a> {
    ctx: InstallerContext,
    host: Host<'a>,
    reporter: &'a dyn Reporter,
    options: InstallOptions,
    state: InstallState,
}

impl<'a> Installer<'a> {
    pub fn new(
        ctx: InstallerContext,
        system: &'a dyn SystemOps,
        fetcher: &'a dyn Fetcher,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            ctx,
            host: Host::new(system, fetcher),
            reporter,
            options: InstallOptions::default(),
            state: InstallState::Start,
        }
    }

    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn context(&self) -> &InstallerContext {
        &self.ctx
    }

    /// Run the complete install
    pub fn install(
        &mut self,
        choice: VersionChoice,
        input: &mut dyn InputSource,
    ) -> Result<(), InstallError> {
        let result = self.run(choice, input);
        if let Err(e) = &result {
            debug!(state = ?self.state, error = %e, "install aborted");
            info!(from = ?self.state, "install failed");
            self.state = InstallState::Failed;
        }
        result
    }

    fn run(&mut self, choice: VersionChoice, input: &mut dyn InputSource) -> Result<(), InstallError> {
        self.check_root()?;
        self.advance(InstallState::PrivilegeOk)?;

        self.check_java()?;
        self.advance(InstallState::DependencyOk)?;

        let version = self.choose_version(choice, input)?;
        self.ctx.select_version(version)?;
        self.reporter.info(&format!("Selected Kafka version: {version}"));
        self.advance(InstallState::VersionSelected)?;

        self.reporter.info(&format!("Installing Kafka {version}..."));
        self.run_stage(&Manifest::account_stage(&self.ctx))?;
        self.run_stage(&Manifest::install_stage(&self.ctx, version, self.options))?;

        let configure = Manifest::configure_stage(&self.ctx)
            .map_err(|e| InstallError::operation(Phase::Installation, e))?;
        self.apply_stage(&configure)?;
        self.ctx.set_config_file(self.ctx.config_path());
        self.advance(configure.reaches)?;

        let config_file = self
            .ctx
            .config_file()
            .ok_or_else(|| InstallError::precondition("configuration file was not written"))?;
        let service = Manifest::service_stage(&self.ctx, config_file)
            .map_err(|e| InstallError::operation(Phase::Installation, e))?;
        self.run_stage(&service)?;

        self.advance(InstallState::Done)?;
        Ok(())
    }

    /// Refuse to run without root privileges
    pub fn check_root(&self) -> Result<(), InstallError> {
        if self.host.system.is_root() {
            Ok(())
        } else {
            Err(InstallError::precondition(
                "this installer must be run as root",
            ))
        }
    }

    /// Refuse to run without a working `java`
    pub fn check_java(&self) -> Result<(), InstallError> {
        match self.host.system.run("java", &["-version"]) {
            Ok(output) if output.success => Ok(()),
            Ok(output) => {
                debug!(status = %output.status, "java -version failed");
                Err(Self::java_missing())
            }
            Err(e) => {
                debug!(error = %e, "java not runnable");
                Err(Self::java_missing())
            }
        }
    }

    fn java_missing() -> InstallError {
        InstallError::precondition("Java runtime not found, install a JDK first")
    }

    fn choose_version(
        &self,
        choice: VersionChoice,
        input: &mut dyn InputSource,
    ) -> Result<Version, InstallError> {
        let published = discover_versions(&self.ctx, self.host.fetcher)?;

        match choice {
            VersionChoice::Pinned(version) => {
                if published.contains(&version) {
                    Ok(version)
                } else {
                    Err(InstallError::operation(
                        Phase::VersionDiscovery,
                        format!("Kafka {version} is not published at {}", self.ctx.mirror),
                    ))
                }
            }
            VersionChoice::Prompt => {
                let offered = version::latest(published, OFFERED_VERSIONS);
                VersionPrompt::new(&offered)
                    .and_then(|prompt| prompt.run(input, self.reporter))
                    .map_err(|e| InstallError::operation(Phase::Installation, e))
            }
        }
    }

    fn run_stage(&mut self, stage: &Stage) -> Result<(), InstallError> {
        self.apply_stage(stage)?;
        self.advance(stage.reaches)
    }

    fn apply_stage(&self, stage: &Stage) -> Result<(), InstallError> {
        self.reporter.info(&format!("{}...", stage.message));

        for step in &stage.steps {
            debug!(stage = stage.name, step = step.description(), "applying");
            let result = step
                .apply(self.host)
                .map_err(|e| InstallError::operation(stage.phase, e))?;
            if result == StepResult::Skipped {
                debug!(step = step.description(), "already satisfied");
            }
        }

        Ok(())
    }

    /// Move to `next`. `Configured` requires the configuration file to be recorded.
    fn advance(&mut self, next: InstallState) -> Result<(), InstallError> {
        if next == InstallState::Configured && self.ctx.config_file().is_none() {
            return Err(InstallError::precondition(
                "configuration file was not recorded",
            ));
        }
        info!(from = ?self.state, to = ?next, "install state");
        self.state = next;
        Ok(())
    }
}
