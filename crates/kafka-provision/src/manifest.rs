//! Installation manifest - complete step sequence

use std::path::Path;

use crate::context::InstallerContext;
use crate::error::{InstallError, Phase, StepError};
use crate::installer::InstallState;
use crate::steps::{EnsureDirectory, EnsureUser, InstallArchive, RegisterService, Step, WriteFile};
use crate::templates;
use crate::version::Version;

/// Mode applied to the install, data and log trees
pub const TREE_MODE: u32 = 0o755;

/// Optional behaviour of the install flow
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Check the archive against the mirror's published SHA-512
    pub verify_checksum: bool,
}

/// Group of steps that succeed or fail together
pub struct Stage {
    /// Short name for plans and logs
    pub name: &'static str,
    /// Message shown when the stage starts
    pub message: String,
    /// Phase failures are reported under
    pub phase: Phase,
    /// State reached once every step has applied
    pub reaches: InstallState,
    /// Ordered steps
    pub steps: Vec<Box<dyn Step>>,
}

impl Stage {
    fn new(
        name: &'static str,
        message: impl Into<String>,
        phase: Phase,
        reaches: InstallState,
    ) -> Self {
        Self {
            name,
            message: message.into(),
            phase,
            reaches,
            steps: vec![],
        }
    }

    fn with_step<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }
}

/// Complete Kafka installation manifest for one version
pub struct Manifest {
    /// Version being installed
    pub version: Version,
    /// Ordered stages
    pub stages: Vec<Stage>,
}

impl Manifest {
    /// Build the full manifest for the context's selected version
    ///
    /// The service unit points at the canonical configuration path, which is
    /// where the configure stage writes it.
    pub fn kafka(ctx: &InstallerContext, options: InstallOptions) -> Result<Self, InstallError> {
        let version = ctx.require_version()?;
        let render = |e: StepError| InstallError::operation(Phase::Installation, e);

        Ok(Self {
            version,
            stages: vec![
                Self::account_stage(ctx),
                Self::install_stage(ctx, version, options),
                Self::configure_stage(ctx).map_err(render)?,
                Self::service_stage(ctx, &ctx.config_path()).map_err(render)?,
            ],
        })
    }

    /// Service account provisioning
    pub fn account_stage(ctx: &InstallerContext) -> Stage {
        Stage::new(
            "account",
            format!("Ensuring service account {}", ctx.service_user),
            Phase::Installation,
            InstallState::UserReady,
        )
        .with_step(EnsureUser::system(&ctx.service_user))
    }

    /// Download, unpack, relocate and permission the installation tree
    pub fn install_stage(ctx: &InstallerContext, version: Version, options: InstallOptions) -> Stage {
        let mut archive = InstallArchive::new(
            ctx.download_url(version),
            ctx.archive_name(version),
            ctx.dist_name(version),
            &ctx.install_root,
        );
        if options.verify_checksum {
            archive = archive.verify_checksum();
        }

        let owner = ctx.owner();
        let tree = |path: &Path| {
            EnsureDirectory::new(path)
                .with_owner(owner.clone())
                .with_mode(TREE_MODE)
                .recursive()
        };

        Stage::new(
            "install",
            format!("Downloading and unpacking Kafka {version}"),
            Phase::Install,
            InstallState::Installed,
        )
        .with_step(archive)
        .with_step(tree(&ctx.data_dir))
        .with_step(tree(&ctx.log_dir))
        .with_step(tree(&ctx.install_root))
    }

    /// Broker configuration file
    pub fn configure_stage(ctx: &InstallerContext) -> Result<Stage, StepError> {
        let properties = templates::server_properties(&ctx.log_dir)?;
        Ok(Stage::new(
            "configure",
            "Writing broker configuration",
            Phase::Installation,
            InstallState::Configured,
        )
        .with_step(
            WriteFile::new(ctx.config_path(), properties)
                .with_owner(ctx.owner())
                .with_backup(),
        ))
    }

    /// systemd unit for the broker started with `config_file`
    pub fn service_stage(ctx: &InstallerContext, config_file: &Path) -> Result<Stage, StepError> {
        let unit = templates::service_unit(ctx, config_file)?;
        Ok(Stage::new(
            "service",
            format!("Registering systemd unit {}.service", ctx.unit_name),
            Phase::Installation,
            InstallState::ServiceRegistered,
        )
        .with_step(RegisterService::new(ctx.unit_path(), unit)))
    }

    /// All steps in order
    pub fn steps(&self) -> impl Iterator<Item = &(dyn Step + 'static)> {
        self.stages
            .iter()
            .flat_map(|stage| stage.steps.iter().map(|step| &**step))
    }
}
