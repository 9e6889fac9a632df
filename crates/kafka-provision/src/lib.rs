//! Kafka Provision - Installation Step Library
//!
//! This crate provides the pieces needed to install the Apache Kafka binary
//! distribution as a systemd service on a single host.
//!
//! # Architecture
//!
//! - [`Installer`]: linear orchestration from privilege check to service
//!   registration, with an explicit [`InstallState`]
//! - [`steps`] module: concrete mutations (account, archive, directories,
//!   files, unit) behind the [`Step`] trait
//! - [`Manifest`]: the steps of one install grouped into stages
//! - [`render`] module: output renderers (bash)
//! - [`SystemOps`] / [`Fetcher`]: host and network capabilities, swappable
//!   for fakes
//! - [`InstallerContext`]: paths and naming conventions for one run
//!
//! # Example
//!
//! ```ignore
//! use kafka_provision::{Installer, InstallerContext, VersionChoice};
//!
//! let mut installer = Installer::new(InstallerContext::default(), &system, &fetcher, &reporter);
//! installer.install(VersionChoice::Prompt, &mut stdin_input)?;
//! ```

pub mod context;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod render;
pub mod report;
pub mod select;
pub mod steps;
pub mod system;
pub mod templates;
pub mod version;

#[cfg(test)]
mod testing;

pub use context::InstallerContext;
pub use error::{FetchError, InstallError, Phase, StepError, SystemError};
pub use installer::{InstallState, Installer, VersionChoice, discover_versions};
pub use manifest::{InstallOptions, Manifest};
pub use render::{BashRenderer, Renderer};
pub use report::{Reporter, Severity};
pub use select::{InputSource, ScriptedInput};
pub use steps::Step;
pub use system::{CommandOutput, Download, Fetcher, SystemOps};
pub use version::Version;
