//! Kafka Init - Single-Host Apache Kafka Installer
//!
//! Installs a published Apache Kafka release as a systemd service.
//! - Resolves the release from the mirror (prompt or pinned version)
//! - Unpacks it under the install root and creates the service account
//! - Writes `server.properties` and the systemd unit

mod host;
mod output;
mod prompt;

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Color, Table, presets::UTF8_FULL_CONDENSED};
use console::{Emoji, style};
use kafka_provision::version::{self as versions, OFFERED_VERSIONS};
use kafka_provision::{
    BashRenderer, InstallOptions, InstallerContext, Installer, Manifest, Renderer, Reporter,
    Version, VersionChoice, discover_versions, templates,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use host::{HostSystem, HttpFetcher};
use output::ConsoleReporter;
use prompt::TerminalInput;

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");

/// Configuration file structure
/// Path: ~/.config/kafka-init/init.toml (XDG-style)
#[derive(Debug, Default, Serialize, Deserialize)]
struct Config {
    #[serde(default)]
    kafka: KafkaConfig,
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    service: ServiceConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct KafkaConfig {
    version: Option<String>,
    scala_version: Option<String>,
    mirror: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PathsConfig {
    install_root: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    unit_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ServiceConfig {
    user: Option<String>,
    name: Option<String>,
    requires: Option<String>,
    java_home: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "kafka-init",
    version,
    about = "Install Apache Kafka as a systemd service on a single host"
)]
struct Args {
    /// Subcommand (defaults to install if not specified)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (global)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show config file path and exit
    #[arg(long)]
    show_config: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install Kafka on this host (default)
    Install(InstallArgs),

    /// List releases published on the mirror
    Versions(VersionsArgs),

    /// Print a rendered artefact without touching the host
    Show(ShowArgs),
}

/// Settings shared by every command that resolves a release
#[derive(Parser, Debug, Default)]
struct ReleaseArgs {
    /// Install this release instead of prompting (e.g., 3.7.0)
    #[arg(long)]
    kafka_version: Option<String>,

    /// Scala build of the distribution (e.g., 2.13)
    #[arg(long)]
    scala_version: Option<String>,

    /// Release mirror base URL
    #[arg(long)]
    mirror: Option<String>,
}

#[derive(Parser, Debug, Default)]
struct InstallArgs {
    #[command(flatten)]
    release: ReleaseArgs,

    /// Verify the archive against the published SHA-512
    #[arg(long)]
    verify_checksum: bool,

    /// Dry run - show the plan and script without installing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct VersionsArgs {
    /// List every published release, not only the latest ones
    #[arg(long)]
    all: bool,

    /// Release mirror base URL
    #[arg(long)]
    mirror: Option<String>,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Artefact to print
    #[arg(value_enum)]
    artifact: Artifact,

    #[command(flatten)]
    release: ReleaseArgs,

    /// Include the checksum check in the script
    #[arg(long)]
    verify_checksum: bool,
}

/// Artefacts the show command can print
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Artifact {
    /// Broker server.properties
    Properties,
    /// systemd unit file
    Unit,
    /// Standalone bash install script
    Script,
}

/// Config path - XDG-style, same layout on every platform
/// Always ~/.config/kafka-init/init.toml unless XDG_CONFIG_HOME is set
fn config_path() -> PathBuf {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kafka-init")
        .join("init.toml")
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let path = path.cloned().unwrap_or_else(config_path);

    if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        ConsoleReporter::new().error(&error_message(&e));
        std::process::exit(1);
    }
}

/// One-line failure text including the cause chain
fn error_message(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

fn run(args: Args) -> Result<()> {
    // Show config path and exit
    if args.show_config {
        let path = args.config.clone().unwrap_or_else(config_path);
        println!("{} Config: {}", FOLDER, path.display());
        if path.exists() {
            println!("  {CHECK} exists");
        } else {
            println!("  {} not found (will use defaults)", style("!").yellow());
        }
        return Ok(());
    }

    let file_config = load_config(args.config.as_ref())?;

    match args.command {
        Some(Commands::Install(install_args)) => run_install(&install_args, &file_config),
        Some(Commands::Versions(versions_args)) => run_versions(&versions_args, &file_config),
        Some(Commands::Show(show_args)) => run_show(&show_args, &file_config),
        None => run_install(&InstallArgs::default(), &file_config),
    }
}

/// Run the install on this host
fn run_install(args: &InstallArgs, config: &Config) -> Result<()> {
    let ctx = resolve_context(&args.release, config, env_var);
    let pin = resolve_pin(&args.release, config, env_var)?;
    let options = InstallOptions {
        verify_checksum: args.verify_checksum,
    };

    print_banner();
    print_plan_table(&ctx, pin, options);

    let fetcher = HttpFetcher::new()?;

    if args.dry_run {
        println!("\n{} Dry run - not installing", style("i").cyan());
        let version = resolve_release(&ctx, pin, &fetcher)?;
        print_script(&ctx, version, options)?;
        return Ok(());
    }

    let system = HostSystem::new();
    let reporter = ConsoleReporter::new();
    let choice = pin.map_or(VersionChoice::Prompt, VersionChoice::Pinned);

    let mut installer = Installer::new(ctx, &system, &fetcher, &reporter).with_options(options);
    installer.install(choice, &mut TerminalInput)?;

    print_success(installer.context());
    Ok(())
}

/// List published releases
fn run_versions(args: &VersionsArgs, config: &Config) -> Result<()> {
    let release = ReleaseArgs {
        mirror: args.mirror.clone(),
        ..ReleaseArgs::default()
    };
    let ctx = resolve_context(&release, config, env_var);
    let fetcher = HttpFetcher::new()?.with_progress(false);

    println!("\n{LOOKING_GLASS}Fetching releases from {}", style(&ctx.mirror).cyan());
    let published = discover_versions(&ctx, &fetcher)?;
    let total = published.len();
    let shown = if args.all {
        published
    } else {
        versions::latest(published, OFFERED_VERSIONS)
    };
    let newest = shown.last().copied();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Version").fg(Color::Cyan),
        Cell::new("Archive").fg(Color::Cyan),
    ]);
    for (i, version) in shown.iter().enumerate() {
        let label = if Some(*version) == newest {
            Cell::new(format!("{version} (latest)")).fg(Color::Green)
        } else {
            Cell::new(version.to_string())
        };
        table.add_row(vec![
            Cell::new(i + 1),
            label,
            Cell::new(ctx.archive_name(*version)),
        ]);
    }
    println!("{table}");
    if !args.all && total > shown.len() {
        println!(
            "{} {} older releases hidden, use --all to list them",
            style("i").cyan(),
            total - shown.len()
        );
    }
    Ok(())
}

/// Print a rendered artefact
fn run_show(args: &ShowArgs, config: &Config) -> Result<()> {
    let ctx = resolve_context(&args.release, config, env_var);

    match args.artifact {
        Artifact::Properties => {
            let properties = templates::server_properties(&ctx.log_dir)?;
            print!("{properties}");
        }
        Artifact::Unit => {
            let unit = templates::service_unit(&ctx, &ctx.config_path())?;
            print!("{unit}");
        }
        Artifact::Script => {
            let pin = resolve_pin(&args.release, config, env_var)?;
            let fetcher = HttpFetcher::new()?.with_progress(false);
            let version = resolve_release(&ctx, pin, &fetcher)?;
            let options = InstallOptions {
                verify_checksum: args.verify_checksum,
            };
            print_script(&ctx, version, options)?;
        }
    }
    Ok(())
}

/// The pinned release if published, otherwise the newest one
fn resolve_release(
    ctx: &InstallerContext,
    pin: Option<Version>,
    fetcher: &HttpFetcher,
) -> Result<Version> {
    let published = discover_versions(ctx, fetcher)?;
    match pin {
        Some(version) if published.contains(&version) => Ok(version),
        Some(version) => anyhow::bail!("Kafka {version} is not published at {}", ctx.mirror),
        None => published
            .last()
            .copied()
            .context("No releases published on the mirror"),
    }
}

fn print_script(ctx: &InstallerContext, version: Version, options: InstallOptions) -> Result<()> {
    let mut ctx = ctx.clone();
    ctx.select_version(version)?;
    let manifest = Manifest::kafka(&ctx, options)?;
    let script = BashRenderer::new()
        .verbose(true)
        .color(true)
        .render(&manifest)
        .map_err(|e| anyhow::anyhow!("Failed to render bash script: {e:?}"))?;
    println!("{script}");
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve the installer context
/// Priority: CLI args > env vars > config file > defaults
fn resolve_context(
    args: &ReleaseArgs,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> InstallerContext {
    let defaults = InstallerContext::default();

    InstallerContext::builder()
        .runtime_variant(
            args.scala_version
                .clone()
                .or_else(|| env("KAFKA_SCALA_VERSION"))
                .or_else(|| config.kafka.scala_version.clone())
                .unwrap_or(defaults.runtime_variant),
        )
        .mirror(
            args.mirror
                .clone()
                .or_else(|| env("KAFKA_MIRROR"))
                .or_else(|| config.kafka.mirror.clone())
                .unwrap_or(defaults.mirror),
        )
        .install_root(
            config
                .paths
                .install_root
                .clone()
                .unwrap_or(defaults.install_root),
        )
        .data_dir(config.paths.data_dir.clone().unwrap_or(defaults.data_dir))
        .log_dir(config.paths.log_dir.clone().unwrap_or(defaults.log_dir))
        .unit_dir(config.paths.unit_dir.clone().unwrap_or(defaults.unit_dir))
        .service_user(
            config
                .service
                .user
                .clone()
                .unwrap_or(defaults.service_user),
        )
        .unit_name(config.service.name.clone().unwrap_or(defaults.unit_name))
        .coordination_unit(
            config
                .service
                .requires
                .clone()
                .unwrap_or(defaults.coordination_unit),
        )
        .java_home(
            config
                .service
                .java_home
                .clone()
                .unwrap_or(defaults.java_home),
        )
        .build()
}

/// Resolve a pinned release, if any
/// Priority: CLI args > env vars > config file
fn resolve_pin(
    args: &ReleaseArgs,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<Version>> {
    args.kafka_version
        .clone()
        .or_else(|| env("KAFKA_VERSION"))
        .or_else(|| config.kafka.version.clone())
        .map(|v| {
            v.parse::<Version>()
                .with_context(|| format!("Invalid Kafka version '{v}', expected X.Y.Z"))
        })
        .transpose()
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════╗")
            .cyan()
            .bold()
    );
    println!(
        "{}",
        style("║        APACHE KAFKA INSTALLER         ║")
            .cyan()
            .bold()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════╝")
            .cyan()
            .bold()
    );
}

fn print_plan_table(ctx: &InstallerContext, pin: Option<Version>, options: InstallOptions) {
    println!("\n{} Plan\n", style("▸").blue().bold());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Setting").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
    ]);

    let version = pin.map_or_else(|| "prompt".to_string(), |v| v.to_string());
    table.add_row(vec!["Version", &version]);
    table.add_row(vec!["Scala", &ctx.runtime_variant]);
    table.add_row(vec!["Mirror", &ctx.mirror]);
    table.add_row(vec!["Install root", &display(&ctx.install_root)]);
    table.add_row(vec!["Data", &display(&ctx.data_dir)]);
    table.add_row(vec!["Logs", &display(&ctx.log_dir)]);
    table.add_row(vec!["User", &ctx.service_user]);
    table.add_row(vec!["Unit", &display(&ctx.unit_path())]);
    table.add_row(vec!["Requires", &ctx.coordination_unit]);
    table.add_row(vec![
        "Checksum",
        if options.verify_checksum {
            "verify"
        } else {
            "skip"
        },
    ]);

    println!("{table}");
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn print_success(ctx: &InstallerContext) {
    println!();
    println!(
        "{}",
        style("+=======================================+")
            .green()
            .bold()
    );
    println!(
        "{}",
        style("|           KAFKA INSTALLED!            |")
            .green()
            .bold()
    );
    println!(
        "{}",
        style("+=======================================+")
            .green()
            .bold()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if let Some(version) = ctx.selected_version() {
        table.add_row(vec![
            Cell::new("Version").fg(Color::Cyan),
            Cell::new(version),
        ]);
    }
    table.add_row(vec![
        Cell::new("Home").fg(Color::Cyan),
        Cell::new(display(&ctx.install_root)),
    ]);
    if let Some(config_file) = ctx.config_file() {
        table.add_row(vec![
            Cell::new("Config").fg(Color::Cyan),
            Cell::new(display(config_file)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Unit").fg(Color::Cyan),
        Cell::new(display(&ctx.unit_path())),
    ]);
    println!("{table}");
    println!();

    for hint in completion_hints(ctx) {
        println!("  {} {hint}", style("->").dim());
    }
    println!();
    println!("{SPARKLE} Installation complete!");
}

fn completion_hints(ctx: &InstallerContext) -> Vec<String> {
    vec![
        format!(
            "Make sure {} is running before starting Kafka",
            ctx.coordination_unit
        ),
        format!("Start Kafka with: systemctl start {}", ctx.unit_name),
        format!("Check the status with: systemctl status {}", ctx.unit_name),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_config() {
        let ctx = resolve_context(&ReleaseArgs::default(), &Config::default(), no_env);

        assert_eq!(ctx.install_root, PathBuf::from("/opt/kafka"));
        assert_eq!(ctx.log_dir, PathBuf::from("/data/kafka-logs"));
        assert_eq!(ctx.runtime_variant, "2.13");
        assert_eq!(ctx.mirror, "https://downloads.apache.org/kafka");
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        let config: Config = toml::from_str(
            r#"
            [kafka]
            scala_version = "2.12"
            mirror = "https://file.test/kafka"

            [paths]
            log_dir = "/srv/kafka-logs"

            [service]
            requires = "kraft.service"
            "#,
        )
        .unwrap();
        let env = |name: &str| (name == "KAFKA_MIRROR").then(|| "https://env.test/kafka".to_string());
        let args = ReleaseArgs {
            scala_version: Some("2.13".into()),
            ..ReleaseArgs::default()
        };

        let ctx = resolve_context(&args, &config, env);

        assert_eq!(ctx.runtime_variant, "2.13");
        assert_eq!(ctx.mirror, "https://env.test/kafka");
        assert_eq!(ctx.log_dir, PathBuf::from("/srv/kafka-logs"));
        assert_eq!(ctx.coordination_unit, "kraft.service");
        assert_eq!(ctx.install_root, PathBuf::from("/opt/kafka"));
    }

    #[test]
    fn test_pin_resolution() {
        let config: Config = toml::from_str("[kafka]\nversion = \"3.6.1\"\n").unwrap();

        let from_file = resolve_pin(&ReleaseArgs::default(), &config, no_env).unwrap();
        assert_eq!(from_file, Some(Version::new(3, 6, 1)));

        let env = |name: &str| (name == "KAFKA_VERSION").then(|| "3.7.0".to_string());
        let from_env = resolve_pin(&ReleaseArgs::default(), &config, env).unwrap();
        assert_eq!(from_env, Some(Version::new(3, 7, 0)));

        let args = ReleaseArgs {
            kafka_version: Some("3.8".into()),
            ..ReleaseArgs::default()
        };
        assert!(resolve_pin(&args, &config, no_env).is_err());

        assert_eq!(
            resolve_pin(&ReleaseArgs::default(), &Config::default(), no_env).unwrap(),
            None
        );
    }

    #[test]
    fn test_load_missing_config_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_config(Some(&tmp.path().join("init.toml"))).unwrap();

        assert!(config.kafka.version.is_none());
    }

    #[test]
    fn test_load_invalid_config_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("init.toml");
        fs::write(&path, "[kafka\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        let message = error_message(&err);
        assert!(message.starts_with("Failed to parse config: "), "{message}");
        assert!(message.contains("init.toml: "), "{message}");
    }

    #[test]
    fn test_invalid_pin_message() {
        let args = ReleaseArgs {
            kafka_version: Some("latest".into()),
            ..ReleaseArgs::default()
        };

        let err = resolve_pin(&args, &Config::default(), no_env).unwrap_err();
        assert!(error_message(&err).starts_with("Invalid Kafka version 'latest', expected X.Y.Z: "));
    }

    #[test]
    fn test_installer_error_keeps_phase_prefix() {
        let err = anyhow::Error::from(kafka_provision::InstallError::operation(
            kafka_provision::Phase::Install,
            "connection reset",
        ));

        assert_eq!(error_message(&err), "install failed: connection reset");
    }

    #[test]
    fn test_completion_hints_name_the_units() {
        let hints = completion_hints(&InstallerContext::default());

        assert!(hints[0].contains("zookeeper.service"));
        assert!(hints[1].ends_with("systemctl start kafka"));
        assert!(hints[2].ends_with("systemctl status kafka"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "kafka-init",
            "install",
            "--kafka-version",
            "3.7.0",
            "--verify-checksum",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Install(install)) => {
                assert_eq!(install.release.kafka_version.as_deref(), Some("3.7.0"));
                assert!(install.verify_checksum);
                assert!(!install.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let args = Args::try_parse_from(["kafka-init", "show", "script", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Some(Commands::Show(ShowArgs {
                artifact: Artifact::Script,
                ..
            }))
        ));
    }
}
