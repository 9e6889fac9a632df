//! Standalone bash script renderer

use std::fmt::Write as _;

use super::Renderer;
use crate::Manifest;

/// Renders a manifest as a self-contained bash install script
#[derive(Debug, Clone)]
pub struct BashRenderer {
    /// Echo each step before running it
    verbose: bool,
    /// Use ANSI colors in echoed messages
    color: bool,
}

impl Default for BashRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BashRenderer {
    /// Create a new bash renderer (quiet, colored)
    pub fn new() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }

    /// Echo step descriptions while running
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable colored output
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn write_prelude(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "#!/usr/bin/env bash")?;
        writeln!(out, "set -euo pipefail")?;
        writeln!(out)?;

        if self.color {
            writeln!(out, r"GREEN='\033[32m'")?;
            writeln!(out, r"RED='\033[31m'")?;
            writeln!(out, r"RESET='\033[0m'")?;
        } else {
            writeln!(out, "GREEN=''")?;
            writeln!(out, "RED=''")?;
            writeln!(out, "RESET=''")?;
        }
        writeln!(out, r#"info() {{ echo -e "${{GREEN}}[INFO] $1${{RESET}}"; }}"#)?;
        writeln!(out, r#"fail() {{ echo -e "${{RED}}[ERROR] $1${{RESET}}"; exit 1; }}"#)?;
        writeln!(out)?;

        writeln!(
            out,
            r#"[ "$(id -u)" -eq 0 ] || fail "this installer must be run as root""#
        )?;
        writeln!(
            out,
            r#"java -version >/dev/null 2>&1 || fail "Java runtime not found, install a JDK first""#
        )?;
        Ok(())
    }
}

impl Renderer for BashRenderer {
    type Output = String;
    type Error = std::fmt::Error;

    fn render(&self, manifest: &Manifest) -> Result<String, Self::Error> {
        let mut out = String::new();
        self.write_prelude(&mut out)?;

        for stage in &manifest.stages {
            writeln!(out)?;
            writeln!(out, "# --- {} ---", stage.name)?;
            writeln!(out, "info {:?}", format!("{}...", stage.message))?;

            for step in &stage.steps {
                if self.verbose {
                    writeln!(out, "info {:?}", step.description())?;
                }
                let body = step.to_bash().join("\n");
                match step.check_command() {
                    Some(check) => writeln!(out, "if ! {check}; then\n{body}\nfi")?,
                    None => writeln!(out, "{body}")?,
                }
            }
        }

        writeln!(out)?;
        writeln!(out, "info {:?}", format!("Kafka {} installed", manifest.version))?;
        Ok(out)
    }
}
