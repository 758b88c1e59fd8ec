//! Tool.
//!
//! This module contains the code to install the AWS CDK with the bundled npm.

use crate::component::Installable;
use crate::config::CdkConfig;
use crate::layout::Layout;
use anyhow::{Context, bail};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::process::{Command, Stdio};
use tracing::{debug, instrument, trace};

/// The AWS CDK command line, installed as npm package.
#[derive(Debug)]
pub(crate) struct CdkTool {
    layout: Layout,
    package: String,
    package_spec: String,
}

// The part of `package.json` we are interested in.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
struct PackageJson {
    version: semver::Version,
}

impl CdkTool {
    /// Creates a new `CdkTool`.
    pub(crate) fn new(config: &CdkConfig, layout: &Layout) -> Self {
        Self {
            layout: layout.clone(),
            package: config.package.clone(),
            package_spec: config.package_spec(),
        }
    }

    /// Returns the version of the installed package.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn installed_version(&self) -> anyhow::Result<semver::Version> {
        let package_json = self.layout.package_dir(&self.package).join("package.json");
        let file = File::open(&package_json).with_context(|| format!("failed to open {}", package_json.display()))?;
        let package_json: PackageJson = serde_json::from_reader(file)?;

        Ok(package_json.version)
    }

    // Builds the npm command line.
    #[doc(hidden)]
    fn command(&self, offline: bool) -> anyhow::Result<Command> {
        // the bundled runtime comes first, npm scripts need to find node
        let node_bin_dir = self.layout.node_bin_dir();
        let path = env::var_os("PATH").unwrap_or_default();
        let path = env::join_paths(std::iter::once(node_bin_dir).chain(env::split_paths(&path)))?;

        let mut cmd = Command::new(self.layout.npm_bin());
        cmd.arg("install")
            .arg("--prefix")
            .arg(self.layout.root())
            .args(["--no-audit", "--no-fund", "--no-update-notifier"]);
        if offline {
            cmd.arg("--offline");
        }
        cmd.arg(&self.package_spec);
        cmd.env("PATH", path);
        cmd.stdin(Stdio::null()); // disconnect from self

        Ok(cmd)
    }
}

impl Installable for CdkTool {
    fn name(&self) -> &str {
        "AWS CDK"
    }

    fn is_installed(&self) -> bool {
        self.layout.cdk_script(&self.package).is_file()
    }

    #[instrument(level = "trace", skip(self))]
    fn install(&self, offline: bool) -> anyhow::Result<()> {
        let mut cmd = self.command(offline)?;
        debug!(?cmd, "running npm");
        let output = cmd.output().with_context(|| format!("failed to run {}", self.layout.npm_bin().display()))?;
        trace!(stdout = %String::from_utf8_lossy(&output.stdout));
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("npm install {} returned {}: {}", self.package_spec, output.status, stderr.trim());
        }
        if !self.is_installed() {
            bail!("npm install {} did not provide {}", self.package_spec, self.layout.cdk_script(&self.package).display());
        }

        Ok(())
    }
}
