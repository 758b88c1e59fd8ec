//! Version.
//!
//! This module contains the version information of this program and the information printed by `--info`.

use crate::layout::Layout;
use crate::platform::PlatformInfo;
use crate::runtime::NodeRuntime;
use crate::tool::CdkTool;
use std::fmt;

/// The version information of this program, captured at build time.
#[derive(Debug)]
pub(crate) struct Version {
    /// The name of the package.
    pub(crate) pkg_name: &'static str,
    /// The version of the package.
    pub(crate) pkg_version: &'static str,
    /// The value that `git describe` returned.
    pub(crate) git_describe: &'static str,
    /// The version of the rust compiler.
    pub(crate) rustc_semver: &'static str,
}

impl Default for Version {
    fn default() -> Self {
        Self {
            pkg_name: env!("CARGO_PKG_NAME"),
            pkg_version: env!("CARGO_PKG_VERSION"),
            git_describe: env!("VERGEN_GIT_DESCRIBE"),
            rustc_semver: env!("VERGEN_RUSTC_SEMVER"),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            pkg_name,
            pkg_version,
            git_describe,
            rustc_semver,
        } = self;
        write!(f, "{pkg_name} {pkg_version} (git/{git_describe}) (rustc/{rustc_semver})")
    }
}

/// Everything `--info` reports.
#[derive(Debug)]
pub(crate) struct Info {
    version: Version,
    platform: PlatformInfo,
    node_version: Option<semver::Version>,
    cdk_version: Option<semver::Version>,
    layout: Layout,
    cdk_package: String,
}

impl Info {
    /// Collects the information about the given install directory.
    pub(crate) fn collect(platform: PlatformInfo, layout: &Layout, runtime: &NodeRuntime, tool: &CdkTool, cdk_package: &str) -> Self {
        Self {
            version: Version::default(),
            platform,
            node_version: runtime.installed_version().ok(),
            cdk_version: tool.installed_version().ok(),
            layout: layout.clone(),
            cdk_package: cdk_package.to_string(),
        }
    }
}

// Formats an optional version.
#[doc(hidden)]
fn or_not_installed(version: Option<&semver::Version>) -> String {
    version.map_or("not installed".to_string(), |version| format!("v{version}"))
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.version)?;
        writeln!(f, "AWS CDK: {}", or_not_installed(self.cdk_version.as_ref()))?;
        writeln!(f, "Node.js: {}", or_not_installed(self.node_version.as_ref()))?;
        writeln!(f, "Platform: {}", self.platform)?;
        writeln!(f)?;
        writeln!(f, "Installation Paths:")?;
        writeln!(f, "  Install directory: {}", self.layout.root().display())?;
        writeln!(f, "  Node.js binary: {}", self.layout.node_bin().display())?;
        write!(f, "  CDK script: {}", self.layout.cdk_script(&self.cdk_package).display())
    }
}
