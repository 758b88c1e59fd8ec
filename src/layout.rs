//! Layout.
//!
//! This module contains the layout of the install directory.

use crate::platform::PlatformInfo;
use crate::vars::*;
use std::path::{self, Path, PathBuf};
use std::rc::Rc;

/// Name of the directory holding the Node.js runtime.
const NODE_DIR: &str = "node";

/// Name of the directory npm installs packages into.
const MODULES_DIR: &str = "node_modules";

/// Name of the directory holding downloaded archives and temporary files.
const CACHE_DIR: &str = ".cache";

/// Name of the directory holding the license notices.
const LICENSES_DIR: &str = "licenses";

/// The paths within the install directory.
#[derive(Clone, Debug)]
pub(crate) struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Creates a new `Layout` rooted at the given directory.
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the install directory, expanding variables and making it absolute relative to `basedir`.
    ///
    /// Known variables: `CI_OS`, `CI_ARCH`, `CI_NODE_VERSION` and `env.<NAME>` for environment variables.
    pub(crate) fn resolve(basedir: &Path, directory: &str, platform: &PlatformInfo, node_version: &semver::Version) -> anyhow::Result<Self> {
        // setup variable resolver(s)
        let mut simple_var_resolver = SimpleVarResolver::default();
        simple_var_resolver
            .insert("CI_OS", platform.os.id())
            .insert("CI_ARCH", platform.arch.id())
            .insert("CI_NODE_VERSION", node_version.to_string());
        let env_var_resolver = PrefixedVarResolver::new("env.", Rc::new(OsEnvVarResolver));
        let var_resolvers: [Rc<dyn VarResolver>; 2] = [Rc::new(simple_var_resolver), Rc::new(env_var_resolver)];
        let var_expander = VarExpander::new(var_resolvers);

        // resolve path
        let directory = var_expander.expand(directory)?;
        let root = basedir.join(directory.as_ref());
        let root = path::absolute(&root).unwrap_or(root);

        Ok(Self::new(root))
    }

    /// The install directory itself.
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// The directory of the Node.js runtime.
    pub(crate) fn node_dir(&self) -> PathBuf {
        self.root.join(NODE_DIR)
    }

    /// The directory containing the node and npm executables.
    pub(crate) fn node_bin_dir(&self) -> PathBuf {
        if cfg!(windows) { self.node_dir() } else { self.node_dir().join("bin") }
    }

    /// The node executable.
    pub(crate) fn node_bin(&self) -> PathBuf {
        if cfg!(windows) { self.node_bin_dir().join("node.exe") } else { self.node_bin_dir().join("node") }
    }

    /// The npm executable.
    pub(crate) fn npm_bin(&self) -> PathBuf {
        if cfg!(windows) { self.node_bin_dir().join("npm.cmd") } else { self.node_bin_dir().join("npm") }
    }

    /// The directory of the given npm package.
    pub(crate) fn package_dir(&self, package: &str) -> PathBuf {
        self.root.join(MODULES_DIR).join(package)
    }

    /// The entry script of the AWS CDK command line.
    pub(crate) fn cdk_script(&self, package: &str) -> PathBuf {
        self.package_dir(package).join("bin").join("cdk")
    }

    /// The directory holding downloaded archives.
    pub(crate) fn cache_dir(&self) -> PathBuf {
        self.root.join(CACHE_DIR)
    }

    /// The path of the license notice with the given name.
    pub(crate) fn license_path(&self, name: &str) -> PathBuf {
        self.root.join(LICENSES_DIR).join(name).join("LICENSE")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use test_log::test;

    #[test]
    fn paths() {
        let layout = Layout::new("/opt/cdk");
        assert_eq!(layout.root(), Path::new("/opt/cdk"));
        assert_eq!(layout.cdk_script("aws-cdk"), Path::new("/opt/cdk/node_modules/aws-cdk/bin/cdk"));
        assert_eq!(layout.license_path("node"), Path::new("/opt/cdk/licenses/node/LICENSE"));
        assert_eq!(layout.cache_dir(), Path::new("/opt/cdk/.cache"));
    }

    #[test]
    fn resolve_failure() {
        let platform = PlatformInfo::from_names("linux", "x86_64");
        let result = Layout::resolve(Path::new("/opt"), "${XYZ}", &platform, &semver::Version::new(22, 12, 0));
        assert!(result.is_err());
    }

    #[test]
    fn resolve_success() {
        let basedir = std::env::current_dir().unwrap();
        let platform = PlatformInfo::from_names("darwin", "arm64");
        let layout = Layout::resolve(&basedir, "cdk/${CI_OS}-${CI_ARCH}/${CI_NODE_VERSION}", &platform, &semver::Version::new(22, 12, 0)).unwrap();
        assert_eq!(layout.root(), basedir.join("cdk/darwin-arm64/22.12.0"));
    }

    #[test]
    fn resolve_absolute_directory_ignores_basedir() {
        let tempdir = tempfile::tempdir().unwrap();
        let directory = tempdir.path().to_string_lossy().into_owned();
        let platform = PlatformInfo::from_names("linux", "x86_64");
        let layout = Layout::resolve(Path::new("elsewhere"), &directory, &platform, &semver::Version::new(22, 12, 0)).unwrap();
        assert_eq!(layout.root(), tempdir.path());
    }

    #[cfg(not(windows))]
    #[test]
    fn node_paths() {
        let layout = Layout::new("/opt/cdk");
        assert_eq!(layout.node_bin(), Path::new("/opt/cdk/node/bin/node"));
        assert_eq!(layout.npm_bin(), Path::new("/opt/cdk/node/bin/npm"));
    }

    #[cfg(windows)]
    #[test]
    fn node_paths() {
        let layout = Layout::new(r"C:\cdk");
        assert_eq!(layout.node_bin(), Path::new(r"C:\cdk\node\node.exe"));
        assert_eq!(layout.npm_bin(), Path::new(r"C:\cdk\node\npm.cmd"));
    }
}
