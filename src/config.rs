//! Configuration.
//!
//! This module contains the configuration read from an optional YAML file.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::env;
use std::fmt;
use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;
use tracing::instrument;

/// Name of the environment variable that enables the offline mode.
pub(crate) const OFFLINE_ENV: &str = "AWS_CDK_OFFLINE";

/// The struct that holds the configuration loaded from a YAML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct Config {
    /// The install directory (may contain variables).
    #[serde(default = "directory_default")]
    pub(crate) directory: String,
    /// The configuration of the Node.js runtime.
    #[serde(default)]
    pub(crate) node: NodeConfig,
    /// The configuration of the AWS CDK.
    #[serde(default)]
    pub(crate) cdk: CdkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: directory_default(),
            node: NodeConfig::default(),
            cdk: CdkConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from the given filename.
    #[instrument(err, level = "trace")]
    pub(crate) fn load_from_file<P>(filename: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_file = File::open(filename)?;

        let de = serde_yaml::Deserializer::from_reader(config_file);
        let value = serde_yaml::Value::deserialize(de)?;
        let config: Config = serde_yaml::from_value(value)?;

        Ok(config)
    }
}

// Returns the default value for [Config::directory].
#[doc(hidden)]
#[inline]
fn directory_default() -> String {
    ".".to_string()
}

/// The configuration of the Node.js runtime.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct NodeConfig {
    /// The version of the Node.js distribution.
    #[serde(default = "node_version_default")]
    pub(crate) version: semver::Version,
    /// The base URL of the Node.js distributions.
    #[serde(default = "node_dist_url_default")]
    pub(crate) dist_url: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            version: node_version_default(),
            dist_url: node_dist_url_default(),
        }
    }
}

// Returns the default value for [NodeConfig::version].
#[doc(hidden)]
#[inline]
fn node_version_default() -> semver::Version {
    semver::Version::new(22, 12, 0)
}

// Returns the default value for [NodeConfig::dist_url].
#[doc(hidden)]
#[inline]
fn node_dist_url_default() -> String {
    "https://nodejs.org/dist".to_string()
}

/// The configuration of the AWS CDK.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct CdkConfig {
    /// The name of the npm package.
    #[serde(default = "cdk_package_default")]
    pub(crate) package: String,
    /// The version (or dist-tag) of the npm package.
    #[serde(default = "cdk_version_default", deserialize_with = "cdk_version_deser")]
    pub(crate) version: String,
}

impl Default for CdkConfig {
    fn default() -> Self {
        Self {
            package: cdk_package_default(),
            version: cdk_version_default(),
        }
    }
}

impl CdkConfig {
    /// Returns the `<package>@<version>` spec passed to npm.
    pub(crate) fn package_spec(&self) -> String {
        let version = self.version.trim();
        if version.is_empty() {
            self.package.clone()
        } else {
            format!("{}@{version}", self.package)
        }
    }
}

// Returns the default value for [CdkConfig::package].
#[doc(hidden)]
#[inline]
fn cdk_package_default() -> String {
    "aws-cdk".to_string()
}

// Returns the default value for [CdkConfig::version].
#[doc(hidden)]
#[inline]
fn cdk_version_default() -> String {
    "latest".to_string()
}

// Deserializes the field [CdkConfig::version] from either unsigned integer or string.
// see https://serde.rs/string-or-struct.html
#[doc(hidden)]
fn cdk_version_deser<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct UintOrString(PhantomData<fn() -> String>);

    impl Visitor<'_> for UintOrString {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("unsigned integer or string")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(UintOrString(PhantomData))
}

/// Whether the given value of [OFFLINE_ENV] enables the offline mode.
pub(crate) fn is_offline_value(value: Option<&str>) -> bool {
    value == Some("1")
}

/// Reads the offline mode from the environment.
pub(crate) fn offline_from_env() -> bool {
    is_offline_value(env::var(OFFLINE_ENV).ok().as_deref())
}

/// The settings for one run, fixed at startup.
#[derive(Debug)]
pub(crate) struct Settings {
    /// The loaded configuration.
    pub(crate) config: Config,
    /// Whether to run in offline mode.
    pub(crate) offline: bool,
}
