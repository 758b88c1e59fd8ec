//! Platform.
//!
//! This module contains the detection and validation of the host platform.

use std::env;
use std::fmt;
use tracing::warn;

/// Enumeration of operating systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Os {
    /// Windows
    Windows,
    /// macOS
    Darwin,
    /// Linux
    Linux,
    /// Anything else, holding the raw name.
    Other(String),
}

impl Os {
    /// Returns the id of the operating system.
    pub(crate) fn id(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Other(name) => name,
        }
    }

    /// Whether this operating system is one of the supported ones.
    pub(crate) fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns the name used by the Node.js distribution for this operating system.
    pub(crate) fn dist_name(&self) -> Option<&'static str> {
        match self {
            Self::Windows => Some("win"),
            Self::Darwin => Some("darwin"),
            Self::Linux => Some("linux"),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for Os {
    fn from(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        match value.as_str() {
            "windows" | "win32" => Self::Windows,
            "darwin" | "macos" => Self::Darwin,
            "linux" => Self::Linux,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Enumeration of CPU architectures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Arch {
    /// x86_64 (also known as amd64 or x64)
    X86_64,
    /// arm64 (the name macOS uses)
    Arm64,
    /// aarch64 (the name Linux uses)
    Aarch64,
    /// Anything else, holding the raw name.
    Other(String),
}

impl Arch {
    /// Returns the id of the architecture.
    pub(crate) fn id(&self) -> &str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::Aarch64 => "aarch64",
            Self::Other(name) => name,
        }
    }

    /// Whether this architecture is one of the supported ones.
    pub(crate) fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns the name used by the Node.js distribution for this architecture.
    pub(crate) fn dist_name(&self) -> Option<&'static str> {
        match self {
            Self::X86_64 => Some("x64"),
            Self::Arm64 | Self::Aarch64 => Some("arm64"),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for Arch {
    fn from(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        match value.as_str() {
            "x86_64" | "amd64" | "x64" => Self::X86_64,
            "arm64" => Self::Arm64,
            "aarch64" => Self::Aarch64,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// The host platform, computed once at start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PlatformInfo {
    pub(crate) os: Os,
    pub(crate) arch: Arch,
}

impl PlatformInfo {
    /// Detects the platform this program runs on.
    pub(crate) fn detect() -> Self {
        Self::from_names(env::consts::OS, env::consts::ARCH)
    }

    /// Creates a `PlatformInfo` out of raw operating system and architecture names.
    pub(crate) fn from_names(os: &str, arch: &str) -> Self {
        Self { os: os.into(), arch: arch.into() }
    }

    /// Logs a warning for every part of the platform that is not supported.
    ///
    /// The check is advisory only; it never stops the installation.
    pub(crate) fn validate(&self) {
        if !self.os.is_supported() {
            warn!("Unsupported operating system: {}. The AWS CDK wrapper may not work correctly.", self.os);
        }
        if !self.arch.is_supported() {
            warn!("Unsupported architecture: {}. The AWS CDK wrapper may not work correctly.", self.arch);
        }
    }

    /// Returns the `<os>-<arch>` suffix of the Node.js distribution, if there is one for this platform.
    pub(crate) fn dist_suffix(&self) -> Option<String> {
        let os = self.os.dist_name()?;
        let arch = self.arch.dist_name()?;
        Some(format!("{os}-{arch}"))
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
