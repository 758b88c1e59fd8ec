//! Component.
//!
//! This module contains the seam between the installer and the things it installs.

use std::fmt;

/// Trait for components the installer provides (the Node.js runtime, the AWS CDK).
pub(crate) trait Installable: fmt::Debug {
    /// Returns the human readable name of the component.
    fn name(&self) -> &str;

    /// Whether the component is already present. Must not have side effects.
    fn is_installed(&self) -> bool;

    /// Installs the component. In offline mode only locally cached artifacts may be used.
    fn install(&self, offline: bool) -> anyhow::Result<()>;
}
