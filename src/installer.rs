//! Installer.
//!
//! This module contains the orchestration of the post-install steps:
//! validate the platform, provide the runtime, provide the tool, write the license notices.

use crate::component::Installable;
use crate::license::{self, LicenseRecord};
use crate::platform::PlatformInfo;
use crate::retry::{self, InstallOutcome, MAX_ATTEMPTS};
use tracing::{debug, error, info, instrument, warn};

/// The error type for a failed installation.
#[derive(Debug, thiserror::Error)]
pub(crate) enum InstallError {
    /// The runtime could not be installed.
    #[error("failed to install {0}")]
    Runtime(String),
    /// The tool could not be installed.
    #[error("failed to install {0}")]
    Tool(String),
}

/// What a successful run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Report {
    /// The outcome of the runtime step.
    pub(crate) runtime: InstallOutcome,
    /// The outcome of the tool step.
    pub(crate) tool: InstallOutcome,
    /// The number of license notices written.
    pub(crate) licenses_written: usize,
}

/// The installer runs the post-install steps in order.
#[derive(Debug)]
pub(crate) struct Installer {
    licenses: Vec<LicenseRecord>,
    offline: bool,
    platform: PlatformInfo,
    runtime: Box<dyn Installable>,
    tool: Box<dyn Installable>,
}

impl Installer {
    /// Creates a new `Installer`.
    ///
    /// In offline mode failed steps are not retried and the components use cached artifacts only.
    pub(crate) fn new(platform: PlatformInfo, runtime: Box<dyn Installable>, tool: Box<dyn Installable>, licenses: Vec<LicenseRecord>, offline: bool) -> Self {
        Self {
            licenses,
            offline,
            platform,
            runtime,
            tool,
        }
    }

    /// Runs all steps.
    ///
    /// Stops at the first install step that could not be completed; the license notices are written only after both
    /// install steps succeeded and never cause a failure themselves.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn run(&self) -> Result<Report, InstallError> {
        if self.offline {
            info!("Running in offline mode. Using cached binaries if available.");
        }

        self.platform.validate();

        let runtime = self.provide(self.runtime.as_ref());
        if !runtime.succeeded {
            error!("Failed to install {} binaries. The AWS CDK wrapper may not work correctly.", self.runtime.name());
            return Err(InstallError::Runtime(self.runtime.name().to_string()));
        }

        let tool = self.provide(self.tool.as_ref());
        if !tool.succeeded {
            error!(
                "Failed to install {}. You can try installing it manually by running: {} --install",
                self.tool.name(),
                env!("CARGO_PKG_NAME")
            );
            return Err(InstallError::Tool(self.tool.name().to_string()));
        }

        let licenses_written = license::materialize(&self.licenses);
        debug!(licenses_written);

        Ok(Report {
            runtime,
            tool,
            licenses_written,
        })
    }

    /// Installs the tool again, whether or not it is present.
    pub(crate) fn reinstall_tool(&self) -> Result<InstallOutcome, InstallError> {
        let outcome = self.attempt(self.tool.as_ref());
        if outcome.succeeded {
            Ok(outcome)
        } else {
            error!("Failed to install {}.", self.tool.name());
            Err(InstallError::Tool(self.tool.name().to_string()))
        }
    }

    // Installs the component unless it is already present.
    #[doc(hidden)]
    fn provide(&self, component: &dyn Installable) -> InstallOutcome {
        if component.is_installed() {
            debug!(component = component.name(), "already installed");
            return InstallOutcome::satisfied();
        }

        info!("Installing {}...", component.name());
        self.attempt(component)
    }

    // Installs the component with retries.
    #[doc(hidden)]
    fn attempt(&self, component: &dyn Installable) -> InstallOutcome {
        let name = component.name();
        retry::retry(name, MAX_ATTEMPTS, !self.offline, || match component.install(self.offline) {
            Ok(()) => true,
            Err(err) => {
                warn!("Installing {name} failed: {err:#}");
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::layout::Layout;
    use anyhow::anyhow;
    use std::cell::Cell;
    use std::fs;
    use std::rc::Rc;
    use test_log::test;

    // A component that fails the given number of times before it succeeds.
    #[derive(Debug)]
    struct FakeComponent {
        name: &'static str,
        installed: Cell<bool>,
        failures: Cell<usize>,
        calls: Rc<Cell<usize>>,
    }

    impl FakeComponent {
        fn new(name: &'static str, installed: bool, failures: usize) -> (Box<Self>, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let component = Self {
                name,
                installed: Cell::new(installed),
                failures: Cell::new(failures),
                calls: calls.clone(),
            };
            (Box::new(component), calls)
        }
    }

    impl Installable for FakeComponent {
        fn name(&self) -> &str {
            self.name
        }

        fn is_installed(&self) -> bool {
            self.installed.get()
        }

        fn install(&self, _offline: bool) -> anyhow::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(anyhow!("network unreachable"));
            }
            self.installed.set(true);
            Ok(())
        }
    }

    const ALWAYS: usize = usize::MAX;

    fn installer(platform: PlatformInfo, runtime: Box<FakeComponent>, tool: Box<FakeComponent>, licenses: Vec<LicenseRecord>) -> Installer {
        Installer::new(platform, runtime, tool, licenses, false)
    }

    fn linux() -> PlatformInfo {
        PlatformInfo::from_names("linux", "x86_64")
    }

    #[test]
    fn unsupported_platform_still_installs() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", false, 0);
        let (tool, tool_calls) = FakeComponent::new("tool", false, 0);
        let platform = PlatformInfo::from_names("haiku", "sparc");

        let report = installer(platform, runtime, tool, vec![]).run().unwrap();
        assert_eq!(runtime_calls.get(), 1);
        assert_eq!(tool_calls.get(), 1);
        assert!(report.runtime.succeeded);
        assert!(report.tool.succeeded);
    }

    #[test]
    fn installed_runtime_is_not_downloaded() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", true, 0);
        let (tool, tool_calls) = FakeComponent::new("tool", false, 0);

        let report = installer(linux(), runtime, tool, vec![]).run().unwrap();
        assert_eq!(runtime_calls.get(), 0);
        assert_eq!(tool_calls.get(), 1);
        assert_eq!(report.runtime, InstallOutcome::satisfied());
    }

    #[test]
    fn offline_failure_is_not_retried() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", false, ALWAYS);
        let (tool, tool_calls) = FakeComponent::new("tool", false, 0);

        let result = Installer::new(linux(), runtime, tool, vec![], true).run();
        assert!(matches!(result, Err(InstallError::Runtime(_))));
        assert_eq!(runtime_calls.get(), 1);
        assert_eq!(tool_calls.get(), 0);
    }

    #[test]
    fn two_failures_then_success() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", false, 2);
        let (tool, _) = FakeComponent::new("tool", true, 0);

        let report = installer(linux(), runtime, tool, vec![]).run().unwrap();
        assert_eq!(runtime_calls.get(), 3);
        assert_eq!(report.runtime, InstallOutcome { attempts: 3, succeeded: true });
    }

    #[test]
    fn exhausted_runtime_skips_tool() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", false, ALWAYS);
        let (tool, tool_calls) = FakeComponent::new("tool", false, 0);

        let result = installer(linux(), runtime, tool, vec![]).run();
        assert!(matches!(result, Err(InstallError::Runtime(_))));
        assert_eq!(runtime_calls.get(), MAX_ATTEMPTS);
        assert_eq!(tool_calls.get(), 0);
    }

    #[test]
    fn exhausted_tool_fails() {
        let (runtime, _) = FakeComponent::new("runtime", true, 0);
        let (tool, tool_calls) = FakeComponent::new("tool", false, ALWAYS);
        let tempdir = tempfile::tempdir().unwrap();
        let layout = Layout::new(tempdir.path());

        let result = installer(linux(), runtime, tool, license::records(&layout)).run();
        assert!(matches!(result, Err(InstallError::Tool(_))));
        assert_eq!(tool_calls.get(), MAX_ATTEMPTS);
        // license notices are not written after a failure
        assert!(!layout.license_path("node").exists());
    }

    #[test]
    fn everything_present_writes_nothing() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", true, 0);
        let (tool, tool_calls) = FakeComponent::new("tool", true, 0);
        let tempdir = tempfile::tempdir().unwrap();
        let layout = Layout::new(tempdir.path());
        let records = license::records(&layout);
        for record in &records {
            fs::create_dir_all(record.target_path.parent().unwrap()).unwrap();
            fs::write(&record.target_path, "present").unwrap();
        }

        let report = installer(linux(), runtime, tool, records).run().unwrap();
        assert_eq!(runtime_calls.get(), 0);
        assert_eq!(tool_calls.get(), 0);
        assert_eq!(report.licenses_written, 0);
        assert_eq!(fs::read_to_string(layout.license_path("aws_cdk")).unwrap(), "present");
    }

    #[test]
    fn licenses_written_once() {
        let tempdir = tempfile::tempdir().unwrap();
        let layout = Layout::new(tempdir.path().join("fresh"));

        let (runtime, _) = FakeComponent::new("runtime", true, 0);
        let (tool, _) = FakeComponent::new("tool", true, 0);
        let report = installer(linux(), runtime, tool, license::records(&layout)).run().unwrap();
        assert_eq!(report.licenses_written, 2);
        assert_eq!(fs::read_to_string(layout.license_path("node")).unwrap(), license::NODE_LICENSE.trim());

        let (runtime, _) = FakeComponent::new("runtime", true, 0);
        let (tool, _) = FakeComponent::new("tool", true, 0);
        let report = installer(linux(), runtime, tool, license::records(&layout)).run().unwrap();
        assert_eq!(report.licenses_written, 0);
    }

    #[test]
    fn license_failure_is_not_fatal() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(tempdir.path().join("licenses"), "").unwrap();
        let layout = Layout::new(tempdir.path());

        let (runtime, _) = FakeComponent::new("runtime", true, 0);
        let (tool, _) = FakeComponent::new("tool", true, 0);
        let report = installer(linux(), runtime, tool, license::records(&layout)).run().unwrap();
        assert_eq!(report.licenses_written, 0);
    }

    #[test]
    fn reinstall_ignores_presence() {
        let (runtime, runtime_calls) = FakeComponent::new("runtime", true, 0);
        let (tool, tool_calls) = FakeComponent::new("tool", true, 1);

        let outcome = installer(linux(), runtime, tool, vec![]).reinstall_tool().unwrap();
        assert_eq!(runtime_calls.get(), 0);
        assert_eq!(tool_calls.get(), 2);
        assert_eq!(outcome.attempts, 2);
    }
}
