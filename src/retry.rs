//! Retry.
//!
//! This module contains the bounded retry runner shared by the install steps.

use tracing::{info, trace};

/// Maximum number of attempts per install step.
pub(crate) const MAX_ATTEMPTS: usize = 3;

/// The outcome of an install step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct InstallOutcome {
    /// How often the install action has been invoked.
    pub(crate) attempts: usize,
    /// Whether the component is present after the step.
    pub(crate) succeeded: bool,
}

impl InstallOutcome {
    /// The outcome of a step that was skipped because the component was already present.
    pub(crate) fn satisfied() -> Self {
        Self { attempts: 0, succeeded: true }
    }

    /// Whether the install action has been invoked at all.
    pub(crate) fn attempted(&self) -> bool {
        self.attempts > 0
    }
}

/// Runs `action` until it succeeds, at most `max_attempts` times.
///
/// The first attempt always runs. If `allow_retry` is false, the loop ends after the first attempt, whatever its
/// result.
pub(crate) fn retry<F>(label: &str, max_attempts: usize, allow_retry: bool, mut action: F) -> InstallOutcome
where
    F: FnMut() -> bool,
{
    let mut outcome = InstallOutcome::default();

    for attempt in 1..=max_attempts.max(1) {
        if attempt > 1 {
            info!("Retrying {label} installation (attempt {attempt}/{max_attempts})...");
        }

        outcome.attempts = attempt;
        if action() {
            outcome.succeeded = true;
            break;
        }

        // don't retry in offline mode
        if !allow_retry {
            trace!(label, "offline, no retry");
            break;
        }
    }

    outcome
}
