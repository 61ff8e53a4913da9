use std::time::Duration;

use thiserror::Error;

use crate::navigator::WizardStep;

/// Failures reported by a [`WizardPage`](crate::page::WizardPage) implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A bounded wait expired.
    #[error("timed out after {}ms waiting for {what}", after.as_millis())]
    Timeout { what: String, after: Duration },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// Page-side script evaluation failed or returned an unexpected value.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// The browser process or DevTools connection failed.
    #[error("browser error: {0}")]
    Browser(String),
}

impl DriverError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Errors that abort one wizard cycle.
///
/// "No availability marker appeared" is not represented here; the navigator
/// reports it as [`NavigationOutcome::Empty`](crate::navigator::NavigationOutcome::Empty).
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("could not open a browser session: {0}")]
    Launch(#[source] DriverError),

    #[error("navigation timed out in the {step} step: {source}")]
    NavigationTimeout {
        step: WizardStep,
        #[source]
        source: DriverError,
    },

    #[error("{step} step failed: {source}")]
    StepFailed {
        step: WizardStep,
        #[source]
        source: DriverError,
    },

    /// The captured availability response is not JSON at all.
    #[error("availability response is not valid JSON: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
}

impl WizardError {
    /// Classify a driver failure raised while running `step`.
    #[must_use]
    pub fn from_driver(step: WizardStep, source: DriverError) -> Self {
        if source.is_timeout() {
            WizardError::NavigationTimeout { step, source }
        } else {
            WizardError::StepFailed { step, source }
        }
    }

    /// The wizard step that failed, if the failure happened mid-navigation.
    #[must_use]
    pub fn step(&self) -> Option<WizardStep> {
        match self {
            WizardError::NavigationTimeout { step, .. } | WizardError::StepFailed { step, .. } => {
                Some(*step)
            }
            WizardError::Launch(_) | WizardError::MalformedResponse { .. } => None,
        }
    }

    /// Returns `true` for navigation timeouts, which the next cycle retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, WizardError::NavigationTimeout { .. })
    }
}
