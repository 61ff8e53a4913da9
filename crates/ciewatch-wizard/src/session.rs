//! One wizard session: open a page, navigate, extract, close.

use ciewatch_core::AvailabilityRecord;

use crate::error::WizardError;
use crate::extract::{extract, ColumnLayout};
use crate::navigator::{FormNavigator, NavigationOutcome, NavigatorConfig};
use crate::page::{PageLauncher, WizardPage};

/// Check the wizard for availability right now.
///
/// Opens a fresh page, drives the wizard, extracts the availability rows and
/// closes the page on every path. An empty result means the portal showed
/// no availability table; this is the common case, not an error.
///
/// # Errors
///
/// - [`WizardError::Launch`] if no page could be opened.
/// - [`WizardError::NavigationTimeout`] / [`WizardError::StepFailed`] if the
///   wizard could not be driven to its last step.
/// - [`WizardError::MalformedResponse`] if a captured response is not JSON.
pub async fn check_availability<L: PageLauncher>(
    launcher: &L,
    config: &NavigatorConfig,
    layout: &ColumnLayout,
) -> Result<Vec<AvailabilityRecord>, WizardError> {
    let mut page = launcher.launch().await.map_err(WizardError::Launch)?;

    let result = navigate_and_extract(&mut page, config, layout).await;

    if let Err(e) = page.close().await {
        tracing::warn!(error = %e, "failed to close wizard page");
    }
    result
}

async fn navigate_and_extract<P: WizardPage>(
    page: &mut P,
    config: &NavigatorConfig,
    layout: &ColumnLayout,
) -> Result<Vec<AvailabilityRecord>, WizardError> {
    let mut navigator = FormNavigator::new(page, config);
    match navigator.run().await? {
        NavigationOutcome::Loaded(rendered) => {
            let records = extract(&rendered, layout)?;
            tracing::debug!(records = records.len(), "availability extracted");
            Ok(records)
        }
        NavigationOutcome::Empty => Ok(vec![]),
    }
}
