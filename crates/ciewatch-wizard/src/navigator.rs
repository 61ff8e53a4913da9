//! Form navigator: drives the three wizard steps against a [`WizardPage`].
//!
//! States only move forward:
//!
//! ```text
//! Initial -> IdentitySubmitted -> LocationSubmitted -> AvailabilityLoaded
//!    \               \                    \
//!     +---------------+--------------------+--> Failed
//! ```
//!
//! A missing availability marker after the last submit is the ordinary
//! "nothing bookable" answer and is returned as [`NavigationOutcome::Empty`].
//! Every other failure is a [`WizardError`] tagged with the step it happened in.

use std::future::Future;
use std::time::Duration;

use ciewatch_core::{AppConfig, ExtractionMode};

use crate::error::{DriverError, WizardError};
use crate::page::{RowCells, WizardPage};
use crate::selectors;

/// Extra slack on top of a driver-side wait before the navigator gives up on
/// the call itself.
const OUTER_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Identity,
    Location,
    Availability,
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardStep::Identity => write!(f, "identity"),
            WizardStep::Location => write!(f, "location"),
            WizardStep::Availability => write!(f, "availability"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Initial,
    IdentitySubmitted,
    LocationSubmitted,
    AvailabilityLoaded,
    Failed,
}

impl NavigationState {
    fn rank(self) -> u8 {
        match self {
            NavigationState::Initial => 0,
            NavigationState::IdentitySubmitted => 1,
            NavigationState::LocationSubmitted => 2,
            NavigationState::AvailabilityLoaded | NavigationState::Failed => 3,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NavigationState::AvailabilityLoaded | NavigationState::Failed
        )
    }
}

/// Fixed placeholder values typed into the wizard. They identify nobody; the check
/// never books anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInputs {
    /// Value of the document-type option (`1` = first issue).
    pub document_type: String,
    pub first_name: String,
    pub last_name: String,
    pub fiscal_code: String,
    /// Comune typed into the location type-ahead.
    pub location: String,
}

impl Default for FormInputs {
    fn default() -> Self {
        Self {
            document_type: "1".to_string(),
            first_name: "Mario".to_string(),
            last_name: "Rossi".to_string(),
            fiscal_code: "RSSMRA80A01H501X".to_string(),
            location: "ROMA".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    pub start_url: String,
    pub inputs: FormInputs,
    /// Bound for every wait except the final availability wait.
    pub step_timeout: Duration,
    /// Bound for the availability marker / response wait.
    pub availability_timeout: Duration,
    pub typing_delay: Duration,
    pub extraction_mode: ExtractionMode,
    /// URL fragment identifying the availability response.
    pub availability_endpoint: String,
}

impl NavigatorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            start_url: config.start_url.clone(),
            inputs: FormInputs {
                location: config.location.clone(),
                ..FormInputs::default()
            },
            step_timeout: Duration::from_secs(config.step_timeout_secs),
            availability_timeout: Duration::from_secs(config.availability_timeout_secs),
            typing_delay: Duration::from_millis(config.typing_delay_ms),
            extraction_mode: config.extraction_mode,
            availability_endpoint: config.availability_endpoint.clone(),
        }
    }
}

/// What the final page holds once availability has loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedAvailability {
    Table(Vec<RowCells>),
    Response(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Loaded(RenderedAvailability),
    /// No availability marker appeared within the bound.
    Empty,
}

/// Single-use driver for one page.
pub struct FormNavigator<'a, P: WizardPage> {
    page: &'a mut P,
    config: &'a NavigatorConfig,
    state: NavigationState,
}

impl<'a, P: WizardPage> FormNavigator<'a, P> {
    pub fn new(page: &'a mut P, config: &'a NavigatorConfig) -> Self {
        Self {
            page,
            config,
            state: NavigationState::Initial,
        }
    }

    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// Drive the wizard from the start page to the availability step.
    ///
    /// # Errors
    ///
    /// - [`WizardError::NavigationTimeout`] when a bounded wait before the
    ///   final step expires.
    /// - [`WizardError::StepFailed`] for any other driver failure, including
    ///   a second call on the same navigator.
    pub async fn run(&mut self) -> Result<NavigationOutcome, WizardError> {
        if self.state != NavigationState::Initial {
            return Err(WizardError::StepFailed {
                step: WizardStep::Identity,
                source: DriverError::Browser(format!(
                    "navigator already ran (state {:?})",
                    self.state
                )),
            });
        }

        let result = self.drive().await;
        match &result {
            Ok(NavigationOutcome::Loaded(_)) => {}
            Ok(NavigationOutcome::Empty) => self.fail(),
            Err(e) => {
                tracing::debug!(error = %e, state = ?self.state, "wizard navigation failed");
                self.fail();
            }
        }
        result
    }

    async fn drive(&mut self) -> Result<NavigationOutcome, WizardError> {
        self.submit_identity()
            .await
            .map_err(|e| WizardError::from_driver(WizardStep::Identity, e))?;
        self.advance(NavigationState::IdentitySubmitted);

        self.submit_location()
            .await
            .map_err(|e| WizardError::from_driver(WizardStep::Location, e))?;
        self.advance(NavigationState::LocationSubmitted);

        match self.await_availability().await {
            Ok(rendered) => {
                self.advance(NavigationState::AvailabilityLoaded);
                Ok(NavigationOutcome::Loaded(rendered))
            }
            Err(AvailabilityWait::NoMarker(e)) => {
                tracing::info!(reason = %e, "no availability marker found");
                Ok(NavigationOutcome::Empty)
            }
            Err(AvailabilityWait::Failed(e)) => {
                Err(WizardError::from_driver(WizardStep::Availability, e))
            }
        }
    }

    async fn submit_identity(&mut self) -> Result<(), DriverError> {
        let config = self.config;
        let inputs = &config.inputs;
        let t = config.step_timeout;
        tracing::debug!(step = %WizardStep::Identity, url = %config.start_url, "opening wizard");

        bounded(
            t.saturating_add(OUTER_GRACE),
            "wizard start page",
            self.page.goto(&config.start_url, t),
        )
        .await?;
        bounded(
            t.saturating_add(OUTER_GRACE),
            selectors::IDENTITY_FORM,
            self.page.wait_for_selector(selectors::IDENTITY_FORM, t),
        )
        .await?;

        // The document-type select is hidden behind a styled widget; assign
        // the value and fire the events the page listens to.
        let fields = [
            (selectors::IDENTITY_FORM, &inputs.document_type),
            (selectors::FIRST_NAME, &inputs.first_name),
            (selectors::LAST_NAME, &inputs.last_name),
            (selectors::FISCAL_CODE, &inputs.fiscal_code),
        ];
        for (selector, value) in fields {
            bounded(t, selector, self.page.set_value(selector, value)).await?;
        }

        self.force_submit().await
    }

    async fn submit_location(&mut self) -> Result<(), DriverError> {
        let config = self.config;
        let location = &config.inputs.location;
        let t = config.step_timeout;
        tracing::debug!(step = %WizardStep::Location, location = %location, "choosing location");

        bounded(
            t.saturating_add(OUTER_GRACE),
            "location step route",
            self.page.wait_for_url(selectors::LOCATION_ROUTE, t),
        )
        .await?;
        bounded(t, selectors::OVERLAYS, self.page.remove_elements(selectors::OVERLAYS)).await?;

        if config.extraction_mode == ExtractionMode::Response {
            bounded(
                t,
                "response capture",
                self.page.capture_responses(&config.availability_endpoint),
            )
            .await?;
        }

        let keystrokes = u32::try_from(location.chars().count()).unwrap_or(u32::MAX);
        let typing_bound = t.saturating_add(config.typing_delay.saturating_mul(keystrokes));
        bounded(
            typing_bound,
            selectors::LOCATION_INPUT,
            self.page
                .type_slowly(selectors::LOCATION_INPUT, location, config.typing_delay),
        )
        .await?;
        bounded(
            t.saturating_add(OUTER_GRACE),
            "location suggestion",
            self.page
                .click_with_text(selectors::LOCATION_SUGGESTION, location, t),
        )
        .await?;

        self.force_submit().await
    }

    /// Clear client-side validation on the submit button and press it.
    async fn force_submit(&mut self) -> Result<(), DriverError> {
        let t = self.config.step_timeout;
        bounded(
            t,
            selectors::SUBMIT,
            self.page.remove_attribute(selectors::SUBMIT, "disabled"),
        )
        .await?;
        bounded(
            t.saturating_add(OUTER_GRACE),
            selectors::SUBMIT,
            self.page.click(selectors::SUBMIT, t),
        )
        .await
    }

    async fn await_availability(&mut self) -> Result<RenderedAvailability, AvailabilityWait> {
        let config = self.config;
        let t = config.availability_timeout;
        tracing::debug!(
            step = %WizardStep::Availability,
            mode = %config.extraction_mode,
            "waiting for availability"
        );

        match config.extraction_mode {
            ExtractionMode::Dom => {
                bounded(
                    t.saturating_add(OUTER_GRACE),
                    selectors::OFFICE_ROW_MARKER,
                    self.page.wait_for_selector(selectors::OFFICE_ROW_MARKER, t),
                )
                .await
                .map_err(AvailabilityWait::classify)?;
                let rows = bounded(
                    config.step_timeout,
                    "availability rows",
                    self.page.row_cells(selectors::OFFICE_ROW_MARKER),
                )
                .await
                .map_err(AvailabilityWait::Failed)?;
                Ok(RenderedAvailability::Table(rows))
            }
            ExtractionMode::Response => {
                let body = bounded(
                    t.saturating_add(OUTER_GRACE),
                    "availability response",
                    self.page.wait_for_response(t),
                )
                .await
                .map_err(AvailabilityWait::classify)?;
                Ok(RenderedAvailability::Response(body))
            }
        }
    }

    fn advance(&mut self, next: NavigationState) {
        debug_assert!(
            next.rank() > self.state.rank(),
            "wizard state must move forward: {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(from = ?self.state, to = ?next, "wizard state");
        self.state = next;
    }

    fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = NavigationState::Failed;
        }
    }
}

enum AvailabilityWait {
    NoMarker(DriverError),
    Failed(DriverError),
}

impl AvailabilityWait {
    fn classify(e: DriverError) -> Self {
        if e.is_timeout() {
            AvailabilityWait::NoMarker(e)
        } else {
            AvailabilityWait::Failed(e)
        }
    }
}

/// Run `fut`, turning an elapsed `limit` into [`DriverError::Timeout`].
async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| {
            Err(DriverError::Timeout {
                what: what.to_string(),
                after: limit,
            })
        })
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
