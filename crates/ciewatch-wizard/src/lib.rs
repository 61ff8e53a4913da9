//! Browser side of the watcher: drives the appointment wizard to its
//! availability step and turns what it renders into [`AvailabilityRecord`]s.
//!
//! [`AvailabilityRecord`]: ciewatch_core::AvailabilityRecord

pub mod chrome;
pub mod error;
pub mod extract;
pub mod navigator;
pub mod page;
#[cfg(any(test, feature = "scripted"))]
pub mod scripted;
pub mod selectors;
pub mod session;

pub use chrome::{ChromeLauncher, ChromePage};
pub use error::{DriverError, WizardError};
pub use extract::{extract, extract_response_body, extract_table_rows, ColumnLayout};
pub use navigator::{
    FormInputs, FormNavigator, NavigationOutcome, NavigationState, NavigatorConfig,
    RenderedAvailability, WizardStep,
};
pub use page::{PageLauncher, RowCells, WizardPage};
pub use session::check_availability;
