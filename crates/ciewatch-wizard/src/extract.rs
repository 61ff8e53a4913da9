//! Availability extractor: turns the final page state into typed records.
//!
//! Table rows are mapped through a [`ColumnLayout`]; rows too short for the
//! layout are skipped. Response bodies are read by field name, so they do
//! not depend on how the table is laid out.

use ciewatch_core::AvailabilityRecord;
use serde_json::Value;

use crate::error::WizardError;
use crate::navigator::RenderedAvailability;
use crate::page::RowCells;

/// Keys under which the availability array may be wrapped in the response.
const RESPONSE_ARRAY_KEYS: &[&str] = &["data", "sedi", "results", "items", "disponibilita"];
const OFFICE_NAME_FIELDS: &[&str] = &["officeName", "sede", "nomeSede", "descrizione", "name"];
const OFFICE_ADDRESS_FIELDS: &[&str] = &["officeAddress", "indirizzo", "address"];
const AVAILABILITY_FIELDS: &[&str] = &[
    "availabilityText",
    "primaDisponibilita",
    "dataDisponibilita",
    "disponibilita",
    "date",
];

/// Positions of the named fields among a row's cells.
///
/// The default matches the portal's table: the office name in the row
/// header, the address in the first data cell, the first available date in
/// the third data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub office_name: usize,
    pub office_address: usize,
    pub date: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            office_name: 0,
            office_address: 1,
            date: 3,
        }
    }
}

impl ColumnLayout {
    /// Minimum number of cells a row needs for this layout.
    #[must_use]
    pub fn min_cells(&self) -> usize {
        self.office_name.max(self.office_address).max(self.date) + 1
    }
}

/// Extract records from whatever the navigator captured.
///
/// # Errors
///
/// Returns [`WizardError::MalformedResponse`] if a captured response body is
/// not JSON. Individual rows or objects of the wrong shape are skipped.
pub fn extract(
    rendered: &RenderedAvailability,
    layout: &ColumnLayout,
) -> Result<Vec<AvailabilityRecord>, WizardError> {
    match rendered {
        RenderedAvailability::Table(rows) => Ok(extract_table_rows(rows, layout)),
        RenderedAvailability::Response(body) => extract_response_body(body),
    }
}

/// Map table rows onto records, skipping rows with too few cells.
#[must_use]
pub fn extract_table_rows(rows: &[RowCells], layout: &ColumnLayout) -> Vec<AvailabilityRecord> {
    let needed = layout.min_cells();
    let mut skipped = 0usize;

    let records: Vec<AvailabilityRecord> = rows
        .iter()
        .filter_map(|row| {
            let cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
            if cells.len() < needed {
                skipped += 1;
                tracing::debug!(cells = cells.len(), needed, "skipping short availability row");
                return None;
            }
            Some(
                AvailabilityRecord::new(
                    cells[layout.office_name].clone(),
                    cells[layout.office_address].clone(),
                    cells[layout.date].clone(),
                )
                .with_raw_cells(cells),
            )
        })
        .collect();

    if skipped > 0 && records.is_empty() {
        tracing::warn!(
            skipped,
            needed,
            "no availability row matched the column layout; the table markup may have changed"
        );
    }
    records
}

/// Parse an availability response body.
///
/// Accepts a top-level array of office objects, or an object wrapping that
/// array under one of a few common keys. Objects lacking any of the three
/// fields are skipped.
///
/// # Errors
///
/// Returns [`WizardError::MalformedResponse`] if `body` is not JSON.
pub fn extract_response_body(body: &str) -> Result<Vec<AvailabilityRecord>, WizardError> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| WizardError::MalformedResponse { source })?;

    let Some(offices) = find_office_array(&value) else {
        tracing::warn!("availability response holds no office array");
        return Ok(vec![]);
    };

    let records = offices
        .iter()
        .filter_map(|office| {
            let record = AvailabilityRecord::new(
                text_field(office, OFFICE_NAME_FIELDS)?,
                text_field(office, OFFICE_ADDRESS_FIELDS)?,
                text_field(office, AVAILABILITY_FIELDS)?,
            );
            if record.office_name.is_empty() {
                return None;
            }
            Some(record)
        })
        .collect::<Vec<_>>();

    if records.len() < offices.len() {
        tracing::debug!(
            total = offices.len(),
            usable = records.len(),
            "skipped availability objects missing fields"
        );
    }
    Ok(records)
}

fn find_office_array(value: &Value) -> Option<&Vec<Value>> {
    if let Some(array) = value.as_array() {
        return Some(array);
    }
    RESPONSE_ARRAY_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
}

/// First of `names` present on `object`, as text. Numbers are rendered;
/// `null` counts as an empty string so a missing date still yields a row.
fn text_field(object: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match object.get(*name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
