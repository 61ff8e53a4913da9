use serde::{Deserialize, Serialize};

/// One office row read from the final wizard page.
///
/// Built once per cycle by the extractor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub office_name: String,
    pub office_address: String,
    /// Availability text as rendered, e.g. `15/03/2025` or `Non disponibile`.
    pub date_text: String,
    /// Trimmed cell texts of the source row, in source order.
    pub raw_cells: Vec<String>,
}

impl AvailabilityRecord {
    #[must_use]
    pub fn new(
        office_name: impl Into<String>,
        office_address: impl Into<String>,
        date_text: impl Into<String>,
    ) -> Self {
        let office_name = office_name.into().trim().to_string();
        let office_address = office_address.into().trim().to_string();
        let date_text = date_text.into().trim().to_string();
        let raw_cells = vec![
            office_name.clone(),
            office_address.clone(),
            date_text.clone(),
        ];
        Self {
            office_name,
            office_address,
            date_text,
            raw_cells,
        }
    }

    /// Replace the raw cells with the cells of the originating row.
    #[must_use]
    pub fn with_raw_cells(mut self, cells: Vec<String>) -> Self {
        self.raw_cells = cells;
        self
    }
}
