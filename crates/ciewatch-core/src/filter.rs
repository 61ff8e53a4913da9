//! Target filter: narrows extracted rows to the ones a target cares about.
//!
//! A record is a candidate when its office name and address contain the
//! configured substrings (case-sensitive, the portal uses upper-case office
//! names consistently) and its date text holds a `DD/MM/YYYY` date. Anything
//! else in the date column ("Non disponibile", dashes, empty cells) is a
//! placeholder and is dropped silently.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::AvailabilityRecord;

/// Default availability date format: two digits, two digits, four digits.
///
/// Format only. `32/13/2025` matches; calendar validity is not checked.
pub const DATE_PATTERN: &str = r"\b\d{2}/\d{2}/\d{4}\b";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE_PATTERN).expect("valid regex"));

/// Returns `true` if `text` contains a `DD/MM/YYYY` shaped date.
#[must_use]
pub fn is_well_formed_date(text: &str) -> bool {
    DATE_RE.is_match(text)
}

/// Immutable per-run matching rules for one target.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub office_name_substring: String,
    pub office_address_substring: String,
    date_pattern: Regex,
}

impl FilterCriteria {
    #[must_use]
    pub fn new(office_name_substring: &str, office_address_substring: &str) -> Self {
        Self {
            office_name_substring: office_name_substring.to_string(),
            office_address_substring: office_address_substring.to_string(),
            date_pattern: DATE_RE.clone(),
        }
    }

    /// Use a custom date pattern instead of [`DATE_PATTERN`].
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if `pattern` does not compile.
    pub fn with_date_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.date_pattern = Regex::new(pattern)?;
        Ok(self)
    }

    #[must_use]
    pub fn date_pattern(&self) -> &str {
        self.date_pattern.as_str()
    }

    #[must_use]
    pub fn matches(&self, record: &AvailabilityRecord) -> bool {
        record.office_name.contains(&self.office_name_substring)
            && record
                .office_address
                .contains(&self.office_address_substring)
            && self.date_pattern.is_match(&record.date_text)
    }
}

/// All candidates in source order.
#[must_use]
pub fn filter_candidates<'a>(
    records: &'a [AvailabilityRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a AvailabilityRecord> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

/// The first candidate in source order (single-target mode).
#[must_use]
pub fn first_candidate<'a>(
    records: &'a [AvailabilityRecord],
    criteria: &FilterCriteria,
) -> Option<&'a AvailabilityRecord> {
    records.iter().find(|r| criteria.matches(r))
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
