//! Dedup watcher state.
//!
//! Only the last notified date per target key is remembered. A candidate is
//! new when its date text differs from that value (or nothing is stored yet).
//! A cycle without candidates leaves the stored value alone, so a slot that
//! disappears and comes back with the same date does not notify twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app_config::SelectionMode;
use crate::filter::{filter_candidates, first_candidate};
use crate::record::AvailabilityRecord;
use crate::targets::Target;

/// A candidate that differs from what was last notified for its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub target_key: String,
    pub record: AvailabilityRecord,
}

/// Last notified date text per target key.
///
/// Owned by the poll loop and threaded through each cycle by `&mut`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatcherState {
    last_seen: BTreeMap<String, String>,
}

impl WatcherState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_seen(&self, key: &str) -> Option<&str> {
        self.last_seen.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.last_seen
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Record a sighting for `key`. Returns the event to notify when the
    /// date differs from the stored one, and stores the new date.
    pub fn observe(&mut self, key: &str, record: &AvailabilityRecord) -> Option<NewSlot> {
        let date = record.date_text.trim();
        if self.last_seen(key) == Some(date) {
            return None;
        }
        self.last_seen.insert(key.to_string(), date.to_string());
        Some(NewSlot {
            target_key: key.to_string(),
            record: record.clone(),
        })
    }
}

impl FromIterator<(String, String)> for WatcherState {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            last_seen: iter.into_iter().collect(),
        }
    }
}

/// Run the filter and dedup steps for every target.
///
/// In [`SelectionMode::First`] each target contributes at most its first
/// candidate, tracked under the target key. In [`SelectionMode::All`] every
/// candidate is tracked under `"{key}/{office_name}"` so offices sharing a
/// target do not overwrite each other's memory.
pub fn detect_new_slots(
    state: &mut WatcherState,
    targets: &[Target],
    records: &[AvailabilityRecord],
    mode: SelectionMode,
) -> Vec<NewSlot> {
    let mut events = Vec::new();
    for target in targets {
        let criteria = target.criteria();
        match mode {
            SelectionMode::First => {
                if let Some(record) = first_candidate(records, &criteria) {
                    events.extend(state.observe(&target.key, record));
                }
            }
            SelectionMode::All => {
                for record in filter_candidates(records, &criteria) {
                    let key = format!("{}/{}", target.key, record.office_name);
                    events.extend(state.observe(&key, record));
                }
            }
        }
    }
    events
}

#[cfg(test)]
#[path = "watcher_test.rs"]
mod tests;
