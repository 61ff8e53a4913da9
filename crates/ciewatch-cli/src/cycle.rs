//! One watch cycle: open a session, extract, filter, dedup.

use ciewatch_core::{
    detect_new_slots, filter_candidates, AppConfig, AvailabilityRecord, NewSlot, SelectionMode,
    Target, WatcherState,
};
use ciewatch_wizard::{check_availability, ColumnLayout, NavigatorConfig, PageLauncher, WizardError};

/// What a successful cycle saw.
#[derive(Debug)]
pub(crate) struct CycleReport {
    pub records: usize,
    pub new_slots: Vec<NewSlot>,
}

/// Everything a cycle needs besides the watcher state, which the caller owns.
pub(crate) struct CycleRunner<'a, L: PageLauncher> {
    launcher: &'a L,
    navigator: NavigatorConfig,
    layout: ColumnLayout,
    targets: Vec<Target>,
    selection: SelectionMode,
}

impl<'a, L: PageLauncher> CycleRunner<'a, L> {
    pub(crate) fn new(launcher: &'a L, config: &AppConfig) -> Self {
        Self {
            launcher,
            navigator: NavigatorConfig::from_app_config(config),
            layout: ColumnLayout::default(),
            targets: config.targets.clone(),
            selection: config.selection,
        }
    }

    /// Run one session and record new slots in `state`.
    ///
    /// The session is closed before this returns, on every path.
    pub(crate) async fn run_cycle(
        &self,
        state: &mut WatcherState,
    ) -> Result<CycleReport, WizardError> {
        let records = self.fetch().await?;
        let new_slots = detect_new_slots(state, &self.targets, &records, self.selection);
        Ok(CycleReport {
            records: records.len(),
            new_slots,
        })
    }

    /// Run one session and return every candidate per target, without
    /// consulting or updating any watcher state.
    pub(crate) async fn candidates(
        &self,
    ) -> Result<Vec<(Target, Vec<AvailabilityRecord>)>, WizardError> {
        let records = self.fetch().await?;
        Ok(self
            .targets
            .iter()
            .map(|target| {
                let matched = filter_candidates(&records, &target.criteria())
                    .into_iter()
                    .cloned()
                    .collect();
                (target.clone(), matched)
            })
            .collect())
    }

    async fn fetch(&self) -> Result<Vec<AvailabilityRecord>, WizardError> {
        check_availability(self.launcher, &self.navigator, &self.layout).await
    }
}

#[cfg(test)]
#[path = "cycle_test.rs"]
mod tests;
