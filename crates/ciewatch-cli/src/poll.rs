//! Poll loop: one cycle at a time, jittered sleeps in between, every cycle
//! failure contained.

use std::time::{Duration, Instant};

use ciewatch_core::{AppConfig, WatcherState};
use ciewatch_notify::{format_error, format_new_slots, notify_best_effort, Notifier};
use ciewatch_wizard::PageLauncher;
use tokio::sync::watch;

use crate::cycle::CycleRunner;
use crate::state_file::StateFile;

#[derive(Debug, Clone)]
pub(crate) struct PollSettings {
    pub interval: Duration,
    pub jitter: Duration,
    pub notify_errors: bool,
    /// Stop after this many cycles; `None` runs until shutdown.
    pub max_cycles: Option<u64>,
}

impl PollSettings {
    pub(crate) fn from_app_config(config: &AppConfig, max_cycles: Option<u64>) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            jitter: Duration::from_secs(config.poll_jitter_secs),
            notify_errors: config.notify_errors,
            max_cycles,
        }
    }
}

/// `base` plus a uniform random extra in `[0, jitter]`.
pub(crate) fn next_delay(base: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return base;
    }
    let max_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
    base.saturating_add(Duration::from_millis(rand::random_range(0..=max_ms)))
}

/// Run cycles until `shutdown` flips to `true` or the cycle limit is hit.
///
/// Shutdown is only honoured between cycles so an open session is always
/// closed. Returns the number of cycles run.
pub(crate) async fn watch<L: PageLauncher>(
    runner: &CycleRunner<'_, L>,
    notifier: &dyn Notifier,
    store: Option<&StateFile>,
    settings: &PollSettings,
    state: &mut WatcherState,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut cycle = 0u64;
    loop {
        cycle += 1;
        run_one(runner, notifier, store, settings.notify_errors, state, cycle).await;

        if settings.max_cycles.is_some_and(|max| cycle >= max) {
            tracing::info!(cycle, "cycle limit reached");
            break;
        }
        if *shutdown.borrow() {
            break;
        }

        let delay = next_delay(settings.interval, settings.jitter);
        tracing::debug!(cycle, delay_secs = delay.as_secs(), "sleeping until next cycle");
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        tokio::select! {
            () = &mut sleep => {}
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => break,
                // Sender gone: nobody can ask us to stop, finish the sleep.
                _ => sleep.await,
            },
        }
    }
    cycle
}

async fn run_one<L: PageLauncher>(
    runner: &CycleRunner<'_, L>,
    notifier: &dyn Notifier,
    store: Option<&StateFile>,
    notify_errors: bool,
    state: &mut WatcherState,
    cycle: u64,
) {
    let started = Instant::now();
    match runner.run_cycle(state).await {
        Ok(report) => {
            #[allow(clippy::cast_possible_truncation)]
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(
                cycle,
                records = report.records,
                new_slots = report.new_slots.len(),
                elapsed_ms,
                "cycle complete"
            );
            for slot in &report.new_slots {
                tracing::info!(
                    target_key = %slot.target_key,
                    office = %slot.record.office_name,
                    date = %slot.record.date_text,
                    "new slot"
                );
            }
            let Some(text) = format_new_slots(&report.new_slots) else {
                return;
            };
            notify_best_effort(notifier, &text).await;
            if let Some(store) = store {
                if let Err(e) = store.save(state) {
                    tracing::warn!(path = %store.path().display(), error = %e, "failed to persist watcher state");
                }
            }
        }
        Err(e) => {
            if e.is_transient() {
                tracing::warn!(cycle, step = ?e.step(), error = %e, "cycle failed; retrying next cycle");
            } else {
                tracing::error!(cycle, step = ?e.step(), error = %e, "cycle failed");
            }
            if notify_errors {
                notify_best_effort(notifier, &format_error(&e)).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_test.rs"]
mod tests;
