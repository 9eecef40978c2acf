// ── Polling coordinator ──
//
// Keeps the sensor table consistent with the remote directory tree and
// task queues. Each cycle runs Idle -> Fetching -> Publishing: results are
// collected first, then applied without awaiting, so a cancelled cycle
// publishes nothing. A tick that fires while a cycle is in flight is
// skipped outright, never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use openlist_api::{Error, ListQuery, OpenListClient, TaskType};
use strum::IntoEnumIterator;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::{SensorStore, TaskCounts};

/// Single-entry guard enforcing the non-overlap rule.
///
/// `try_enter` hands out at most one pass at a time; dropping the pass
/// (normally or by future cancellation) reopens the gate.
#[derive(Default)]
pub(crate) struct CycleGate(AtomicBool);

pub(crate) struct CyclePass<'a>(&'a AtomicBool);

impl CycleGate {
    pub(crate) fn try_enter(&self) -> Option<CyclePass<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()
            .map(|_| CyclePass(&self.0))
    }
}

impl Drop for CyclePass<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The polling coordinator: sole writer of the sensor table.
pub struct Poller {
    client: Arc<OpenListClient>,
    store: Arc<SensorStore>,
    track_dirs: Vec<String>,
    dir_gate: CycleGate,
    task_gate: CycleGate,
}

impl Poller {
    pub fn new(
        client: Arc<OpenListClient>,
        store: Arc<SensorStore>,
        track_dirs: Vec<String>,
    ) -> Self {
        Self {
            client,
            store,
            track_dirs,
            dir_gate: CycleGate::default(),
            task_gate: CycleGate::default(),
        }
    }

    /// One directory poll cycle.
    ///
    /// Fetches every tracked directory's listing, then publishes all
    /// results. A failing directory flips its own sensor unavailable
    /// (keeping the last value) and never blocks the others.
    pub async fn poll_directories_once(&self) {
        let Some(_pass) = self.dir_gate.try_enter() else {
            debug!("directory poll still in flight -- skipping tick");
            return;
        };

        // Fetching
        let mut results: Vec<(&str, Result<i64, Error>)> =
            Vec::with_capacity(self.track_dirs.len());
        for dir in &self.track_dirs {
            let fetched = self
                .client
                .list_files(dir, &ListQuery::default())
                .await
                .map(|listing| listing.entries().len() as i64);
            results.push((dir.as_str(), fetched));
        }

        // Publishing -- no awaits past this point, so cancellation during
        // Fetching leaves the table untouched.
        for (dir, result) in results {
            match result {
                Ok(count) => self.store.publish_dir_count(dir, count),
                Err(e) => {
                    warn!(dir, error = %e, "directory poll failed");
                    self.store.mark_dir_unavailable(dir);
                }
            }
        }
    }

    /// One task poll cycle across every task type.
    ///
    /// The three counts of a task type publish together or not at all: if
    /// either sub-call fails, that type's sensors go unavailable for this
    /// cycle and keep their last values.
    pub async fn poll_tasks_once(&self) {
        let Some(_pass) = self.task_gate.try_enter() else {
            debug!("task poll still in flight -- skipping tick");
            return;
        };

        // Fetching
        let mut results: Vec<(TaskType, Result<TaskCounts, Error>)> = Vec::new();
        for task_type in TaskType::iter() {
            results.push((task_type, self.fetch_task_counts(task_type).await));
        }

        // Publishing
        for (task_type, result) in results {
            match result {
                Ok(counts) => self.store.publish_task_counts(task_type, counts),
                Err(e) => {
                    warn!(%task_type, error = %e, "task poll failed");
                    self.store.mark_task_unavailable(task_type);
                }
            }
        }
    }

    async fn fetch_task_counts(&self, task_type: TaskType) -> Result<TaskCounts, Error> {
        let done = self.client.get_task_done(task_type).await?;
        let undone = self.client.get_task_undone(task_type).await?;
        Ok(TaskCounts::derive(&done, &undone))
    }
}

// ── Background loops ─────────────────────────────────────────────────

/// Periodically poll the tracked directories until cancelled.
pub(crate) async fn dir_poll_loop(
    poller: Arc<Poller>,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    // Cancelling mid-cycle abandons the in-flight fetches;
                    // nothing publishes.
                    () = cancel.cancelled() => break,
                    () = poller.poll_directories_once() => {}
                }
            }
        }
    }
}

/// Periodically poll the task queues until cancelled.
pub(crate) async fn task_poll_loop(
    poller: Arc<Poller>,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = poller.poll_tasks_once() => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_admits_one_pass_at_a_time() {
        let gate = CycleGate::default();

        let pass = gate.try_enter().expect("gate starts open");
        assert!(gate.try_enter().is_none(), "second entry must be refused");

        drop(pass);
        assert!(gate.try_enter().is_some(), "gate reopens after drop");
    }
}
