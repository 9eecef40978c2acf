// ── Reactive sensor table ──
//
// Fixed-size storage for every published sensor, built once at setup.
// Mutations are broadcast to subscribers via a `watch` channel. The
// mutators are crate-private: the polling coordinator is the sole writer,
// everything else reads snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use openlist_api::TaskType;
use strum::IntoEnumIterator;
use tokio::sync::watch;

use super::sensor::{SensorKey, SensorState, TaskCountKind, TaskCounts};

/// Reactive store for all of the bridge's sensors.
///
/// Keyed by [`SensorKey::entity_key`]. Reads are wait-free snapshots;
/// every mutation rebuilds the snapshot subscribers receive, so a
/// multi-sensor publish (the three counts of one task type) lands as a
/// single observable change.
pub struct SensorStore {
    sensors: DashMap<String, Arc<SensorState>>,
    /// Entity keys in publication order (directories first, then tasks).
    order: Vec<String>,
    snapshot: watch::Sender<Arc<Vec<Arc<SensorState>>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl SensorStore {
    /// Build the fixed sensor table for the configured tracked directories
    /// plus the three counts of every task type.
    ///
    /// Every sensor starts unknown (`value = None`) and unavailable until
    /// the first successful poll.
    pub fn new(track_dirs: &[String]) -> Self {
        let mut keys: Vec<SensorKey> = track_dirs
            .iter()
            .map(|path| SensorKey::DirCount { path: path.clone() })
            .collect();

        for task_type in TaskType::iter() {
            for kind in TaskCountKind::iter() {
                keys.push(SensorKey::TaskCount { task_type, kind });
            }
        }

        let sensors = DashMap::new();
        let mut order = Vec::with_capacity(keys.len());
        for key in keys {
            let entity_key = key.entity_key();
            sensors.insert(entity_key.clone(), Arc::new(SensorState::unknown(key)));
            order.push(entity_key);
        }

        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);

        let store = Self {
            sensors,
            order,
            snapshot,
            last_refresh,
        };
        store.rebuild_snapshot();
        store
    }

    // ── Read access ──────────────────────────────────────────────────

    /// Current state of one sensor.
    pub fn get(&self, key: &SensorKey) -> Option<Arc<SensorState>> {
        self.sensors
            .get(&key.entity_key())
            .map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot of every sensor, in publication order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<SensorState>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<SensorState>>>> {
        self.snapshot.subscribe()
    }

    /// Number of published sensors (fixed after setup).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// When the last successful publish happened, if ever.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    // ── Mutators (polling coordinator only) ──────────────────────────

    /// Publish a fresh file count for one tracked directory.
    pub(crate) fn publish_dir_count(&self, path: &str, count: i64) {
        let key = SensorKey::DirCount { path: path.into() };
        self.update(&key, |state| {
            state.value = Some(count);
            state.available = true;
            state.last_updated = Some(Utc::now());
        });
        self.finish_publish();
    }

    /// Flag one tracked directory unavailable, keeping its last value.
    pub(crate) fn mark_dir_unavailable(&self, path: &str) {
        let key = SensorKey::DirCount { path: path.into() };
        self.update(&key, |state| state.available = false);
        self.rebuild_snapshot();
    }

    /// Publish all three counts of one task type as a single change.
    pub(crate) fn publish_task_counts(&self, task_type: TaskType, counts: TaskCounts) {
        let now = Utc::now();
        for kind in TaskCountKind::iter() {
            let key = SensorKey::TaskCount { task_type, kind };
            self.update(&key, |state| {
                state.value = Some(counts.get(kind));
                state.available = true;
                state.last_updated = Some(now);
            });
        }
        self.finish_publish();
    }

    /// Flag all three of a task type's sensors unavailable, keeping their
    /// last values.
    pub(crate) fn mark_task_unavailable(&self, task_type: TaskType) {
        for kind in TaskCountKind::iter() {
            let key = SensorKey::TaskCount { task_type, kind };
            self.update(&key, |state| state.available = false);
        }
        self.rebuild_snapshot();
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn update(&self, key: &SensorKey, f: impl FnOnce(&mut SensorState)) {
        if let Some(mut entry) = self.sensors.get_mut(&key.entity_key()) {
            let mut state = (**entry.value()).clone();
            f(&mut state);
            *entry.value_mut() = Arc::new(state);
        }
    }

    fn finish_publish(&self) {
        self.rebuild_snapshot();
        let _ = self.last_refresh.send(Some(Utc::now()));
    }

    /// Collect all sensors into a snapshot vec and broadcast it.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<SensorState>> = self
            .order
            .iter()
            .filter_map(|k| self.sensors.get(k).map(|r| Arc::clone(r.value())))
            .collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
