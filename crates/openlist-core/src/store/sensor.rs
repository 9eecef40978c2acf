// ── Sensor descriptors and cached state ──
//
// The bridge publishes two sensor families: one file-count sensor per
// tracked directory, and three task-count sensors per task type. The set
// is fixed at setup time from the configuration -- sensors are never
// created or destroyed while the bridge runs.

use chrono::{DateTime, Utc};
use openlist_api::{TaskEntry, TaskType};
use serde::Serialize;
use strum::{Display, EnumIter};

/// Which of the three per-task-type counts a sensor carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskCountKind {
    DoneSucceeded,
    DoneFailed,
    Undone,
}

/// Identity of a single published sensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SensorKey {
    /// File count of one tracked directory.
    DirCount { path: String },
    /// One of the three task counts for one task type.
    TaskCount {
        task_type: TaskType,
        kind: TaskCountKind,
    },
}

impl SensorKey {
    /// Deterministic entity key for the platform's registry.
    ///
    /// Derived purely from the sensor's identity so it survives restarts:
    /// `dir_<sanitized path>` or `task_<type>_<kind>`.
    pub fn entity_key(&self) -> String {
        match self {
            Self::DirCount { path } => format!("dir_{}", sanitize(path)),
            Self::TaskCount { task_type, kind } => format!("task_{task_type}_{kind}"),
        }
    }
}

/// Replace registry-hostile characters with underscores.
fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    cleaned.trim_matches('_').to_owned()
}

/// Cached state of one sensor.
///
/// `value` survives failed polls -- a target that stops answering keeps
/// its last good count with `available` flipped off, so the platform can
/// show "unavailable" without discarding history.
#[derive(Debug, Clone)]
pub struct SensorState {
    pub key: SensorKey,
    pub value: Option<i64>,
    pub available: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SensorState {
    pub(crate) fn unknown(key: SensorKey) -> Self {
        Self {
            key,
            value: None,
            available: false,
            last_updated: None,
        }
    }

    /// The platform-facing entity key.
    pub fn entity_key(&self) -> String {
        self.key.entity_key()
    }
}

/// The three counts derived from one task type's queue state.
///
/// Recomputed from the raw remote lists on every poll; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub done_succeeded: i64,
    pub done_failed: i64,
    pub undone: i64,
}

impl TaskCounts {
    /// Derive the counts from the raw done/undone task lists.
    pub fn derive(done: &[TaskEntry], undone: &[TaskEntry]) -> Self {
        let done_succeeded = done.iter().filter(|t| t.succeeded()).count() as i64;
        Self {
            done_succeeded,
            done_failed: done.len() as i64 - done_succeeded,
            undone: undone.len() as i64,
        }
    }

    pub(crate) fn get(&self, kind: TaskCountKind) -> i64 {
        match kind {
            TaskCountKind::DoneSucceeded => self.done_succeeded,
            TaskCountKind::DoneFailed => self.done_failed,
            TaskCountKind::Undone => self.undone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, state: i64) -> TaskEntry {
        serde_json::from_value(serde_json::json!({ "id": id, "state": state }))
            .expect("valid task json")
    }

    #[test]
    fn counts_derive_from_raw_lists() {
        let done = vec![task("1", 2), task("2", 7)];
        let undone = vec![task("3", 1)];

        let counts = TaskCounts::derive(&done, &undone);
        assert_eq!(
            counts,
            TaskCounts {
                done_succeeded: 1,
                done_failed: 1,
                undone: 1,
            }
        );
    }

    #[test]
    fn empty_lists_derive_to_zero() {
        let counts = TaskCounts::derive(&[], &[]);
        assert_eq!(counts.done_succeeded, 0);
        assert_eq!(counts.done_failed, 0);
        assert_eq!(counts.undone, 0);
    }

    #[test]
    fn entity_keys_are_deterministic_and_distinct() {
        let dir = SensorKey::DirCount {
            path: "/downloads/new".into(),
        };
        assert_eq!(dir.entity_key(), "dir_downloads_new");

        let undone = SensorKey::TaskCount {
            task_type: TaskType::OfflineDownload,
            kind: TaskCountKind::Undone,
        };
        assert_eq!(undone.entity_key(), "task_offline_download_undone");

        let failed = SensorKey::TaskCount {
            task_type: TaskType::OfflineDownload,
            kind: TaskCountKind::DoneFailed,
        };
        assert_ne!(undone.entity_key(), failed.entity_key());
    }
}
