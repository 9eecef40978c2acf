// OpenList API response types
//
// Every endpoint wraps its payload in the `Envelope<T>` shell. Fields use
// `#[serde(default)]` liberally because the server is inconsistent about
// field presence across versions and storage drivers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard OpenList response envelope.
///
/// ```json
/// { "code": 200, "message": "success", "data": ... }
/// ```
///
/// `code` mirrors HTTP semantics: 200 is success, 401 means the token is
/// invalid or expired, anything else is a server-side rejection.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// Envelope code for success.
pub const CODE_OK: i64 = 200;
/// Envelope code for an invalid or expired token.
pub const CODE_UNAUTHORIZED: i64 = 401;

// ── Auth ─────────────────────────────────────────────────────────────

/// Payload of `/api/auth/login/hash`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: String,
}

// ── Filesystem ───────────────────────────────────────────────────────

/// A single file or directory entry from `/api/fs/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_dir: bool,
    /// RFC 3339 modification timestamp as reported by the storage driver.
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub sign: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    /// Driver-specific entry type discriminator.
    #[serde(rename = "type", default)]
    pub entry_type: i64,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Payload of `/api/fs/list`: a page of entries plus listing metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FsListData {
    #[serde(default)]
    pub content: Option<Vec<FsEntry>>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub readme: String,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub provider: String,
}

impl FsListData {
    /// Entries in this page; the server sends `null` for an empty dir.
    pub fn entries(&self) -> &[FsEntry] {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Payload of `/api/fs/get`: one entry with full detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsInfoData {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub provider: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One hit from `/api/fs/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub parent: String,
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
}

/// Payload of `/api/fs/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub content: Option<Vec<SearchHit>>,
    #[serde(default)]
    pub total: u64,
}

/// One directory from `/api/fs/dirs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(default)]
    pub modified: Option<String>,
}

/// A single `{src_name, new_name}` pair for `/api/fs/batch_rename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePair {
    pub src_name: String,
    pub new_name: String,
}

// ── Archives ─────────────────────────────────────────────────────────

/// Payload of `/api/fs/archive/meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveMetaData {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub content: Option<Vec<ArchiveEntry>>,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub sign: Option<String>,
}

/// An entry inside an archive, from `/api/fs/archive/list` or the meta
/// preview tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<ArchiveEntry>>,
}

/// Payload of `/api/fs/archive/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveListData {
    #[serde(default)]
    pub content: Option<Vec<ArchiveEntry>>,
    #[serde(default)]
    pub total: u64,
}

// ── Tasks ────────────────────────────────────────────────────────────

/// The closed set of server-side task queues.
///
/// Each variant names one `/api/task/{type}/...` route family. The set is
/// fixed by the server; it drives a fixed-size sensor table downstream, so
/// it is deliberately not extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TaskType {
    Upload,
    Copy,
    OfflineDownload,
    OfflineDownloadTransfer,
    Decompress,
    DecompressUpload,
    Move,
}

/// Task state a finished task lands in when it succeeded.
///
/// The server reports task lifecycle as a small integer; 2 is "succeeded".
/// Anything else on the done list is a failure of some flavor (errored,
/// canceled, failed).
pub const TASK_STATE_SUCCEEDED: i64 = 2;

/// A task record from the `/api/task/{type}/...` query endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Lifecycle state integer; see [`TASK_STATE_SUCCEEDED`].
    #[serde(default)]
    pub state: i64,
    /// Human-readable status line.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskEntry {
    /// Whether this (done-list) task finished successfully.
    pub fn succeeded(&self) -> bool {
        self.state == TASK_STATE_SUCCEEDED
    }
}
