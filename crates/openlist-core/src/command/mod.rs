// ── Action API ──
//
// All platform service calls flow through a closed `Action` enum. The
// bridge routes each variant to the matching client operation. Parsing is
// where parameter schemas live: required-presence and types are checked
// here, before anything can reach the network; deeper value rules (empty
// lists, separator-free names) belong to the client.

use std::str::FromStr;

use openlist_api::{FsEntry, RenamePair, TaskType};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// An action envelope sent through the action channel.
/// Contains the action and a oneshot response channel.
pub(crate) struct ActionEnvelope {
    pub action: Action,
    pub response_tx: tokio::sync::oneshot::Sender<Result<Value, CoreError>>,
}

/// All platform-invocable operations against the file service.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Filesystem reads ─────────────────────────────────────────────
    ListFiles {
        path: String,
        page: Option<u64>,
        per_page: Option<u64>,
    },
    GetFileInfo {
        path: String,
    },
    SearchFiles {
        parent: String,
        keywords: String,
        scope: i64,
    },
    GetDirs {
        path: Option<String>,
        force_root: bool,
    },

    // ── Filesystem mutations ─────────────────────────────────────────
    Mkdir {
        path: String,
    },
    Rename {
        path: String,
        name: String,
    },
    BatchRename {
        src_dir: String,
        rename_objects: Vec<RenamePair>,
    },
    RegexRename {
        src_dir: String,
        src_name_regex: String,
        new_name_regex: String,
    },
    MoveFiles {
        src_dir: String,
        dst_dir: String,
        names: Vec<String>,
    },
    RecursiveMove {
        src_dir: String,
        dst_dir: String,
    },
    CopyFiles {
        src_dir: String,
        dst_dir: String,
        names: Vec<String>,
    },
    RemoveFiles {
        dir_path: String,
        names: Vec<String>,
    },
    RemoveEmptyDir {
        src_dir: String,
    },
    AddOfflineDownload {
        path: String,
        urls: Vec<String>,
        tool: String,
        delete_policy: String,
    },

    // ── Archives ─────────────────────────────────────────────────────
    GetArchiveMeta {
        path: String,
    },
    ListArchive {
        path: String,
        inner_path: Option<String>,
    },
    DecompressArchive {
        src_dir: String,
        dst_dir: String,
        names: Vec<String>,
        inner_path: Option<String>,
    },

    // ── Task queries ─────────────────────────────────────────────────
    GetTasks {
        task_type: TaskType,
    },
    GetTaskInfo {
        task_type: TaskType,
        tid: Option<String>,
    },
    GetTaskDone {
        task_type: TaskType,
    },
    GetTaskUndone {
        task_type: TaskType,
    },

    // ── Task mutations ───────────────────────────────────────────────
    DeleteTask {
        task_type: TaskType,
        tid: String,
    },
    CancelTask {
        task_type: TaskType,
        tid: String,
    },
    RetryTask {
        task_type: TaskType,
        tid: String,
    },
    DeleteSomeTasks {
        task_type: TaskType,
        tids: Vec<String>,
    },
    CancelSomeTasks {
        task_type: TaskType,
        tids: Vec<String>,
    },
    RetrySomeTasks {
        task_type: TaskType,
        tids: Vec<String>,
    },
    ClearDoneTasks {
        task_type: TaskType,
    },
    ClearSucceededTasks {
        task_type: TaskType,
    },
    RetryFailedTasks {
        task_type: TaskType,
    },
}

impl Action {
    /// Parse a named platform action call into a typed `Action`.
    ///
    /// Unknown names, missing required parameters, and mistyped values
    /// all fail with [`CoreError::ValidationFailed`] -- nothing is sent to
    /// the network from here.
    pub fn parse(name: &str, params: &Value) -> Result<Self, CoreError> {
        let p = params_object(params)?;

        match name {
            "list_files" => Ok(Self::ListFiles {
                path: req_str(p, "path")?,
                page: opt_u64(p, "page")?,
                per_page: opt_u64(p, "per_page")?,
            }),
            "get_file_info" => Ok(Self::GetFileInfo {
                path: req_str(p, "path")?,
            }),
            "search_files" => Ok(Self::SearchFiles {
                parent: req_str(p, "parent")?,
                keywords: req_str(p, "keywords")?,
                scope: req_i64(p, "scope")?,
            }),
            "get_dirs" => Ok(Self::GetDirs {
                path: opt_str(p, "path")?,
                force_root: opt_bool(p, "force_root")?.unwrap_or(false),
            }),
            "mkdir" => Ok(Self::Mkdir {
                path: req_str(p, "path")?,
            }),
            "rename" => Ok(Self::Rename {
                path: req_str(p, "path")?,
                name: req_str(p, "name")?,
            }),
            "batch_rename" => Ok(Self::BatchRename {
                src_dir: req_str(p, "src_dir")?,
                rename_objects: req_rename_pairs(p, "rename_objects")?,
            }),
            "regex_rename" => Ok(Self::RegexRename {
                src_dir: req_str(p, "src_dir")?,
                src_name_regex: req_str(p, "src_name_regex")?,
                new_name_regex: req_str(p, "new_name_regex")?,
            }),
            "move_files" => Ok(Self::MoveFiles {
                src_dir: req_str(p, "src_dir")?,
                dst_dir: req_str(p, "dst_dir")?,
                names: req_str_list(p, "names")?,
            }),
            "recursive_move" => Ok(Self::RecursiveMove {
                src_dir: req_str(p, "src_dir")?,
                dst_dir: req_str(p, "dst_dir")?,
            }),
            "copy_files" => Ok(Self::CopyFiles {
                src_dir: req_str(p, "src_dir")?,
                dst_dir: req_str(p, "dst_dir")?,
                names: req_str_list(p, "names")?,
            }),
            "remove_files" => Ok(Self::RemoveFiles {
                dir_path: req_str(p, "dir_path")?,
                names: req_str_list(p, "names")?,
            }),
            "remove_empty_dir" => Ok(Self::RemoveEmptyDir {
                src_dir: req_str(p, "src_dir")?,
            }),
            "add_offline_download" => Ok(Self::AddOfflineDownload {
                path: req_str(p, "path")?,
                urls: req_str_list(p, "urls")?,
                tool: req_str(p, "tool")?,
                delete_policy: req_str(p, "delete_policy")?,
            }),
            "get_archive_meta" => Ok(Self::GetArchiveMeta {
                path: req_str(p, "path")?,
            }),
            "list_archive" => Ok(Self::ListArchive {
                path: req_str(p, "path")?,
                inner_path: opt_str(p, "inner_path")?,
            }),
            "decompress_archive" => Ok(Self::DecompressArchive {
                src_dir: req_str(p, "src_dir")?,
                dst_dir: req_str(p, "dst_dir")?,
                names: req_str_or_list(p, "name")?,
                inner_path: opt_str(p, "inner_path")?,
            }),
            "get_tasks" => Ok(Self::GetTasks {
                task_type: req_task_type(p)?,
            }),
            "get_task_info" => Ok(Self::GetTaskInfo {
                task_type: req_task_type(p)?,
                tid: opt_str(p, "tid")?,
            }),
            "get_task_done" => Ok(Self::GetTaskDone {
                task_type: req_task_type(p)?,
            }),
            "get_task_undone" => Ok(Self::GetTaskUndone {
                task_type: req_task_type(p)?,
            }),
            "delete_task" => Ok(Self::DeleteTask {
                task_type: req_task_type(p)?,
                tid: req_str(p, "tid")?,
            }),
            "cancel_task" => Ok(Self::CancelTask {
                task_type: req_task_type(p)?,
                tid: req_str(p, "tid")?,
            }),
            "retry_task" => Ok(Self::RetryTask {
                task_type: req_task_type(p)?,
                tid: req_str(p, "tid")?,
            }),
            "delete_some_tasks" => Ok(Self::DeleteSomeTasks {
                task_type: req_task_type(p)?,
                tids: req_str_list(p, "tids")?,
            }),
            "cancel_some_tasks" => Ok(Self::CancelSomeTasks {
                task_type: req_task_type(p)?,
                tids: req_str_list(p, "tids")?,
            }),
            "retry_some_tasks" => Ok(Self::RetrySomeTasks {
                task_type: req_task_type(p)?,
                tids: req_str_list(p, "tids")?,
            }),
            "clear_done_tasks" => Ok(Self::ClearDoneTasks {
                task_type: req_task_type(p)?,
            }),
            "clear_succeeded_tasks" => Ok(Self::ClearSucceededTasks {
                task_type: req_task_type(p)?,
            }),
            "retry_failed_tasks" => Ok(Self::RetryFailedTasks {
                task_type: req_task_type(p)?,
            }),
            other => Err(CoreError::validation(format!("unknown action: {other}"))),
        }
    }
}

// ── Shaped output ────────────────────────────────────────────────────

/// One row of a shaped `list_files` response.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
    pub modified_time: Option<String>,
}

impl From<&FsEntry> for FileRecord {
    fn from(entry: &FsEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            is_directory: entry.is_dir,
            modified_time: entry.modified.clone(),
        }
    }
}

// ── Parameter extraction ─────────────────────────────────────────────

fn params_object(params: &Value) -> Result<&Map<String, Value>, CoreError> {
    params
        .as_object()
        .ok_or_else(|| CoreError::validation("action parameters must be an object"))
}

fn req_str(p: &Map<String, Value>, key: &str) -> Result<String, CoreError> {
    match p.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(CoreError::validation(format!("'{key}' must be a string"))),
        None => Err(CoreError::validation(format!(
            "missing required parameter '{key}'"
        ))),
    }
}

fn opt_str(p: &Map<String, Value>, key: &str) -> Result<Option<String>, CoreError> {
    match p.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CoreError::validation(format!("'{key}' must be a string"))),
    }
}

fn req_i64(p: &Map<String, Value>, key: &str) -> Result<i64, CoreError> {
    match p.get(key) {
        Some(v) => v
            .as_i64()
            .ok_or_else(|| CoreError::validation(format!("'{key}' must be an integer"))),
        None => Err(CoreError::validation(format!(
            "missing required parameter '{key}'"
        ))),
    }
}

fn opt_u64(p: &Map<String, Value>, key: &str) -> Result<Option<u64>, CoreError> {
    match p.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| CoreError::validation(format!("'{key}' must be a non-negative integer"))),
    }
}

fn opt_bool(p: &Map<String, Value>, key: &str) -> Result<Option<bool>, CoreError> {
    match p.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(CoreError::validation(format!("'{key}' must be a boolean"))),
    }
}

fn req_str_list(p: &Map<String, Value>, key: &str) -> Result<Vec<String>, CoreError> {
    match p.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(ToOwned::to_owned)
                    .ok_or_else(|| CoreError::validation(format!("'{key}' must contain strings")))
            })
            .collect(),
        Some(_) => Err(CoreError::validation(format!("'{key}' must be a list"))),
        None => Err(CoreError::validation(format!(
            "missing required parameter '{key}'"
        ))),
    }
}

/// Accept either a single string or a list of strings.
fn req_str_or_list(p: &Map<String, Value>, key: &str) -> Result<Vec<String>, CoreError> {
    match p.get(key) {
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(_)) => req_str_list(p, key),
        Some(_) => Err(CoreError::validation(format!(
            "'{key}' must be a string or a list of strings"
        ))),
        None => Err(CoreError::validation(format!(
            "missing required parameter '{key}'"
        ))),
    }
}

fn req_rename_pairs(p: &Map<String, Value>, key: &str) -> Result<Vec<RenamePair>, CoreError> {
    match p.get(key) {
        Some(v @ Value::Array(_)) => serde_json::from_value(v.clone()).map_err(|e| {
            CoreError::validation(format!("'{key}' must be a list of rename pairs: {e}"))
        }),
        Some(_) => Err(CoreError::validation(format!("'{key}' must be a list"))),
        None => Err(CoreError::validation(format!(
            "missing required parameter '{key}'"
        ))),
    }
}

fn req_task_type(p: &Map<String, Value>) -> Result<TaskType, CoreError> {
    let raw = req_str(p, "task_type")?;
    TaskType::from_str(&raw)
        .map_err(|_| CoreError::validation(format!("unsupported task type: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_list_files_with_optional_paging() {
        let action = Action::parse("list_files", &json!({ "path": "/media", "page": 2 })).unwrap();
        match action {
            Action::ListFiles { path, page, per_page } => {
                assert_eq!(path, "/media");
                assert_eq!(page, Some(2));
                assert_eq!(per_page, None);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn missing_required_parameter_is_validation_failure() {
        let err = Action::parse("move_files", &json!({ "src_dir": "/a", "dst_dir": "/b" }))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[test]
    fn mistyped_parameter_is_validation_failure() {
        let err = Action::parse(
            "move_files",
            &json!({ "src_dir": "/a", "dst_dir": "/b", "names": "not-a-list" }),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[test]
    fn unknown_action_name_is_validation_failure() {
        let err = Action::parse("format_disk", &json!({})).unwrap_err();
        match err {
            CoreError::ValidationFailed { message } => {
                assert!(message.contains("unknown action"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unsupported_task_type_is_rejected() {
        let err =
            Action::parse("get_task_done", &json!({ "task_type": "defrag" })).unwrap_err();
        match err {
            CoreError::ValidationFailed { message } => {
                assert!(message.contains("unsupported task type"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn task_type_strings_map_to_the_closed_set() {
        let action = Action::parse(
            "get_task_done",
            &json!({ "task_type": "offline_download_transfer" }),
        )
        .unwrap();
        match action {
            Action::GetTaskDone { task_type } => {
                assert_eq!(task_type, TaskType::OfflineDownloadTransfer);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn decompress_accepts_string_or_list_for_name() {
        let single = Action::parse(
            "decompress_archive",
            &json!({ "src_dir": "/a", "dst_dir": "/b", "name": "x.zip" }),
        )
        .unwrap();
        match single {
            Action::DecompressArchive { names, .. } => assert_eq!(names, vec!["x.zip"]),
            other => panic!("unexpected action: {other:?}"),
        }

        let many = Action::parse(
            "decompress_archive",
            &json!({ "src_dir": "/a", "dst_dir": "/b", "name": ["x.zip", "y.zip"] }),
        )
        .unwrap();
        match many {
            Action::DecompressArchive { names, .. } => assert_eq!(names.len(), 2),
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
