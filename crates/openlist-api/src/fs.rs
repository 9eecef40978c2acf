// Filesystem endpoints
//
// Directory listing, metadata, and the mutation family (mkdir, rename,
// move, copy, remove, offline download). Every method validates its
// parameters locally before touching the network; mutations return the raw
// envelope payload since several of them answer with driver-specific data
// (or null).

use serde_json::{Value, json};
use tracing::debug;

use crate::client::OpenListClient;
use crate::error::Error;
use crate::models::{DirEntry, FsInfoData, FsListData, RenamePair, SearchData};

/// Optional knobs for [`OpenListClient::list_files`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Directory password, for password-protected paths.
    pub password: String,
    /// 1-based page number; 0 or 1 both mean the first page.
    pub page: u64,
    /// Page size; 0 means "everything".
    pub per_page: u64,
    /// Ask the server to bypass its listing cache.
    pub refresh: bool,
}

impl OpenListClient {
    /// List a directory.
    ///
    /// `POST /api/fs/list`
    pub async fn list_files(&self, path: &str, query: &ListQuery) -> Result<FsListData, Error> {
        if path.is_empty() {
            return Err(Error::validation("path must not be empty"));
        }
        debug!(path, "listing directory");
        self.post_json(
            "/api/fs/list",
            json!({
                "path": path,
                "password": query.password,
                "page": query.page.max(1),
                "per_page": query.per_page,
                "refresh": query.refresh,
            }),
        )
        .await
    }

    /// Get metadata for a single file or directory.
    ///
    /// `POST /api/fs/get`
    pub async fn get_file_info(&self, path: &str, password: &str) -> Result<FsInfoData, Error> {
        if path.is_empty() {
            return Err(Error::validation("path must not be empty"));
        }
        debug!(path, "fetching file info");
        self.post_json(
            "/api/fs/get",
            json!({
                "path": path,
                "password": password,
                "page": 1,
                "per_page": 0,
                "refresh": false,
            }),
        )
        .await
    }

    /// Create a directory (and any missing parents).
    ///
    /// `POST /api/fs/mkdir`
    pub async fn mkdir(&self, path: &str) -> Result<Value, Error> {
        if path.is_empty() {
            return Err(Error::validation("path must not be empty"));
        }
        debug!(path, "creating directory");
        self.post_json("/api/fs/mkdir", json!({ "path": path })).await
    }

    /// Rename a file or directory in place.
    ///
    /// `POST /api/fs/rename` -- `name` is the new leaf name, so it must not
    /// contain a path separator.
    pub async fn rename(&self, path: &str, name: &str) -> Result<Value, Error> {
        if path.is_empty() || name.is_empty() {
            return Err(Error::validation("path and new name must not be empty"));
        }
        if name.contains('/') {
            return Err(Error::validation("new name must not contain '/'"));
        }
        debug!(path, name, "renaming");
        self.post_json("/api/fs/rename", json!({ "path": path, "name": name }))
            .await
    }

    /// Move named entries from one directory to another.
    ///
    /// `POST /api/fs/move`
    pub async fn move_files(
        &self,
        src_dir: &str,
        dst_dir: &str,
        names: &[String],
    ) -> Result<Value, Error> {
        if src_dir.is_empty() || dst_dir.is_empty() {
            return Err(Error::validation("source and destination must not be empty"));
        }
        if names.is_empty() {
            return Err(Error::validation("names must not be empty"));
        }
        debug!(src_dir, dst_dir, count = names.len(), "moving entries");
        self.post_json(
            "/api/fs/move",
            json!({ "src_dir": src_dir, "dst_dir": dst_dir, "names": names }),
        )
        .await
    }

    /// Copy named entries from one directory to another.
    ///
    /// `POST /api/fs/copy` -- large copies become server-side tasks; the
    /// payload carries their ids when that happens.
    pub async fn copy_files(
        &self,
        src_dir: &str,
        dst_dir: &str,
        names: &[String],
    ) -> Result<Value, Error> {
        if src_dir.is_empty() || dst_dir.is_empty() {
            return Err(Error::validation("source and destination must not be empty"));
        }
        if names.is_empty() {
            return Err(Error::validation("names must not be empty"));
        }
        debug!(src_dir, dst_dir, count = names.len(), "copying entries");
        self.post_json(
            "/api/fs/copy",
            json!({ "src_dir": src_dir, "dst_dir": dst_dir, "names": names }),
        )
        .await
    }

    /// Move everything under `src_dir` (recursively) into `dst_dir`.
    ///
    /// `POST /api/fs/recursive_move`
    pub async fn recursive_move(&self, src_dir: &str, dst_dir: &str) -> Result<Value, Error> {
        if src_dir.is_empty() || dst_dir.is_empty() {
            return Err(Error::validation("source and destination must not be empty"));
        }
        debug!(src_dir, dst_dir, "recursive move");
        self.post_json(
            "/api/fs/recursive_move",
            json!({ "src_dir": src_dir, "dst_dir": dst_dir }),
        )
        .await
    }

    /// Remove named entries from a directory.
    ///
    /// `POST /api/fs/remove`
    pub async fn remove_files(&self, dir: &str, names: &[String]) -> Result<Value, Error> {
        if dir.is_empty() {
            return Err(Error::validation("directory must not be empty"));
        }
        if names.is_empty() {
            return Err(Error::validation("names must not be empty"));
        }
        debug!(dir, count = names.len(), "removing entries");
        self.post_json("/api/fs/remove", json!({ "dir": dir, "names": names }))
            .await
    }

    /// Remove a directory only if it is empty.
    ///
    /// `POST /api/fs/remove_empty_directory`
    pub async fn remove_empty_dir(&self, src_dir: &str) -> Result<Value, Error> {
        if src_dir.is_empty() {
            return Err(Error::validation("directory must not be empty"));
        }
        debug!(src_dir, "removing empty directory");
        self.post_json(
            "/api/fs/remove_empty_directory",
            json!({ "src_dir": src_dir }),
        )
        .await
    }

    /// Rename several entries in one call.
    ///
    /// `POST /api/fs/batch_rename` -- the server applies pairs in order and
    /// makes no rollback guarantee on partial failure; whatever per-item
    /// detail it reports comes back in the payload untouched.
    pub async fn batch_rename(
        &self,
        src_dir: &str,
        rename_objects: &[RenamePair],
    ) -> Result<Value, Error> {
        if src_dir.is_empty() {
            return Err(Error::validation("source directory must not be empty"));
        }
        if rename_objects.is_empty() {
            return Err(Error::validation("rename list must not be empty"));
        }
        debug!(src_dir, count = rename_objects.len(), "batch rename");
        self.post_json(
            "/api/fs/batch_rename",
            json!({ "src_dir": src_dir, "rename_objects": rename_objects }),
        )
        .await
    }

    /// Rename entries matching a regex.
    ///
    /// `POST /api/fs/regex_rename`
    pub async fn regex_rename(
        &self,
        src_dir: &str,
        src_name_regex: &str,
        new_name_regex: &str,
    ) -> Result<Value, Error> {
        if src_dir.is_empty() || src_name_regex.is_empty() || new_name_regex.is_empty() {
            return Err(Error::validation(
                "source directory and both regexes must not be empty",
            ));
        }
        debug!(src_dir, src_name_regex, new_name_regex, "regex rename");
        self.post_json(
            "/api/fs/regex_rename",
            json!({
                "src_dir": src_dir,
                "src_name_regex": src_name_regex,
                "new_name_regex": new_name_regex,
            }),
        )
        .await
    }

    /// Search for files or directories under a parent path.
    ///
    /// `POST /api/fs/search` -- `scope` narrows the hit kind:
    /// 0 = everything, 1 = directories only, 2 = files only.
    pub async fn search_files(
        &self,
        parent: &str,
        keywords: &str,
        scope: i64,
        page: u64,
        per_page: u64,
    ) -> Result<SearchData, Error> {
        if parent.is_empty() || keywords.is_empty() {
            return Err(Error::validation("parent and keywords must not be empty"));
        }
        debug!(parent, keywords, scope, "searching");
        self.post_json(
            "/api/fs/search",
            json!({
                "parent": parent,
                "keywords": keywords,
                "scope": scope,
                "page": page.max(1),
                "per_page": per_page,
                "password": "",
            }),
        )
        .await
    }

    /// List only the subdirectories of a path.
    ///
    /// `POST /api/fs/dirs`
    pub async fn get_dirs(&self, path: &str, force_root: bool) -> Result<Vec<DirEntry>, Error> {
        if path.is_empty() {
            return Err(Error::validation("path must not be empty"));
        }
        debug!(path, "listing subdirectories");
        let dirs: Option<Vec<DirEntry>> = self
            .post_json(
                "/api/fs/dirs",
                json!({ "path": path, "password": "", "force_root": force_root }),
            )
            .await?;
        Ok(dirs.unwrap_or_default())
    }

    /// Hand a set of URLs to the server's offline-download tool.
    ///
    /// `POST /api/fs/add_offline_download` -- the payload carries the
    /// created task records.
    pub async fn add_offline_download(
        &self,
        path: &str,
        urls: &[String],
        tool: &str,
        delete_policy: &str,
    ) -> Result<Value, Error> {
        if path.is_empty() || tool.is_empty() || delete_policy.is_empty() {
            return Err(Error::validation(
                "path, tool, and delete_policy must not be empty",
            ));
        }
        if urls.is_empty() {
            return Err(Error::validation("urls must not be empty"));
        }
        debug!(path, tool, count = urls.len(), "adding offline download");
        self.post_json(
            "/api/fs/add_offline_download",
            json!({
                "path": path,
                "urls": urls,
                "tool": tool,
                "delete_policy": delete_policy,
            }),
        )
        .await
    }
}
