// Archive endpoints
//
// Metadata, inner listing, and server-side decompression for archive files
// (zip/rar/7z as supported by the server's drivers).

use serde_json::{Value, json};
use tracing::debug;

use crate::client::OpenListClient;
use crate::error::Error;
use crate::models::{ArchiveListData, ArchiveMetaData};

/// Optional knobs shared by the archive read endpoints.
#[derive(Debug, Clone, Default)]
pub struct ArchiveQuery {
    /// Directory password, for password-protected paths.
    pub password: String,
    /// Password of the archive itself.
    pub archive_pass: String,
    /// Bypass the server's archive cache.
    pub refresh: bool,
}

/// Optional knobs for [`OpenListClient::decompress_archive`].
#[derive(Debug, Clone)]
pub struct DecompressOptions {
    pub archive_pass: String,
    /// Cache the whole archive server-side before extracting.
    pub cache_full: bool,
    /// Extract into a fresh directory named after the archive.
    pub put_into_new_dir: bool,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        Self {
            archive_pass: String::new(),
            cache_full: true,
            put_into_new_dir: false,
        }
    }
}

impl OpenListClient {
    /// Get archive metadata (comment, encryption flag, preview tree).
    ///
    /// `POST /api/fs/archive/meta`
    pub async fn get_archive_meta(
        &self,
        path: &str,
        query: &ArchiveQuery,
    ) -> Result<ArchiveMetaData, Error> {
        if path.is_empty() {
            return Err(Error::validation("path must not be empty"));
        }
        debug!(path, "fetching archive meta");
        self.post_json(
            "/api/fs/archive/meta",
            json!({
                "path": path,
                "password": query.password,
                "refresh": query.refresh,
                "archive_pass": query.archive_pass,
            }),
        )
        .await
    }

    /// List entries inside an archive.
    ///
    /// `POST /api/fs/archive/list` -- `inner_path` addresses a directory
    /// inside the archive (`/` for its root).
    pub async fn list_archive(
        &self,
        path: &str,
        inner_path: &str,
        query: &ArchiveQuery,
    ) -> Result<ArchiveListData, Error> {
        if path.is_empty() || inner_path.is_empty() {
            return Err(Error::validation("path and inner_path must not be empty"));
        }
        debug!(path, inner_path, "listing archive");
        self.post_json(
            "/api/fs/archive/list",
            json!({
                "path": path,
                "inner_path": inner_path,
                "password": query.password,
                "page": 1,
                "per_page": 0,
                "refresh": query.refresh,
                "archive_pass": query.archive_pass,
            }),
        )
        .await
    }

    /// Extract archives server-side.
    ///
    /// `POST /api/fs/archive/decompress` -- extraction runs as a
    /// `decompress` task; the payload carries whatever the server reports.
    pub async fn decompress_archive(
        &self,
        src_dir: &str,
        dst_dir: &str,
        names: &[String],
        inner_path: &str,
        opts: &DecompressOptions,
    ) -> Result<Value, Error> {
        if src_dir.is_empty() || dst_dir.is_empty() || inner_path.is_empty() {
            return Err(Error::validation(
                "source, destination, and inner_path must not be empty",
            ));
        }
        if names.is_empty() {
            return Err(Error::validation("names must not be empty"));
        }
        debug!(src_dir, dst_dir, count = names.len(), "decompressing archives");
        self.post_json(
            "/api/fs/archive/decompress",
            json!({
                "src_dir": src_dir,
                "dst_dir": dst_dir,
                "name": names,
                "inner_path": inner_path,
                "archive_pass": opts.archive_pass,
                "cache_full": opts.cache_full,
                "put_into_new_dir": opts.put_into_new_dir,
            }),
        )
        .await
    }
}
