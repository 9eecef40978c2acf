// openlist-api: Async Rust client for the OpenList file-management server API

pub mod archive;
pub mod auth;
pub mod client;
pub mod error;
pub mod fs;
pub mod models;
pub mod tasks;
pub mod transport;

pub use archive::{ArchiveQuery, DecompressOptions};
pub use auth::Credentials;
pub use client::OpenListClient;
pub use error::Error;
pub use fs::ListQuery;
pub use models::{FsEntry, FsListData, RenamePair, TaskEntry, TaskType};
pub use transport::{TlsMode, TransportConfig};
