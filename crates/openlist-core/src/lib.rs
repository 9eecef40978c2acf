// openlist-core: Sensor state, polling, and action dispatch between
// openlist-api and the home-automation platform.

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod poller;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, BridgeState};
pub use command::{Action, FileRecord};
pub use config::BridgeConfig;
pub use error::CoreError;
pub use poller::Poller;
pub use store::{SensorKey, SensorState, SensorStore, TaskCountKind, TaskCounts};

// Re-export the API types consumers need to build a config.
pub use openlist_api::{Credentials, TaskType, TlsMode};
