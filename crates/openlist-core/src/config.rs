// ── Runtime bridge configuration ──
//
// Describes *how* to reach an OpenList server and what to poll. Carries
// credential data and tuning, but never touches disk -- the platform's
// setup flow constructs a `BridgeConfig` and hands it in.

use std::time::Duration;

use openlist_api::{Credentials, TlsMode};
use url::Url;

/// Configuration for one bridged OpenList server.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Server URL (e.g., `https://files.example.net`).
    pub url: Url,
    /// Authentication mode and credentials (exactly one active).
    pub auth: Credentials,
    /// Directories whose file counts are polled and published as sensors.
    /// Order is preserved; duplicates are dropped at setup.
    pub track_dirs: Vec<String>,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often to poll tracked directories (seconds). 0 = never.
    pub dir_poll_interval_secs: u64,
    /// How often to poll the task queues (seconds). 0 = never.
    pub task_poll_interval_secs: u64,
}

impl BridgeConfig {
    /// Tracked directories with order preserved and duplicates removed.
    pub fn unique_track_dirs(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.track_dirs
            .iter()
            .filter(|d| seen.insert(d.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:5244".parse().expect("static URL"),
            auth: Credentials::Password {
                username: "admin".into(),
                password: String::new().into(),
            },
            track_dirs: Vec::new(),
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            dir_poll_interval_secs: 300,
            task_poll_interval_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_track_dirs_keeps_first_occurrence_order() {
        let config = BridgeConfig {
            track_dirs: vec![
                "/downloads".into(),
                "/movies".into(),
                "/downloads".into(),
            ],
            ..BridgeConfig::default()
        };
        assert_eq!(config.unique_track_dirs(), vec!["/downloads", "/movies"]);
    }
}
