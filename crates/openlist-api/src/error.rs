use thiserror::Error;

/// Top-level error type for the `openlist-api` crate.
///
/// Four caller-visible kinds: local validation, authentication, a rejected
/// well-formed request (remote), and transport. `openlist-core` maps these
/// into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Local validation ────────────────────────────────────────────
    /// Bad or missing parameters, caught before any network contact.
    #[error("Invalid parameters: {message}")]
    Validation { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected, including after the single refresh attempt.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ── Remote ──────────────────────────────────────────────────────
    /// The server rejected a well-formed request (envelope `code != 200`).
    #[error("Server error (code {code}): {message}")]
    Remote { code: i64, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session token is no
    /// longer valid and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Remote { code, .. } => *code == 401,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::UNAUTHORIZED),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` for any network-level failure kind (as opposed to a
    /// structured rejection from the server).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::Tls(_) | Self::Deserialization { .. }
        )
    }

    /// Shorthand for a [`Validation`](Self::Validation) error.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
