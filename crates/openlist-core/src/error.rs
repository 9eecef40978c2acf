// ── Core error types ──
//
// User-facing errors from openlist-core. Consumers never see raw reqwest
// errors or JSON parse failures directly; the `From<openlist_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.
// The platform renders these as failed action calls.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Bridge is not connected")]
    BridgeDisconnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Action errors ────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Server error: {message}")]
    Api {
        message: String,
        /// The server's envelope code (if the request got that far).
        code: Option<i64>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`ValidationFailed`](Self::ValidationFailed) error.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<openlist_api::Error> for CoreError {
    fn from(err: openlist_api::Error) -> Self {
        match err {
            openlist_api::Error::Validation { message } => CoreError::ValidationFailed { message },
            openlist_api::Error::Auth { message } => CoreError::AuthenticationFailed { message },
            openlist_api::Error::Remote { code, message } => CoreError::Api {
                message,
                code: Some(code),
            },
            openlist_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                    }
                }
            }
            openlist_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            openlist_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            openlist_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            openlist_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
