// OpenList HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, envelope unwrapping,
// and the token-refresh retry policy. All endpoint modules (fs, tasks,
// archive) are implemented as inherent methods via separate files to keep
// this module focused on transport mechanics.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{CODE_OK, CODE_UNAUTHORIZED, Envelope, LoginData};
use crate::transport::TransportConfig;

/// Raw HTTP client for the OpenList server API.
///
/// Handles the `{ code, message, data }` envelope and bearer-token auth.
/// All methods return unwrapped `data` payloads -- the envelope is stripped
/// before the caller sees it. The session token lives behind an `RwLock`;
/// only the auth path writes it.
pub struct OpenListClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    token: RwLock<Option<String>>,
    timeout_secs: u64,
}

impl OpenListClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` should be the server root (e.g. `https://files.example.net`);
    /// a trailing slash is tolerated and normalized away.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            credentials,
            token: RwLock::new(None),
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Useful in tests or when sharing a client across integrations.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            credentials,
            token: RwLock::new(None),
            timeout_secs: 30,
        }
    }

    /// The server base URL (no trailing slash).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The underlying HTTP client (for the login flow).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Session token ────────────────────────────────────────────────

    pub(crate) async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub(crate) async fn reset_token(&self) {
        *self.token.write().await = None;
    }

    async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Whether a session token is currently held.
    pub async fn has_session(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an absolute API path like `/api/fs/list`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Request core ─────────────────────────────────────────────────

    /// Send one request and unwrap the envelope, refreshing the token and
    /// retrying exactly once if the server signals auth expiry.
    ///
    /// This is the single place the retry policy lives: every endpoint
    /// method funnels through here. A second unauthorized response (or a
    /// failed re-login) surfaces as [`Error::Auth`] with no further
    /// attempts.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, Error> {
        if self.current_token().await.is_none() {
            self.login().await?;
        }

        match self.send_once(method.clone(), path, query, body).await {
            Err(e) if e.is_auth_expired() => {
                if matches!(self.credentials, Credentials::ApiKey { .. }) {
                    // Nothing to refresh: the key was rejected outright.
                    return Err(Error::Auth {
                        message: "API key rejected by server".into(),
                    });
                }

                warn!(path, "token rejected -- re-authenticating once");
                self.reset_token().await;
                self.login().await?;

                match self.send_once(method, path, query, body).await {
                    Err(e) if e.is_auth_expired() => Err(Error::Auth {
                        message: "credentials rejected after token refresh".into(),
                    }),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Convenience wrappers over [`request`](Self::request).
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::GET, path, &[], None).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, Error> {
        self.request(Method::POST, path, &[], Some(&body)).await
    }

    /// One HTTP round trip: attach the token, send, unwrap the envelope.
    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("{method} {url}");

        let token = self.current_token().await.unwrap_or_default();

        let mut req = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::ACCEPT, "application/json");

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(json) = body {
            req = req.json(json);
        }

        let resp = req.send().await.map_err(|e| self.map_transport(e))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Remote {
                code: CODE_UNAUTHORIZED,
                message: "unauthorized".into(),
            });
        }

        let raw = resp.text().await.map_err(|e| self.map_transport(e))?;

        let envelope: Envelope<Value> =
            serde_json::from_str(&raw).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: raw.clone(),
            })?;

        match envelope.code {
            CODE_OK => {
                let data = envelope.data.unwrap_or(Value::Null);
                serde_json::from_value(data).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: raw,
                })
            }
            code => Err(Error::Remote {
                code,
                message: envelope.message,
            }),
        }
    }

    /// Decode the login response envelope (outside the retry path -- a
    /// failed login is always an auth error, never retried).
    pub(crate) async fn parse_login_envelope(
        &self,
        resp: reqwest::Response,
    ) -> Result<LoginData, Error> {
        let raw = resp.text().await.map_err(|e| self.map_transport(e))?;

        let envelope: Envelope<LoginData> =
            serde_json::from_str(&raw).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: raw.clone(),
            })?;

        match envelope.code {
            CODE_OK => envelope.data.ok_or_else(|| Error::Auth {
                message: "login response carried no data".into(),
            }),
            code => Err(Error::Auth {
                message: format!("login rejected (code {code}): {}", envelope.message),
            }),
        }
    }

    fn map_transport(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(e)
        }
    }
}

/// Strip any trailing slash so `join` never doubles one up.
fn normalize_base(mut url: Url) -> Url {
    let trimmed = url.path().trim_end_matches('/').to_owned();
    url.set_path(&trimmed);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let url = Url::parse("https://files.example.net/base/").unwrap();
        assert_eq!(normalize_base(url).path(), "/base");
    }

    #[test]
    fn api_url_joins_absolute_paths() {
        let client = OpenListClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://files.example.net").unwrap(),
            Credentials::ApiKey {
                key: "k".to_string().into(),
            },
        );
        let url = client.api_url("/api/fs/list").unwrap();
        assert_eq!(url.as_str(), "https://files.example.net/api/fs/list");
    }
}
