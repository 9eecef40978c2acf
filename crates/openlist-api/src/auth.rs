// Authentication types and the hash-login flow.
//
// OpenList issues a bearer token from POST /api/auth/login/hash; the
// password is never sent raw but as a salted SHA-256 digest. API-key
// deployments skip login entirely -- the key IS the token.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::OpenListClient;
use crate::error::Error;
use crate::models::LoginData;

/// Salt the server appends before hashing stored passwords. Inherited from
/// the upstream alist project; the hash-login endpoint expects the same.
const PASSWORD_SALT: &str = "-https://github.com/alist-org/alist";

/// Credentials for authenticating with an OpenList server.
///
/// Exactly one auth mode is active per configured server.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password login via `/api/auth/login/hash`.
    Password {
        username: String,
        password: SecretString,
    },
    /// Long-lived API key sent directly as the Authorization header.
    ApiKey { key: SecretString },
}

/// Compute the salted SHA-256 digest the hash-login endpoint expects.
pub(crate) fn hash_password(password: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.expose_secret().as_bytes());
    hasher.update(PASSWORD_SALT.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl OpenListClient {
    /// Authenticate and store the session token.
    ///
    /// Password mode posts the salted hash to `/api/auth/login/hash` and
    /// extracts `data.token` from the envelope. API-key mode installs the
    /// key as the token without a network call.
    ///
    /// No TTL is assumed; the token is refreshed reactively when a request
    /// comes back unauthorized (see `request_envelope`).
    pub async fn login(&self) -> Result<(), Error> {
        match self.credentials() {
            Credentials::ApiKey { key } => {
                self.set_token(key.expose_secret().to_owned()).await;
                debug!("using API key auth -- no login required");
                Ok(())
            }
            Credentials::Password { username, password } => {
                let url = self.api_url("/api/auth/login/hash")?;
                debug!(%username, "logging in at {url}");

                let body = json!({
                    "username": username,
                    "password": hash_password(password),
                    "otp_code": "",
                });

                let resp = self
                    .http()
                    .post(url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(Error::Transport)?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Auth {
                        message: format!("login failed (HTTP {status}): {body}"),
                    });
                }

                let data: LoginData = self.parse_login_envelope(resp).await?;
                if data.token.is_empty() {
                    return Err(Error::Auth {
                        message: "login response carried no token".into(),
                    });
                }

                self.set_token(data.token).await;
                debug!("login successful");
                Ok(())
            }
        }
    }

    /// Drop the stored session token.
    ///
    /// OpenList tokens are stateless JWTs; there is no logout endpoint to
    /// call, so ending the session is purely local.
    pub async fn clear_session(&self) {
        self.reset_token().await;
        debug!("session cleared");
    }

    /// Cheap credential probe: `GET /api/me`.
    ///
    /// Used by setup validation to confirm the configured credentials work
    /// before the bridge starts polling.
    pub async fn verify(&self) -> Result<serde_json::Value, Error> {
        self.get_json("/api/me").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_salted_sha256() {
        let secret: SecretString = "admin".to_string().into();
        // sha256("admin-https://github.com/alist-org/alist")
        assert_eq!(
            hash_password(&secret),
            "6fcb57cd10b2c11d765dcf16148d99130afd895082af83725ee8bb181b1d2b0f"
        );
    }
}
