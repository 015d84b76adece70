//! HTTP client wrapper for the inventario API.
//!
//! Thin layer over `reqwest` implementing the credential lifecycle:
//! bearer-token attachment on outgoing requests (except authentication
//! endpoints), and session-expiry detection with a one-time redirect to the
//! login screen.

pub mod credentials;
pub mod session;

pub use credentials::{AuthRecord, CredentialStore, FileCredentialStore};
pub use session::{Navigator, SessionGuard, EXPIRED_LOGIN_URL, LOGIN_PATH};

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::warn;

/// Client error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("error de red: {0}")]
    Http(#[from] reqwest::Error),

    #[error("respuesta {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// API client with credential attachment and expiry handling.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    session: SessionGuard,
}

impl ApiClient {
    pub fn new(
        root_url: &str,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: Self::api_base(root_url),
            credentials,
            session: SessionGuard::new(navigator),
        })
    }

    /// Normalize the configured root URL: no trailing slashes, `/api`
    /// appended unless the root already ends with it.
    pub fn api_base(root_url: &str) -> String {
        let root = root_url.trim_end_matches('/');
        if root.to_ascii_lowercase().ends_with("/api") {
            root.to_string()
        } else {
            format!("{root}/api")
        }
    }

    /// Authentication endpoints never get a credential attached.
    fn is_auth_endpoint(path: &str) -> bool {
        path.starts_with("/auth") || path.contains("/auth/")
    }

    /// Stored credential for outgoing requests: the structured record's
    /// token first, the bare key as fallback. A storage failure clears both
    /// keys and degrades to an unauthenticated request.
    fn current_token(&self) -> Option<String> {
        let record = match self.credentials.load_record() {
            Ok(record) => record,
            Err(err) => {
                warn!("Almacenamiento de credenciales ilegible, limpiando: {err}");
                if let Err(err) = self.credentials.clear() {
                    warn!("No se pudieron limpiar las credenciales: {err}");
                }
                return None;
            }
        };

        if let Some(token) = record.map(|r| r.token).filter(|t| !t.is_empty()) {
            return Some(token);
        }

        match self.credentials.bare_token() {
            Ok(token) => token,
            Err(err) => {
                warn!("Almacenamiento de credenciales ilegible, limpiando: {err}");
                if let Err(err) = self.credentials.clear() {
                    warn!("No se pudieron limpiar las credenciales: {err}");
                }
                None
            }
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.send(Method::DELETE, path, None).await
    }

    /// Log in and persist the credential under both storage keys.
    pub async fn login(&self, usuario: &str, password: &str) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "usuario": usuario, "password": password });
        let response = self.send(Method::POST, "/auth/login", Some(&body)).await?;

        if let Some(token) = response.get("token").and_then(Value::as_str) {
            let record = AuthRecord {
                token: token.to_string(),
                usuario: response.get("usuario").cloned(),
            };
            if let Err(err) = self.credentials.save(&record) {
                warn!("No se pudo guardar la credencial: {err}");
            }
        }
        Ok(response)
    }

    /// Log out: drop both stored keys.
    pub fn logout(&self) -> std::io::Result<()> {
        self.credentials.clear()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        if !Self::is_auth_endpoint(path) {
            if let Some(token) = self.current_token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            return Ok(response.json().await?);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {status}"));

        // Expiry family: at most one redirect per client lifetime; the
        // original failure still reaches the caller.
        self.session.handle_auth_failure(status, &*self.credentials);

        Err(ClientError::Api { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_normalization() {
        assert_eq!(
            ApiClient::api_base("http://localhost:3001"),
            "http://localhost:3001/api"
        );
        assert_eq!(
            ApiClient::api_base("http://localhost:3001///"),
            "http://localhost:3001/api"
        );
        assert_eq!(
            ApiClient::api_base("https://backend.onrender.com/api"),
            "https://backend.onrender.com/api"
        );
        assert_eq!(
            ApiClient::api_base("https://backend.onrender.com/API/"),
            "https://backend.onrender.com/API"
        );
    }

    #[test]
    fn auth_endpoints_are_excluded_from_attachment() {
        assert!(ApiClient::is_auth_endpoint("/auth/login"));
        assert!(ApiClient::is_auth_endpoint("/auth/refresh"));
        assert!(ApiClient::is_auth_endpoint("/v2/auth/login"));
        assert!(!ApiClient::is_auth_endpoint("/proveedores"));
        assert!(!ApiClient::is_auth_endpoint("/productos/auth-labels"));
    }
}
