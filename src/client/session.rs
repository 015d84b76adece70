//! Session-expiry detection and the one-shot redirect latch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::StatusCode;
use tracing::warn;

use super::credentials::CredentialStore;

/// Path of the login screen; a failure observed there never redirects.
pub const LOGIN_PATH: &str = "/login";

/// Where an expired session lands.
pub const EXPIRED_LOGIN_URL: &str = "/login?expired=1";

/// Navigation surface of the host environment.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn replace(&self, url: &str);
}

/// Guards the session-expiry redirect.
///
/// The latch is set-once and never reset for the lifetime of the client:
/// many requests may be in flight when a token expires, and exactly one of
/// them must trigger the navigation.
pub struct SessionGuard {
    redirecting: AtomicBool,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            redirecting: AtomicBool::new(false),
            navigator,
        }
    }

    /// Statuses of the authentication/authorization/session-expired family.
    pub fn is_expiry_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 401 | 403 | 419)
    }

    /// Inspect a response status. Returns `true` when this call performed
    /// the redirect (at most once per guard).
    pub fn handle_auth_failure(
        &self,
        status: StatusCode,
        credentials: &dyn CredentialStore,
    ) -> bool {
        if !Self::is_expiry_status(status) {
            return false;
        }
        if self.navigator.current_path() == LOGIN_PATH {
            return false;
        }
        if self.redirecting.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Err(err) = credentials.clear() {
            warn!("No se pudieron limpiar las credenciales: {err}");
        }
        self.navigator.replace(EXPIRED_LOGIN_URL);
        true
    }
}
