//! Authentication middleware for Axum.
//!
//! Extracts the bearer credential from requests and enforces authorization.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::{AuthContext, AuthError, JwtValidator};
use crate::api::ApiError;

/// Auth context extension attached to authenticated requests.
#[derive(Clone)]
pub struct AuthContextExt(pub AuthContext);

/// Authentication middleware configuration/state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub validator: Arc<JwtValidator>,
}

/// Validate the `Authorization` header and attach the identity.
///
/// Only the `Bearer <token>` scheme is accepted; anything else is rejected
/// before any route logic runs.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let context = match authenticate(&state.validator, auth_header) {
        Ok(context) => context,
        Err(e) => return ApiError::from(e).into_response(),
    };

    request.extensions_mut().insert(AuthContextExt(context));
    next.run(request).await
}

fn authenticate(
    validator: &JwtValidator,
    auth_header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingAuth)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?;
    validator.validate(token)
}

/// Capability a route group requires on top of authentication.
#[derive(Clone, Copy)]
pub struct RequiredPermission(pub &'static str);

/// Reject authenticated identities lacking the route's capability.
///
/// Runs after [`auth_middleware`]; a missing identity here means the layer
/// was wired without the gate, which is treated as unauthenticated rather
/// than silently admitted.
pub async fn require_permission(
    State(RequiredPermission(permiso)): State<RequiredPermission>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match request.extensions().get::<AuthContextExt>() {
        Some(AuthContextExt(ctx)) if ctx.has_permission(permiso) => next.run(request).await,
        Some(_) => ApiError::from(AuthError::InsufficientPermissions(permiso)).into_response(),
        None => ApiError::from(AuthError::MissingAuth).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn authenticate_requires_bearer_scheme() {
        let validator = JwtValidator::new(b"secreto-solo-para-pruebas");
        let token = validator
            .issue(Uuid::new_v4(), "bodega", "ALMACEN", Duration::hours(1))
            .unwrap();

        assert!(matches!(
            authenticate(&validator, None),
            Err(AuthError::MissingAuth)
        ));
        assert!(matches!(
            authenticate(&validator, Some(&token)),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            authenticate(&validator, Some(&format!("Token {token}"))),
            Err(AuthError::MalformedHeader)
        ));

        let ctx = authenticate(&validator, Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(ctx.usuario, "bodega");
    }
}
