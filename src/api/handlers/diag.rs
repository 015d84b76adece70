//! Diagnostic and debug endpoints.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::AuthContextExt;
use crate::server::AppState;

/// Liveness plus the effective allowed-origin list.
pub async fn ping(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339(),
        "env": state.environment,
        "commit": state.commit,
        "origins": state.origin_policy.allowlist(),
    }))
}

/// Echo the request headers (CORS debugging).
pub async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<no-utf8>").to_string(),
            )
        })
        .collect();
    Json(json!({ "headers": headers }))
}

/// Echo the authenticated identity and its permission set. The stored
/// secret never appears here: the identity is derived from claims alone.
pub async fn whoami(Extension(AuthContextExt(ctx)): Extension<AuthContextExt>) -> Json<Value> {
    Json(json!({
        "id": ctx.user_id,
        "usuario": ctx.usuario,
        "rol": ctx.rol,
        "rol_normalizado": ctx.rol_normalizado,
        "permisos": ctx.permisos,
    }))
}
