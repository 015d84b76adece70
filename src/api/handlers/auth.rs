//! Login and token refresh.
//!
//! These routes sit outside the authentication gate; the client never
//! attaches a bearer credential to them.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ApiError;
use crate::server::AppState;

/// Token lifetime issued on login and refresh.
const TOKEN_TTL_HOURS: i64 = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub usuario: String,
    pub password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let invalid = || ApiError::Unauthenticated {
        message: "Usuario o contraseña inválidos".to_string(),
    };

    let user = state.users.find_by_username(&req.usuario).ok_or_else(invalid)?;
    if !user.activo || !crate::auth::password::verify_password(&req.password, &user.password_hash) {
        return Err(invalid());
    }

    let token = state
        .jwt
        .issue(user.id, &user.usuario, &user.rol, Duration::hours(TOKEN_TTL_HOURS))
        .map_err(ApiError::from)?;

    Ok(Json(json!({
        "token": token,
        "usuario": user.sanitized(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<Value>, ApiError> {
    let ctx = state.jwt.validate(&req.token).map_err(ApiError::from)?;
    let token = state
        .jwt
        .issue(
            ctx.user_id,
            &ctx.usuario,
            &ctx.rol,
            Duration::hours(TOKEN_TTL_HOURS),
        )
        .map_err(ApiError::from)?;

    Ok(Json(json!({ "token": token })))
}
