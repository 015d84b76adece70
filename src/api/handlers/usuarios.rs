//! User management routes.
//!
//! Requires the `usuarios` capability. Every response is sanitized: the
//! stored password hash never crosses the route boundary.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::ApiError;
use crate::auth::{require_permission, RequiredPermission};
use crate::server::AppState;
use crate::store::NewUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(remove))
        .layer(middleware::from_fn_with_state(
            RequiredPermission("usuarios"),
            require_permission,
        ))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id)
        .map_err(|_| ApiError::bad_request(format!("Identificador inválido en usuarios: {id}")))
}

async fn list(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.users.list().iter().map(|u| u.sanitized()).collect())
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    state
        .users
        .get(id)
        .map(|u| Json(u.sanitized()))
        .ok_or_else(|| ApiError::not_found("usuarios", id))
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    usuario: String,
    nombre: String,
    rol: String,
    password: String,
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.users.create(NewUser {
        usuario: req.usuario,
        nombre: req.nombre,
        rol: req.rol,
        password: req.password,
    })?;
    Ok((StatusCode::CREATED, Json(user.sanitized())))
}

#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    nombre: Option<String>,
    rol: Option<String>,
    activo: Option<bool>,
    password: Option<String>,
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    state
        .users
        .update(id, req.nombre, req.rol, req.activo, req.password)?
        .map(|u| Json(u.sanitized()))
        .ok_or_else(|| ApiError::not_found("usuarios", id))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.users.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("usuarios", id))
    }
}
