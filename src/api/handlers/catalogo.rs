//! Pass-through CRUD handlers over the opaque catalog repository.
//!
//! Every business catalog group (proveedores, empaques, cultivos, ...)
//! mounts these handlers with its collection name attached as a request
//! extension; the permission layer runs before any of them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::api::ApiError;
use crate::server::AppState;

/// Collection a catalog route group operates on.
#[derive(Clone, Copy)]
pub struct Collection(pub &'static str);

fn parse_id(collection: &str, id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id)
        .map_err(|_| ApiError::bad_request(format!("Identificador inválido en {collection}: {id}")))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.catalog.list(collection)?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(collection, &id)?;
    state
        .catalog
        .get(collection, id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(collection, id))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Json(doc): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let doc = state.catalog.insert(collection, doc)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Path(id): Path<String>,
    Json(doc): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(collection, &id)?;
    state
        .catalog
        .replace(collection, id, doc)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(collection, id))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(collection, &id)?;
    if state.catalog.remove(collection, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(collection, id))
    }
}
