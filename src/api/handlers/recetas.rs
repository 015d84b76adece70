//! Receta→producto mapping routes, mounted under the same `/recetas`
//! prefix as the catalog CRUD group.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::ApiError;
use crate::server::AppState;

const MAP_COLLECTION: &str = "receta-producto-map";

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id)
        .map_err(|_| ApiError::bad_request(format!("Identificador inválido en recetas: {id}")))
}

/// Products assigned to a recipe; an unassigned recipe yields an empty list.
pub async fn productos_de_receta(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if state.catalog.get("recetas", id)?.is_none() {
        return Err(ApiError::not_found("recetas", id));
    }

    let productos = state
        .catalog
        .get(MAP_COLLECTION, id)?
        .and_then(|doc| doc.get("productos").cloned())
        .unwrap_or_else(|| json!([]));
    Ok(Json(productos))
}

/// Replace the product assignment of a recipe.
pub async fn asignar_productos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(productos): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    if state.catalog.get("recetas", id)?.is_none() {
        return Err(ApiError::not_found("recetas", id));
    }
    if !productos.is_array() {
        return Err(ApiError::bad_request(
            "Se esperaba una lista de productos".to_string(),
        ));
    }

    let doc = state
        .catalog
        .put(MAP_COLLECTION, id, json!({ "productos": productos }))?;
    Ok(Json(doc["productos"].clone()))
}
