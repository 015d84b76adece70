//! API layer: route composition and handlers.

mod error;
pub mod handlers;

pub use error::ApiError;

use axum::routing::{get, post, put};
use axum::{middleware, Extension, Router};

use crate::auth::{auth_middleware, require_permission, AuthMiddlewareState, RequiredPermission};
use crate::server::{AppState, Config};

use handlers::catalogo::{self, Collection};

/// Build the `/api` router: business route groups behind the authentication
/// gate, auth endpoints and diagnostics outside it.
pub fn api_router(config: &Config, auth_state: AuthMiddlewareState) -> Router<AppState> {
    // Alias que espera el frontend (con /api)
    let mut protegido = Router::new()
        .nest("/stock-pt", stock_pt_router())
        // API formal de PT
        .nest("/pt", catalog_router("pt", "pt"))
        .nest("/empaques", catalog_router("empaques", "empaques"))
        .nest("/produccion", catalog_router("produccion", "produccion"))
        .nest("/productos", catalog_router("productos", "productos"))
        .nest("/recetas", recetas_router())
        .nest(
            "/categorias-receta",
            catalog_router("categorias-receta", "categorias-receta"),
        )
        .nest("/cultivos", catalog_router("cultivos", "cultivos"))
        .nest("/proveedores", catalog_router("proveedores", "proveedores"))
        .nest("/usuarios", handlers::usuarios::router())
        .nest(
            "/materias-primas",
            materias_primas_router(config.mp_read_relaxed),
        )
        .nest(
            "/lotes-materia-prima",
            catalog_router("lotes-materia-prima", "lotes-materia-prima"),
        )
        .nest(
            "/movimientos-mp",
            catalog_router("movimientos-mp", "movimientos-mp"),
        );

    if config.debug_routes {
        protegido = protegido.route("/__whoami", get(handlers::diag::whoami));
    }

    let protegido = protegido.layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let mut api = Router::new()
        .merge(protegido)
        .nest("/auth", handlers::auth::router())
        .route("/__ping", get(handlers::diag::ping));

    if config.debug_routes {
        api = api.route("/__headers", get(handlers::diag::echo_headers));
    }

    api
}

/// Standard catalog group: full CRUD, one capability for every operation.
fn catalog_router(collection: &'static str, permiso: &'static str) -> Router<AppState> {
    Router::new()
        .route("/", get(catalogo::list).post(catalogo::create))
        .route(
            "/:id",
            get(catalogo::get_one)
                .put(catalogo::replace)
                .delete(catalogo::remove),
        )
        .layer(middleware::from_fn_with_state(
            RequiredPermission(permiso),
            require_permission,
        ))
        .layer(Extension(Collection(collection)))
}

/// Read-only stock view over the `pt` collection, mounted at
/// `/api/stock-pt` and aliased at the root `/stock-pt`.
pub fn stock_pt_router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalogo::list))
        .route("/:id", get(catalogo::get_one))
        .layer(middleware::from_fn_with_state(
            RequiredPermission("pt"),
            require_permission,
        ))
        .layer(Extension(Collection("pt")))
}

/// Materias primas: writes always require the capability; reads are wired
/// relaxed (authenticated-only) or standard depending on configuration.
fn materias_primas_router(lectura_relajada: bool) -> Router<AppState> {
    let lectura = Router::new()
        .route("/", get(catalogo::list))
        .route("/:id", get(catalogo::get_one));
    let lectura = if lectura_relajada {
        lectura
    } else {
        lectura.layer(middleware::from_fn_with_state(
            RequiredPermission("materias-primas"),
            require_permission,
        ))
    };

    let escritura = Router::new()
        .route("/", post(catalogo::create))
        .route("/:id", put(catalogo::replace).delete(catalogo::remove))
        .layer(middleware::from_fn_with_state(
            RequiredPermission("materias-primas"),
            require_permission,
        ));

    lectura
        .merge(escritura)
        .layer(Extension(Collection("materias-primas")))
}

/// Recetas: catalog CRUD plus the receta→producto mapping group, both under
/// the same prefix.
fn recetas_router() -> Router<AppState> {
    let mapa = Router::new()
        .route(
            "/:id/productos",
            get(handlers::recetas::productos_de_receta).put(handlers::recetas::asignar_productos),
        )
        .layer(middleware::from_fn_with_state(
            RequiredPermission("recetas"),
            require_permission,
        ));

    catalog_router("recetas", "recetas").merge(mapa)
}
