//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use inventario_api::auth::{AuthMiddlewareState, JwtValidator};
use inventario_api::cors::OriginPolicy;
use inventario_api::server::{build_router, AppState, Config};
use inventario_api::store::{Catalog, MemoryCatalog, NewUser, UserStore};

/// Origin present in the test allowlist.
pub const ALLOWED_ORIGIN: &str = "https://inventario.example.com";

/// Origin matching no allowlist entry and no pattern.
pub const EVIL_ORIGIN: &str = "https://evil.example.com";

pub const ADMIN_PASSWORD: &str = "admin-secreta-123";
pub const BODEGA_PASSWORD: &str = "bodega-secreta-123";
pub const PRODUCCION_PASSWORD: &str = "produccion-secreta-123";

/// Configuration for the superset deployment variant: debug routes on,
/// pattern matching on, relaxed materias-primas reads.
pub fn test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        environment: Some("test".to_string()),
        commit: None,
        cors_origins: vec![ALLOWED_ORIGIN.to_string()],
        render_external_url: None,
        vercel_url: None,
        jwt_secret: "secreto-solo-para-pruebas".to_string(),
        admin_password: None,
        debug_routes: true,
        pattern_matching: true,
        mp_read_relaxed: true,
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<UserStore>,
    pub jwt: Arc<JwtValidator>,
    pub catalog: Arc<dyn Catalog>,
}

/// Build the full application router with three seeded users covering the
/// role matrix: admin, warehouse, production.
pub fn build_test_app(config: &Config) -> TestApp {
    let jwt = Arc::new(JwtValidator::new(config.jwt_secret.as_bytes()));

    let users = Arc::new(UserStore::new());
    users
        .create(NewUser {
            usuario: "admin".to_string(),
            nombre: "Administrador".to_string(),
            rol: "ADMIN".to_string(),
            password: ADMIN_PASSWORD.to_string(),
        })
        .unwrap();
    users
        .create(NewUser {
            usuario: "bodega".to_string(),
            nombre: "Encargado de bodega".to_string(),
            rol: "Almacén".to_string(),
            password: BODEGA_PASSWORD.to_string(),
        })
        .unwrap();
    users
        .create(NewUser {
            usuario: "planta".to_string(),
            nombre: "Jefe de producción".to_string(),
            rol: "Producción".to_string(),
            password: PRODUCCION_PASSWORD.to_string(),
        })
        .unwrap();

    let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());
    let origin_policy = Arc::new(OriginPolicy::from_config(config));

    let state = AppState {
        catalog: catalog.clone(),
        users: users.clone(),
        jwt: jwt.clone(),
        origin_policy: origin_policy.clone(),
        environment: config.environment.clone(),
        commit: config.commit.clone(),
    };

    let auth_state = AuthMiddlewareState {
        validator: jwt.clone(),
    };

    let router = build_router(config, auth_state, origin_policy).with_state(state);

    TestApp {
        router,
        users,
        jwt,
        catalog,
    }
}

/// Issue a valid one-hour token for a seeded user.
pub fn token_for(app: &TestApp, usuario: &str) -> String {
    let user = app.users.find_by_username(usuario).unwrap();
    app.jwt
        .issue(user.id, &user.usuario, &user.rol, chrono::Duration::hours(1))
        .unwrap()
}

/// Issue a token expired well past the validation leeway.
pub fn expired_token_for(app: &TestApp, usuario: &str) -> String {
    let user = app.users.find_by_username(usuario).unwrap();
    app.jwt
        .issue(
            user.id,
            &user.usuario,
            &user.rol,
            chrono::Duration::seconds(-120),
        )
        .unwrap()
}

/// Send a request through the router and decode the response.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    origin: Option<&str>,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, headers, value)
}

/// Shorthand for an authenticated same-host request.
pub async fn send_as(
    router: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _headers, value) = send(router, method, uri, None, Some(token), body).await;
    (status, value)
}
