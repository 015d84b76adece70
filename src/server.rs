//! HTTP server bootstrap for the inventario API.
//!
//! This module wires together:
//! - configuration
//! - the origin policy (CORS gate)
//! - the JWT validator and user repository
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::api::{self, ApiError};
use crate::auth::{auth_middleware, AuthMiddlewareState, JwtValidator};
use crate::cors::{origin_middleware, OriginPolicy};
use crate::store::{Catalog, MemoryCatalog, NewUser, UserStore};

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Environment name (echoed by `/api/__ping`).
    pub environment: Option<String>,
    /// Deployed commit (echoed by `/api/__ping`).
    pub commit: Option<String>,
    /// Comma-separated explicit CORS origins.
    pub cors_origins: Vec<String>,
    /// Deployment platform external URL hints.
    pub render_external_url: Option<String>,
    pub vercel_url: Option<String>,
    /// HMAC secret for bearer tokens.
    pub jwt_secret: String,
    /// Seeds the initial `admin` user when present.
    pub admin_password: Option<String>,
    /// Enables `/api/__headers` and `/api/__whoami`.
    pub debug_routes: bool,
    /// Enables the regex pattern set in the origin policy.
    pub pattern_matching: bool,
    /// Relaxed policy for materias-primas reads: any authenticated
    /// role, not just holders of the `materias-primas` permission.
    pub mp_read_relaxed: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Dirección de escucha inválida: {e}"))?;

        let environment = std::env::var("APP_ENV").ok().filter(|v| !v.is_empty());

        let commit = std::env::var("RENDER_GIT_COMMIT")
            .or_else(|_| std::env::var("VERCEL_GIT_COMMIT_SHA"))
            .ok()
            .filter(|v| !v.is_empty());

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let render_external_url = std::env::var("RENDER_EXTERNAL_URL").ok().filter(|v| !v.is_empty());
        let vercel_url = std::env::var("VERCEL_URL").ok().filter(|v| !v.is_empty());

        let is_dev = matches!(
            environment.as_deref(),
            None | Some("dev") | Some("development")
        );
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if is_dev => {
                warn!("JWT_SECRET no configurado; usando un secreto de desarrollo");
                "secreto-de-desarrollo".to_string()
            }
            _ => anyhow::bail!("JWT_SECRET es obligatorio fuera de desarrollo"),
        };

        let admin_password = std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

        Ok(Self {
            listen_addr,
            environment,
            commit,
            cors_origins,
            render_external_url,
            vercel_url,
            jwt_secret,
            admin_password,
            debug_routes: env_flag("DEBUG_ROUTES", true),
            pattern_matching: env_flag("CORS_PATTERN_MATCHING", true),
            mp_read_relaxed: env_flag("MP_READ_RELAXED", true),
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off"))
        .unwrap_or(default)
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub users: Arc<UserStore>,
    pub jwt: Arc<JwtValidator>,
    pub origin_policy: Arc<OriginPolicy>,
    pub environment: Option<String>,
    pub commit: Option<String>,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Iniciando inventario-api v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!("Configuración cargada");
    info!("  Dirección de escucha: {}", config.listen_addr);
    info!(
        "  Entorno: {}",
        config.environment.as_deref().unwrap_or("development")
    );

    let origin_policy = Arc::new(OriginPolicy::from_config(&config));
    info!(
        "CORS orígenes permitidos: {}",
        origin_policy.allowlist().join(", ")
    );

    let jwt = Arc::new(JwtValidator::new(config.jwt_secret.as_bytes()));

    let users = Arc::new(UserStore::new());
    match &config.admin_password {
        Some(password) => {
            users.create(NewUser {
                usuario: "admin".to_string(),
                nombre: "Administrador".to_string(),
                rol: "ADMIN".to_string(),
                password: password.clone(),
            })?;
            info!("Usuario admin inicial configurado");
        }
        None => warn!("Sin usuarios iniciales; configure ADMIN_PASSWORD para crear el admin"),
    }

    let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());

    let state = AppState {
        catalog,
        users,
        jwt: jwt.clone(),
        origin_policy: origin_policy.clone(),
        environment: config.environment.clone(),
        commit: config.commit.clone(),
    };

    let auth_state = AuthMiddlewareState { validator: jwt };

    let app = build_router(&config, auth_state, origin_policy).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Servidor corriendo en {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Compose the full application router.
///
/// The origin gate is the outermost layer so that every request, including
/// preflights and unmatched routes, passes through the same policy decision.
pub fn build_router(
    config: &Config,
    auth_state: AuthMiddlewareState,
    origin_policy: Arc<OriginPolicy>,
) -> Router<AppState> {
    let api = api::api_router(config, auth_state.clone());

    // Alias adicional sin /api para herramientas manuales
    let stock_alias = api::stock_pt_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    Router::new()
        .nest("/api", api)
        .nest("/stock-pt", stock_alias)
        .route("/healthz", get(healthz))
        .route("/", get(root))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            origin_policy,
            origin_middleware,
        ))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn root() -> &'static str {
    "API funcionando 🚀"
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method,
        path: uri.to_string(),
    }
}
