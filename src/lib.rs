//! Inventario API
//!
//! Backend y cliente HTTP para la aplicación de control de inventario y
//! producción: proveedores, materias primas, lotes y movimientos, recetas,
//! producto terminado (PT), empaques, cultivos y usuarios.
//!
//! ## Modules
//!
//! - [`server`] - Server bootstrap: configuration, router composition, startup
//! - [`cors`] - Origin allowlist/pattern policy and the CORS gate middleware
//! - [`auth`] - Bearer-token authentication, roles and permission checks
//! - [`api`] - REST routes, handlers and the uniform error responder
//! - [`store`] - Opaque CRUD repositories (in-memory implementations)
//! - [`client`] - HTTP client wrapper with credential attachment and
//!   session-expiry redirect handling

pub mod api;
pub mod auth;
pub mod client;
pub mod cors;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use api::ApiError;
pub use auth::{AuthContext, AuthError, JwtValidator};
pub use cors::OriginPolicy;
pub use server::{AppState, Config};
