//! Authentication and authorization for the inventario API.
//!
//! Protected routes sit behind two middleware layers:
//!
//! - [`auth_middleware`] validates the bearer credential and attaches the
//!   request-scoped identity ([`AuthContext`]) to the request extensions;
//! - [`require_permission`] rejects identities whose permission set lacks
//!   the route's required capability.
//!
//! A route group wired with only the first layer is the "relaxed" policy
//! variant: any authenticated identity is admitted regardless of role.
//!
//! # Authorization Model
//!
//! The permission set is a pure function of the normalized role; it is
//! computed per request and never cached or persisted.
//!
//! # Configuration
//!
//! - `JWT_SECRET`: HMAC secret for bearer tokens
//! - `ADMIN_PASSWORD`: seeds the initial admin user
//! - `MP_READ_RELAXED`: wires the relaxed variant for materias-primas reads

mod jwt;
mod middleware;
pub mod password;

pub use jwt::*;
pub use middleware::*;

use uuid::Uuid;

/// Authenticated identity, derived from a valid credential.
///
/// Exists only for the duration of one request. Never carries the stored
/// password hash.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID from the token's subject claim.
    pub user_id: Uuid,

    /// Username.
    pub usuario: String,

    /// Role exactly as stored.
    pub rol: String,

    /// Role normalized for permission lookup (trimmed, uppercased,
    /// accents folded).
    pub rol_normalizado: String,

    /// Capabilities derived from the normalized role.
    pub permisos: &'static [&'static str],
}

impl AuthContext {
    /// Check whether this identity holds a capability.
    pub fn has_permission(&self, permiso: &str) -> bool {
        self.permisos.contains(&permiso)
    }
}

/// Normalize a stored role for permission lookup.
pub fn normalize_role(rol: &str) -> String {
    rol.trim()
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' => 'U',
            _ => c,
        })
        .collect()
}

/// Permission set for a normalized role.
///
/// Pure function: same role in, same capabilities out. Unknown roles get an
/// empty set and can only reach relaxed routes.
pub fn permissions_for_role(rol_normalizado: &str) -> &'static [&'static str] {
    match rol_normalizado {
        "ADMIN" => &[
            "usuarios",
            "proveedores",
            "materias-primas",
            "lotes-materia-prima",
            "movimientos-mp",
            "empaques",
            "pt",
            "produccion",
            "recetas",
            "categorias-receta",
            "productos",
            "cultivos",
        ],
        "ALMACEN" => &[
            "proveedores",
            "materias-primas",
            "lotes-materia-prima",
            "movimientos-mp",
            "empaques",
            "pt",
        ],
        "PRODUCCION" => &[
            "produccion",
            "recetas",
            "categorias-receta",
            "productos",
            "pt",
            "cultivos",
        ],
        _ => &[],
    }
}

/// Authentication error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("falta el encabezado Authorization")]
    MissingAuth,

    #[error("credencial malformada")]
    MalformedHeader,

    #[error("token inválido")]
    InvalidToken,

    #[error("sesión expirada")]
    TokenExpired,

    #[error("permiso insuficiente: {0}")]
    InsufficientPermissions(&'static str),
}
