//! Uniform error responder.
//!
//! Every error crossing the route boundary is one of these kinds; dispatch
//! happens on the enum tag, never on message text. The Spanish message is
//! only the user-visible `message` field of the JSON body.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::store::StoreError;

/// API error taxonomy.
#[derive(Debug)]
pub enum ApiError {
    /// Cross-origin request from a non-allowlisted, non-pattern origin.
    OriginDenied { origin: String },

    /// Missing, malformed, invalid or expired credential.
    Unauthenticated { message: String },

    /// Valid credential, insufficient permission.
    Forbidden { required: String },

    /// No route matches method+path.
    RouteNotFound { method: Method, path: String },

    /// No document with the given id in the collection.
    ResourceNotFound { resource: String, id: String },

    /// Malformed input.
    BadRequest { message: String },

    /// Anything unrecovered from a downstream handler.
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::OriginDenied { .. } => StatusCode::FORBIDDEN,
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::OriginDenied { origin } => {
                format!("CORS: Origin {origin} no permitido")
            }
            ApiError::Unauthenticated { message } => message.clone(),
            ApiError::Forbidden { required } => {
                format!("Permiso insuficiente: se requiere '{required}'")
            }
            ApiError::RouteNotFound { method, path } => {
                format!("Ruta no encontrada: {method} {path}")
            }
            ApiError::ResourceNotFound { resource, id } => {
                format!("{resource} no encontrado: {id}")
            }
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Internal { message } => message.clone(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl std::fmt::Display) -> Self {
        ApiError::ResourceNotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self.message());
        }
        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => ApiError::Unauthenticated {
                message: "No autenticado".to_string(),
            },
            AuthError::MalformedHeader => ApiError::Unauthenticated {
                message: "Credencial malformada".to_string(),
            },
            AuthError::InvalidToken => ApiError::Unauthenticated {
                message: "Token inválido".to_string(),
            },
            AuthError::TokenExpired => ApiError::Unauthenticated {
                message: "Sesión expirada".to_string(),
            },
            AuthError::InsufficientPermissions(permiso) => ApiError::Forbidden {
                required: permiso.to_string(),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotAnObject => ApiError::bad_request(err.to_string()),
            StoreError::DuplicateUser(_) => ApiError::bad_request(err.to_string()),
            StoreError::PasswordHash(_) => ApiError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let denied = ApiError::OriginDenied {
            origin: "https://evil.example.com".to_string(),
        };
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            denied.message(),
            "CORS: Origin https://evil.example.com no permitido"
        );

        assert_eq!(
            ApiError::from(AuthError::TokenExpired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InsufficientPermissions("usuarios")).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn route_not_found_message_format() {
        let err = ApiError::RouteNotFound {
            method: Method::GET,
            path: "/api/does-not-exist".to_string(),
        };
        assert_eq!(
            err.message(),
            "Ruta no encontrada: GET /api/does-not-exist"
        );
    }
}
