//! Bearer-token issuing and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{normalize_role, permissions_for_role, AuthContext, AuthError};

/// Token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Username
    pub usuario: String,

    /// Role as stored
    pub rol: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Validates and issues HS256 bearer tokens.
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for a user.
    pub fn issue(
        &self,
        user_id: Uuid,
        usuario: &str,
        rol: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            usuario: usuario.to_string(),
            rol: rol.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Validate a token and derive the request identity, including its
    /// permission set.
    pub fn validate(&self, token: &str) -> Result<AuthContext, AuthError> {
        let validation = Validation::default();

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        let claims = token_data.claims;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let rol_normalizado = normalize_role(&claims.rol);

        Ok(AuthContext {
            user_id,
            usuario: claims.usuario,
            rol: claims.rol,
            permisos: permissions_for_role(&rol_normalizado),
            rol_normalizado,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_validator() -> JwtValidator {
        JwtValidator::new(b"secreto-solo-para-pruebas")
    }

    #[test]
    fn test_issue_and_validate() {
        let validator = create_validator();
        let user_id = Uuid::new_v4();

        let token = validator
            .issue(user_id, "bodega", "Almacén", Duration::hours(8))
            .unwrap();

        let context = validator.validate(&token).unwrap();

        assert_eq!(context.user_id, user_id);
        assert_eq!(context.usuario, "bodega");
        assert_eq!(context.rol, "Almacén");
        assert_eq!(context.rol_normalizado, "ALMACEN");
        assert!(context.has_permission("materias-primas"));
        assert!(!context.has_permission("usuarios"));
    }

    #[test]
    fn test_expired_token() {
        let validator = create_validator();

        // -120 seconds to exceed the default 60-second leeway in jsonwebtoken
        let token = validator
            .issue(Uuid::new_v4(), "bodega", "ALMACEN", Duration::seconds(-120))
            .unwrap();

        let result = validator.validate(&token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_validator()
            .issue(Uuid::new_v4(), "bodega", "ALMACEN", Duration::hours(1))
            .unwrap();

        let other = JwtValidator::new(b"otro-secreto");
        assert!(matches!(other.validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let validator = create_validator();
        assert!(matches!(
            validator.validate("no-es-un-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }
}
