//! In-memory user repository.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::auth::password;

/// Stored user. `password_hash` never leaves this module unsanitized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub usuario: String,
    pub nombre: String,
    pub rol: String,
    pub password_hash: String,
    pub activo: bool,
}

impl User {
    /// Serialized form with the secret field stripped.
    pub fn sanitized(&self) -> Value {
        json!({
            "id": self.id,
            "usuario": self.usuario,
            "nombre": self.nombre,
            "rol": self.rol,
            "activo": self.activo,
        })
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub usuario: String,
    pub nombre: String,
    pub rol: String,
    pub password: String,
}

#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write();
        if users.values().any(|u| u.usuario == new_user.usuario) {
            return Err(StoreError::DuplicateUser(new_user.usuario));
        }

        let password_hash =
            password::hash_password(&new_user.password).map_err(StoreError::PasswordHash)?;
        let user = User {
            id: Uuid::new_v4(),
            usuario: new_user.usuario,
            nombre: new_user.nombre,
            rol: new_user.rol,
            password_hash,
            activo: true,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    pub fn find_by_username(&self, usuario: &str) -> Option<User> {
        self.users
            .read()
            .values()
            .find(|u| u.usuario == usuario)
            .cloned()
    }

    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.usuario.cmp(&b.usuario));
        users
    }

    /// Replace mutable fields; a `Some` password re-hashes the credential.
    pub fn update(
        &self,
        id: Uuid,
        nombre: Option<String>,
        rol: Option<String>,
        activo: Option<bool>,
        password: Option<String>,
    ) -> StoreResult<Option<User>> {
        let password_hash = match password {
            Some(p) => Some(password::hash_password(&p).map_err(StoreError::PasswordHash)?),
            None => None,
        };

        let mut users = self.users.write();
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(nombre) = nombre {
            user.nombre = nombre;
        }
        if let Some(rol) = rol {
            user.rol = rol;
        }
        if let Some(activo) = activo {
            user.activo = activo;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.users.write().remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(usuario: &str, rol: &str) -> NewUser {
        NewUser {
            usuario: usuario.to_string(),
            nombre: usuario.to_string(),
            rol: rol.to_string(),
            password: "secreta123".to_string(),
        }
    }

    #[test]
    fn create_and_find() {
        let store = UserStore::new();
        let user = store.create(new_user("bodega", "ALMACEN")).unwrap();

        assert!(user.activo);
        assert!(user.password_hash.starts_with("$argon2"));

        let found = store.find_by_username("bodega").unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_by_username("nadie").is_none());
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let store = UserStore::new();
        store.create(new_user("bodega", "ALMACEN")).unwrap();
        assert!(matches!(
            store.create(new_user("bodega", "ADMIN")),
            Err(StoreError::DuplicateUser(_))
        ));
    }

    #[test]
    fn sanitized_strips_the_hash() {
        let store = UserStore::new();
        let user = store.create(new_user("bodega", "ALMACEN")).unwrap();
        let value = user.sanitized();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["usuario"], "bodega");
    }

    #[test]
    fn update_rehashes_password() {
        let store = UserStore::new();
        let user = store.create(new_user("bodega", "ALMACEN")).unwrap();
        let original_hash = user.password_hash.clone();

        let updated = store
            .update(user.id, None, None, Some(false), Some("nueva456".to_string()))
            .unwrap()
            .unwrap();

        assert!(!updated.activo);
        assert_ne!(updated.password_hash, original_hash);
        assert!(crate::auth::password::verify_password(
            "nueva456",
            &updated.password_hash
        ));
    }
}
