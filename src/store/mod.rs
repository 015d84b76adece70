//! Opaque CRUD repositories for the business entities.
//!
//! The route handlers only see the [`Catalog`] trait; the in-memory
//! implementation here is enough to boot the server and exercise every
//! route. Swapping in a relational backend means implementing the same
//! trait, nothing above this module changes.

mod users;

pub use users::*;

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("el documento debe ser un objeto JSON")]
    NotAnObject,

    #[error("el usuario '{0}' ya existe")]
    DuplicateUser(String),

    #[error("error de hash de contraseña: {0}")]
    PasswordHash(String),
}

/// Generic CRUD repository over named collections of JSON documents.
pub trait Catalog: Send + Sync + 'static {
    fn list(&self, collection: &str) -> StoreResult<Vec<Value>>;
    fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Value>>;
    fn insert(&self, collection: &str, doc: Value) -> StoreResult<Value>;
    fn replace(&self, collection: &str, id: Uuid, doc: Value) -> StoreResult<Option<Value>>;
    /// Insert-or-replace under a caller-chosen id.
    fn put(&self, collection: &str, id: Uuid, doc: Value) -> StoreResult<Value>;
    fn remove(&self, collection: &str, id: Uuid) -> StoreResult<bool>;
}

/// In-memory [`Catalog`]. Collections are created on first use; documents
/// are keyed by a generated `id` field.
#[derive(Default)]
pub struct MemoryCatalog {
    collections: RwLock<HashMap<String, BTreeMap<Uuid, Value>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp(mut doc: Value, id: Uuid) -> StoreResult<Value> {
        let obj = doc.as_object_mut().ok_or(StoreError::NotAnObject)?;
        obj.insert("id".to_string(), Value::String(id.to_string()));
        Ok(doc)
    }
}

impl Catalog for MemoryCatalog {
    fn list(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Value>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    fn insert(&self, collection: &str, doc: Value) -> StoreResult<Value> {
        let id = Uuid::new_v4();
        let doc = Self::stamp(doc, id)?;
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());
        Ok(doc)
    }

    fn replace(&self, collection: &str, id: Uuid, doc: Value) -> StoreResult<Option<Value>> {
        let doc = Self::stamp(doc, id)?;
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        if !docs.contains_key(&id) {
            return Ok(None);
        }
        docs.insert(id, doc.clone());
        Ok(Some(doc))
    }

    fn put(&self, collection: &str, id: Uuid, doc: Value) -> StoreResult<Value> {
        let doc = Self::stamp(doc, id)?;
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());
        Ok(doc)
    }

    fn remove(&self, collection: &str, id: Uuid) -> StoreResult<bool> {
        let mut collections = self.collections.write();
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(&id).is_some())
            .unwrap_or(false))
    }
}
