//! Key-value entity storage shared by workflow records and lock records.
//!
//! Every backend stores flat JSON property maps addressed by `kind` + `name`
//! inside a namespace fixed at construction.

use serde_json::{Map, Value};

pub mod datastore;
pub mod file;
pub mod memory;

pub use datastore::DatastoreStore;
pub use file::FileStore;
pub use memory::MemoryStore;

pub const DEFAULT_NAMESPACE: &str = "github-actions";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("datastore request failed: {0}")]
    Request(String),
    #[error("datastore responded with status {status}: {message}")]
    Response { status: u16, message: String },
    #[error("datastore returned a malformed entity: {0}")]
    MalformedEntity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub kind: String,
    pub name: String,
}

impl EntityKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub key: EntityKey,
    pub properties: Map<String, Value>,
}

impl Entity {
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            properties: Map::new(),
        }
    }

    pub fn with_properties(key: EntityKey, properties: Map<String, Value>) -> Self {
        Self { key, properties }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// String property, treating JSON null and empty strings as unset.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }
}

pub trait KeyValueStore {
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError>;

    fn put(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &EntityKey) -> Result<(), StoreError>;

    /// Writes `entity` only if the stored record for its key still matches
    /// `expected` (`None` meaning "absent"). Returns whether the write landed.
    fn put_if_unchanged(&self, expected: Option<&Entity>, entity: &Entity)
        -> Result<bool, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, entity: &Entity) -> Result<(), StoreError> {
        (**self).put(entity)
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn put_if_unchanged(
        &self,
        expected: Option<&Entity>,
        entity: &Entity,
    ) -> Result<bool, StoreError> {
        (**self).put_if_unchanged(expected, entity)
    }
}

fn same_properties(current: Option<&Map<String, Value>>, expected: Option<&Entity>) -> bool {
    match (current, expected) {
        (None, None) => true,
        (Some(current), Some(expected)) => current == &expected.properties,
        _ => false,
    }
}
