use super::{same_properties, Entity, EntityKey, KeyValueStore, StoreError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-local store. Clones share the same entities, so threads holding
/// separate clones behave like separate processes against one datastore.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: Arc<Mutex<BTreeMap<EntityKey, Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities().is_empty()
    }

    fn entities(&self) -> MutexGuard<'_, BTreeMap<EntityKey, Map<String, Value>>> {
        self.entities.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        Ok(self
            .entities()
            .get(key)
            .map(|properties| Entity::with_properties(key.clone(), properties.clone())))
    }

    fn put(&self, entity: &Entity) -> Result<(), StoreError> {
        self.entities()
            .insert(entity.key.clone(), entity.properties.clone());
        Ok(())
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        self.entities().remove(key);
        Ok(())
    }

    fn put_if_unchanged(
        &self,
        expected: Option<&Entity>,
        entity: &Entity,
    ) -> Result<bool, StoreError> {
        let mut entities = self.entities();
        if !same_properties(entities.get(&entity.key), expected) {
            return Ok(false);
        }
        entities.insert(entity.key.clone(), entity.properties.clone());
        Ok(true)
    }
}
