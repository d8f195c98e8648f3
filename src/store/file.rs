use super::{same_properties, Entity, EntityKey, KeyValueStore, StoreError};
use crate::shared::fs_atomic::atomic_write_file;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

const GUARD_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// A guard is held only for one read and one write; anything older was left
/// by a process that died while holding it.
pub const STALE_GUARD_AGE: Duration = Duration::from_secs(10);

/// One JSON file per entity at `<root>/<namespace>/<kind>/<name>.json`.
/// Every write to an entity, conditional or not, runs under a sibling
/// `.json.guard` file created with `create_new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(storage_path: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            root: storage_path.as_ref().join(sanitize_component(namespace)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entity_path(&self, key: &EntityKey) -> PathBuf {
        self.root
            .join(sanitize_component(&key.kind))
            .join(format!("{}.json", sanitize_component(&key.name)))
    }

    fn read_properties(&self, path: &Path) -> Result<Option<Map<String, Value>>, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(path, source)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| json_error(path, source))
    }

    fn write_properties(&self, path: &Path, properties: &Map<String, Value>) -> Result<(), StoreError> {
        let body =
            serde_json::to_vec_pretty(properties).map_err(|source| json_error(path, source))?;
        atomic_write_file(path, &body).map_err(|source| io_error(path, source))
    }

    pub fn guard_path(&self, key: &EntityKey) -> PathBuf {
        self.entity_path(key).with_extension("json.guard")
    }

    /// Waits without bound for the guard, reclaiming one that has outlived
    /// `STALE_GUARD_AGE`.
    fn acquire_guard(&self, key: &EntityKey) -> Result<WriteGuard, StoreError> {
        let guard_path = self.guard_path(key);
        if let Some(parent) = guard_path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        loop {
            match fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&guard_path)
            {
                Ok(_) => return Ok(WriteGuard { path: guard_path }),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&guard_path) {
                        match fs::remove_file(&guard_path) {
                            Ok(()) => continue,
                            Err(err) if err.kind() == ErrorKind::NotFound => continue,
                            Err(source) => return Err(io_error(&guard_path, source)),
                        }
                    }
                    thread::sleep(GUARD_POLL_INTERVAL);
                }
                Err(source) => return Err(io_error(&guard_path, source)),
            }
        }
    }
}

fn is_stale(guard_path: &Path) -> bool {
    fs::metadata(guard_path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= STALE_GUARD_AGE)
}

struct WriteGuard {
    path: PathBuf,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        let path = self.entity_path(key);
        Ok(self
            .read_properties(&path)?
            .map(|properties| Entity::with_properties(key.clone(), properties)))
    }

    fn put(&self, entity: &Entity) -> Result<(), StoreError> {
        let path = self.entity_path(&entity.key);
        let _guard = self.acquire_guard(&entity.key)?;
        self.write_properties(&path, &entity.properties)
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        let path = self.entity_path(key);
        let _guard = self.acquire_guard(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(&path, source)),
        }
    }

    fn put_if_unchanged(
        &self,
        expected: Option<&Entity>,
        entity: &Entity,
    ) -> Result<bool, StoreError> {
        let path = self.entity_path(&entity.key);
        let _guard = self.acquire_guard(&entity.key)?;
        let current = self.read_properties(&path)?;
        if !same_properties(current.as_ref(), expected) {
            return Ok(false);
        }
        self.write_properties(&path, &entity.properties)?;
        Ok(true)
    }
}

fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn json_error(path: &Path, source: serde_json::Error) -> StoreError {
    StoreError::Json {
        path: path.display().to_string(),
        source,
    }
}
