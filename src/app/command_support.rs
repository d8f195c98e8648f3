use crate::canvas::{CanvasRepository, CanvasService};
use crate::channels::slack::SlackApiClient;
use crate::config::{GithubSettings, Settings, StoreBackend, StoreSettings};
use crate::github::{GithubClient, GithubError, Repository};
use crate::shared::logging::EventLog;
use crate::store::{
    DatastoreStore, Entity, EntityKey, FileStore, KeyValueStore, MemoryStore, StoreError,
};

/// Store backend chosen at runtime from `store.backend`.
#[derive(Debug, Clone)]
pub enum AnyStore {
    File(FileStore),
    Datastore(DatastoreStore),
    Memory(MemoryStore),
}

impl KeyValueStore for AnyStore {
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        match self {
            Self::File(store) => store.get(key),
            Self::Datastore(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn put(&self, entity: &Entity) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.put(entity),
            Self::Datastore(store) => store.put(entity),
            Self::Memory(store) => store.put(entity),
        }
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.delete(key),
            Self::Datastore(store) => store.delete(key),
            Self::Memory(store) => store.delete(key),
        }
    }

    fn put_if_unchanged(
        &self,
        expected: Option<&Entity>,
        entity: &Entity,
    ) -> Result<bool, StoreError> {
        match self {
            Self::File(store) => store.put_if_unchanged(expected, entity),
            Self::Datastore(store) => store.put_if_unchanged(expected, entity),
            Self::Memory(store) => store.put_if_unchanged(expected, entity),
        }
    }
}

pub fn open_store(settings: &StoreSettings) -> Result<AnyStore, String> {
    match settings.backend {
        StoreBackend::File => Ok(AnyStore::File(FileStore::new(
            &settings.storage_path,
            &settings.namespace,
        ))),
        StoreBackend::Datastore => {
            let project_id = settings
                .project_id
                .clone()
                .ok_or_else(|| "datastore backend requires DATASTORE_PROJECT_ID".to_string())?;
            let access_token = settings
                .access_token
                .clone()
                .ok_or_else(|| "datastore backend requires DATASTORE_ACCESS_TOKEN".to_string())?;
            Ok(AnyStore::Datastore(DatastoreStore::new(
                settings.api_base.clone(),
                project_id,
                settings.namespace.clone(),
                access_token,
            )))
        }
        StoreBackend::Memory => Ok(AnyStore::Memory(MemoryStore::new())),
    }
}

pub fn canvas_service(
    settings: &Settings,
    log: &EventLog,
) -> Result<CanvasService<AnyStore, SlackApiClient>, String> {
    settings.require_slack_token().map_err(|e| e.to_string())?;
    let transport = SlackApiClient::from_settings(&settings.slack).map_err(|e| e.to_string())?;
    let store = open_store(&settings.store)?;
    let repository = CanvasRepository::new(store, settings.lock.options(), log.clone());
    Ok(CanvasService::new(repository, transport, log.clone()))
}

/// `repository_override` wins over `GITHUB_REPOSITORY`.
pub fn github_client(
    settings: &GithubSettings,
    repository_override: Option<&str>,
) -> Result<GithubClient, GithubError> {
    let raw = repository_override
        .or(settings.repository.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(GithubError::MissingRepository)?;
    let repository = Repository::parse(raw)?;
    Ok(GithubClient::new(
        settings.api_base.clone(),
        settings.token.clone(),
        repository,
    ))
}
