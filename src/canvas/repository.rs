use super::error::CanvasError;
use super::model::Workflow;
use crate::shared::ids::{generate_uuid, CanvasId};
use crate::shared::logging::EventLog;
use crate::store::{Entity, EntityKey, KeyValueStore, StoreError};
use serde_json::{json, Map, Value};
use std::thread;
use std::time::Duration;

pub const WORKFLOW_KIND: &str = "SlackWorkflowCanvas";
pub const LOCK_KIND: &str = "SlackWorkflowLock";
pub const LOCK_HOLDER_PROPERTY: &str = "lock_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            backoff_min: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(2000),
        }
    }
}

impl LockOptions {
    /// Uniform sample from `[backoff_min, backoff_max)`.
    pub fn jitter(&self) -> Duration {
        let span = self
            .backoff_max
            .saturating_sub(self.backoff_min)
            .as_micros() as u64;
        if span == 0 {
            return self.backoff_min;
        }
        let mut bytes = [0_u8; 8];
        let offset = match getrandom::getrandom(&mut bytes) {
            Ok(()) => u64::from_le_bytes(bytes) % span,
            Err(_) => span / 2,
        };
        self.backoff_min + Duration::from_micros(offset)
    }
}

/// Loads and stores workflow records and serializes their mutation through
/// a per-workflow lock record. Each repository carries its own random
/// instance id, which is what the lock record holds while claimed.
///
/// Locks have no expiry: a holder that dies without releasing leaves the
/// workflow locked until the lock record is deleted.
#[derive(Debug, Clone)]
pub struct CanvasRepository<S> {
    store: S,
    instance_id: String,
    options: LockOptions,
    log: EventLog,
}

impl<S: KeyValueStore> CanvasRepository<S> {
    pub fn new(store: S, options: LockOptions, log: EventLog) -> Self {
        Self {
            store,
            instance_id: generate_uuid(),
            options,
            log,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn workflow_key(canvas_id: &CanvasId) -> EntityKey {
        EntityKey::new(WORKFLOW_KIND, canvas_id.as_str())
    }

    pub fn lock_key(canvas_id: &CanvasId) -> EntityKey {
        EntityKey::new(LOCK_KIND, canvas_id.as_str())
    }

    pub fn load_workflow(&self, canvas_id: &CanvasId) -> Result<Workflow, CanvasError> {
        let entity = self
            .store
            .get(&Self::workflow_key(canvas_id))?
            .ok_or_else(|| CanvasError::CanvasNotFound {
                canvas_id: canvas_id.to_string(),
            })?;
        serde_json::from_value(Value::Object(entity.properties)).map_err(|source| {
            CanvasError::InvalidRecord {
                canvas_id: canvas_id.to_string(),
                source,
            }
        })
    }

    pub fn store_workflow(&self, workflow: &Workflow) -> Result<(), CanvasError> {
        let properties = serde_json::to_value(workflow)
            .and_then(serde_json::from_value::<Map<String, Value>>)
            .map_err(|source| CanvasError::InvalidRecord {
                canvas_id: workflow.workflow_id.to_string(),
                source,
            })?;
        self.store.put(&Entity::with_properties(
            Self::workflow_key(&workflow.workflow_id),
            properties,
        ))?;
        Ok(())
    }

    pub fn delete_workflow(&self, canvas_id: &CanvasId) -> Result<(), CanvasError> {
        self.store.delete(&Self::workflow_key(canvas_id))?;
        Ok(())
    }

    pub fn delete_lock(&self, canvas_id: &CanvasId) -> Result<(), CanvasError> {
        self.store.delete(&Self::lock_key(canvas_id))?;
        Ok(())
    }

    /// Blocks until this instance holds the lock record for `canvas_id`.
    /// Retries are unbounded.
    pub fn acquire_lock(&self, canvas_id: &CanvasId) -> Result<LockGuard<'_, S>, CanvasError> {
        let key = Self::lock_key(canvas_id);
        loop {
            let current = self.store.get(&key)?;
            let holder = current
                .as_ref()
                .and_then(|entity| entity.get_str(LOCK_HOLDER_PROPERTY));

            if let Some(holder) = holder.filter(|holder| *holder != self.instance_id) {
                self.log.warn(
                    "canvas.lock.contended",
                    &format!("canvas {canvas_id} is locked by instance {holder}"),
                );
                thread::sleep(self.options.jitter());
                continue;
            }

            let mut claimed = current.clone().unwrap_or_else(|| Entity::new(key.clone()));
            claimed.set(LOCK_HOLDER_PROPERTY, json!(self.instance_id));
            if self.store.put_if_unchanged(current.as_ref(), &claimed)? {
                self.log.debug(
                    "canvas.lock.acquired",
                    &format!("canvas={canvas_id} instance={}", self.instance_id),
                );
                return Ok(LockGuard {
                    repository: self,
                    canvas_id: canvas_id.clone(),
                    released: false,
                });
            }

            self.log.debug(
                "canvas.lock.claim_raced",
                &format!("canvas={canvas_id} instance={}", self.instance_id),
            );
            thread::sleep(self.options.jitter());
        }
    }

    /// Runs `mutate` against the stored workflow while holding its lock.
    /// The workflow is written back only when `mutate` succeeds and
    /// `save_on_exit` is set; the lock is released on every exit path.
    pub fn with_locked_workflow<T, F>(
        &self,
        canvas_id: &CanvasId,
        save_on_exit: bool,
        mutate: F,
    ) -> Result<(Workflow, T), CanvasError>
    where
        F: FnOnce(&mut Workflow) -> Result<T, CanvasError>,
    {
        let guard = self.acquire_lock(canvas_id)?;
        let outcome = self.mutate_loaded(canvas_id, save_on_exit, mutate);
        let released = guard.release();
        match (outcome, released) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), _) => Err(err),
        }
    }

    fn mutate_loaded<T, F>(
        &self,
        canvas_id: &CanvasId,
        save_on_exit: bool,
        mutate: F,
    ) -> Result<(Workflow, T), CanvasError>
    where
        F: FnOnce(&mut Workflow) -> Result<T, CanvasError>,
    {
        let mut workflow = self.load_workflow(canvas_id)?;
        let value = mutate(&mut workflow)?;
        if save_on_exit {
            self.store_workflow(&workflow)?;
        }
        Ok((workflow, value))
    }

    fn clear_lock_holder(&self, canvas_id: &CanvasId) -> Result<(), StoreError> {
        let mut entity = Entity::new(Self::lock_key(canvas_id));
        entity.set(LOCK_HOLDER_PROPERTY, Value::Null);
        self.store.put(&entity)
    }
}

/// Held lock on one workflow. Dropping without `release` (for example while
/// unwinding) still clears the holder, logging any failure.
pub struct LockGuard<'a, S: KeyValueStore> {
    repository: &'a CanvasRepository<S>,
    canvas_id: CanvasId,
    released: bool,
}

impl<S: KeyValueStore> LockGuard<'_, S> {
    pub fn canvas_id(&self) -> &CanvasId {
        &self.canvas_id
    }

    pub fn release(mut self) -> Result<(), CanvasError> {
        self.released = true;
        self.repository.clear_lock_holder(&self.canvas_id)?;
        self.repository.log.debug(
            "canvas.lock.released",
            &format!("canvas={}", self.canvas_id),
        );
        Ok(())
    }
}

impl<S: KeyValueStore> Drop for LockGuard<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.repository.clear_lock_holder(&self.canvas_id) {
            self.repository.log.error(
                "canvas.lock.release_failed",
                &format!("canvas={} error={err}", self.canvas_id),
            );
        }
    }
}
