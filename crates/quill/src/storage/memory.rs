//! In-memory implementation of the blueprint and instance stores
//!
//! A HashMap-based reference backend used by tests and for running the engine
//! without a database. It keeps the same observable semantics a relational
//! store would have: point lookups, filtered and paginated scans, and
//! `NotFound` on writes against missing rows.

use async_trait::async_trait;
use chrono::Utc;
use quill_api::{Blueprint, Instance};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::backend::{BlueprintStore, InstanceStore};
use super::types::{
    InstanceFilter, InstanceOrder, InstancePatch, NewInstance, Result, SortDirection,
    StorageError,
};

/// In-memory store for blueprints and their instances.
///
/// Cloning shares the underlying state, so a clone handed to the engine and a
/// clone kept by a test observe the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Blueprints in insertion order
    blueprints: Vec<Blueprint>,
    instances: HashMap<String, StoredInstance>,
    /// Insertion counter, breaks ordering ties deterministically
    next_seq: u64,
    /// When set, every call fails with a backend error
    unavailable: bool,
}

#[derive(Debug, Clone)]
struct StoredInstance {
    seq: u64,
    instance: Instance,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blueprints(blueprints: impl IntoIterator<Item = Blueprint>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            state.blueprints.extend(blueprints);
        }
        store
    }

    /// Adds a blueprint row, the way an admin tool writing to the database would.
    pub fn insert_blueprint(&self, blueprint: Blueprint) -> Result<()> {
        let mut state = self.write()?;
        state.blueprints.push(blueprint);
        Ok(())
    }

    /// Simulates an outage: while set, every store call fails.
    pub fn set_unavailable(&self, unavailable: bool) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::BackendError("memory store lock poisoned".to_string()))?;
        state.unavailable = unavailable;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::BackendError("memory store lock poisoned".to_string()))?;
        if state.unavailable {
            return Err(StorageError::BackendError(
                "memory store unavailable".to_string(),
            ));
        }
        Ok(state)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        let state = self
            .state
            .write()
            .map_err(|_| StorageError::BackendError("memory store lock poisoned".to_string()))?;
        if state.unavailable {
            return Err(StorageError::BackendError(
                "memory store unavailable".to_string(),
            ));
        }
        Ok(state)
    }

    fn instance_not_found(id: &str) -> StorageError {
        StorageError::NotFound {
            entity: "instance".to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn find_many(
        &self,
        filter: &InstanceFilter,
        order: InstanceOrder,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Instance>> {
        let state = self.read()?;

        let mut rows: Vec<&StoredInstance> = state
            .instances
            .values()
            .filter(|row| filter.matches(&row.instance))
            .collect();

        rows.sort_by(|a, b| {
            let ordering = order
                .compare_field(&a.instance, &b.instance)
                .then(a.seq.cmp(&b.seq));
            match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row.instance.clone())
            .collect())
    }

    async fn find_unique(&self, id: &str) -> Result<Option<Instance>> {
        let state = self.read()?;
        Ok(state.instances.get(id).map(|row| row.instance.clone()))
    }

    async fn create(&self, data: NewInstance) -> Result<Instance> {
        let mut state = self.write()?;
        let now = Utc::now();

        let instance = Instance {
            id: Uuid::new_v4().to_string(),
            blueprint_id: data.blueprint_id,
            data_en: data.data_en,
            data_ar: data.data_ar,
            status: data.status,
            published_at: data.published_at,
            page_id: data.page_id,
            order: data.order,
            created_at: now,
            updated_at: now,
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        state.instances.insert(
            instance.id.clone(),
            StoredInstance {
                seq,
                instance: instance.clone(),
            },
        );

        Ok(instance)
    }

    async fn update(&self, id: &str, patch: InstancePatch) -> Result<Instance> {
        let mut state = self.write()?;
        let row = state
            .instances
            .get_mut(id)
            .ok_or_else(|| Self::instance_not_found(id))?;

        patch.apply_to(&mut row.instance);
        row.instance.updated_at = Utc::now();

        Ok(row.instance.clone())
    }

    async fn delete(&self, id: &str) -> Result<Instance> {
        let mut state = self.write()?;
        state
            .instances
            .remove(id)
            .map(|row| row.instance)
            .ok_or_else(|| Self::instance_not_found(id))
    }

    async fn count(&self, filter: &InstanceFilter) -> Result<usize> {
        let state = self.read()?;
        Ok(state
            .instances
            .values()
            .filter(|row| filter.matches(&row.instance))
            .count())
    }
}

#[async_trait]
impl BlueprintStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Blueprint>> {
        let state = self.read()?;
        Ok(state.blueprints.clone())
    }

    async fn find_unique(&self, id: &str) -> Result<Option<Blueprint>> {
        let state = self.read()?;
        Ok(state.blueprints.iter().find(|b| b.id == id).cloned())
    }
}
