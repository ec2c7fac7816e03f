//! Blueprint registry
//!
//! Snapshot of every blueprint row, taken once when the operation tables are
//! built. The snapshot is never refreshed behind the caller's back: a
//! blueprint created afterwards stays invisible until the tables are rebuilt
//! through [`crate::api::BlueprintEngine::reinitialize`].

use quill_api::{ApiError, Blueprint, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::storage::BlueprintStore;

#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    /// Load order, as returned by the store
    blueprints: Vec<Arc<Blueprint>>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl BlueprintRegistry {
    /// Fetch all blueprint rows. Store failures propagate unchanged.
    pub async fn load(store: &dyn BlueprintStore) -> Result<Self> {
        let rows = store.find_all().await?;
        debug!("[BlueprintRegistry] Loaded {} blueprint rows", rows.len());
        Ok(Self::from_blueprints(rows))
    }

    /// Later rows win when two share a name or id.
    pub fn from_blueprints(rows: impl IntoIterator<Item = Blueprint>) -> Self {
        let mut registry = Self::default();
        for blueprint in rows {
            let index = registry.blueprints.len();
            if registry
                .by_name
                .insert(blueprint.name.clone(), index)
                .is_some()
            {
                warn!(
                    "[BlueprintRegistry] Duplicate blueprint name '{}', last row wins",
                    blueprint.name
                );
            }
            registry.by_id.insert(blueprint.id.clone(), index);
            registry.blueprints.push(Arc::new(blueprint));
        }
        registry
    }

    pub fn get_by_name(&self, name: &str) -> Result<Arc<Blueprint>> {
        self.by_name
            .get(name)
            .map(|&index| self.blueprints[index].clone())
            .ok_or_else(|| ApiError::not_found("Blueprint", name))
    }

    pub fn get(&self, id: &str) -> Option<Arc<Blueprint>> {
        self.by_id.get(id).map(|&index| self.blueprints[index].clone())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Blueprints in load order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Blueprint>> {
        self.blueprints.iter()
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}
