//! Composition root
//!
//! [`BlueprintEngine`] owns the stores and configuration and builds a
//! [`PublishedApi`]: the registry snapshot plus the Query/Mutation tables the
//! execution layer dispatches into. The published value is immutable; share it
//! behind an `Arc` across request tasks.

use quill_api::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::api::dispatch::{Resolvers, synthesize};
use crate::api::handler::{BlueprintQuery, BlueprintsQuery};
use crate::config::EngineConfig;
use crate::core::registry::BlueprintRegistry;
use crate::storage::{BlueprintStore, InstanceStore};

/// Registry snapshot and the tables built from it.
#[derive(Debug, Clone)]
pub struct PublishedApi {
    pub registry: Arc<BlueprintRegistry>,
    pub resolvers: Resolvers,
}

pub struct BlueprintEngine {
    blueprint_store: Arc<dyn BlueprintStore>,
    instance_store: Arc<dyn InstanceStore>,
    config: EngineConfig,
    static_resolvers: Resolvers,
}

impl BlueprintEngine {
    pub fn new(
        blueprint_store: Arc<dyn BlueprintStore>,
        instance_store: Arc<dyn InstanceStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            blueprint_store,
            instance_store,
            config,
            static_resolvers: Resolvers::new(),
        }
    }

    /// Hand-written operations for fixed entities. They are merged underneath
    /// the synthesized ones, so a blueprint deriving the same name replaces them.
    pub fn with_static_resolvers(mut self, resolvers: Resolvers) -> Self {
        self.static_resolvers = resolvers;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load every blueprint and build the published tables.
    ///
    /// Blueprints created after this call are not visible until
    /// [`Self::reinitialize`] is called and the caller swaps in its result.
    pub async fn initialize(&self) -> Result<PublishedApi> {
        info!("[BlueprintEngine] Initializing dynamic blueprint resolvers");

        let registry = BlueprintRegistry::load(self.blueprint_store.as_ref()).await?;

        // metadata queries go in first so a blueprint named `Blueprint` or
        // `Blueprints` replaces them, same as any other name collision
        let mut builtins = Resolvers::new();
        builtins.insert(Arc::new(BlueprintsQuery::new(self.blueprint_store.clone())));
        builtins.insert(Arc::new(BlueprintQuery::new(self.blueprint_store.clone())));

        let synthesized = synthesize(
            &registry,
            self.instance_store.clone(),
            &self.config.list,
            builtins,
        );

        info!(
            "[BlueprintEngine] Generated resolvers for {} blueprint queries",
            synthesized.query.synthesized_len()
        );
        info!(
            "[BlueprintEngine] Generated resolvers for {} blueprint mutations",
            synthesized.mutation.synthesized_len()
        );

        let resolvers = Resolvers::merge(self.static_resolvers.clone(), synthesized);

        Ok(PublishedApi {
            registry: Arc::new(registry),
            resolvers,
        })
    }

    /// Rebuild from the current blueprint rows. `previous` is left as it was;
    /// callers replace their handle with the returned value.
    pub async fn reinitialize(&self, previous: &PublishedApi) -> Result<PublishedApi> {
        let next = self.initialize().await?;

        let before: BTreeSet<&str> = previous.registry.iter().map(|b| b.name.as_str()).collect();
        let after: BTreeSet<&str> = next.registry.iter().map(|b| b.name.as_str()).collect();
        let added: Vec<&str> = after.difference(&before).copied().collect();
        let removed: Vec<&str> = before.difference(&after).copied().collect();

        info!(
            "[BlueprintEngine] Reinitialized: {} blueprints added {:?}, {} removed {:?}",
            added.len(),
            added,
            removed.len(),
            removed
        );

        Ok(next)
    }
}
