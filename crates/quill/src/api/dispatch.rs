//! Dispatch tables: flat `name -> handler` maps for Query and Mutation
//!
//! Synthesized blueprint operations and statically written operations share
//! the same tables. Names are the only key, so when two sources publish the
//! same name the one merged last replaces the other. There is no
//! guard against this; collisions are logged and otherwise silent.

use quill_api::{ApiError, OperationDescriptor, OperationKind, Result, Verb};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, warn};

use crate::api::handler::{Arguments, BlueprintHandler, OperationHandler};
use crate::config::ListDefaults;
use crate::core::registry::BlueprintRegistry;
use crate::core::synthesizer::BlueprintOperations;
use crate::storage::InstanceStore;

/// One published table (`Query` or `Mutation`).
#[derive(Clone)]
pub struct ResolverTable {
    kind: OperationKind,
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl ResolverTable {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            handlers: HashMap::new(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Registers `handler` under its descriptor name, returning any handler
    /// it replaced.
    pub fn insert(
        &mut self,
        handler: Arc<dyn OperationHandler>,
    ) -> Option<Arc<dyn OperationHandler>> {
        let name = handler.descriptor().name;
        let replaced = self.handlers.insert(name.clone(), handler);
        if replaced.is_some() {
            warn!(
                "[ResolverTable] {}.{} registered twice, last registration wins",
                self.kind, name
            );
        }
        replaced
    }

    /// Moves every handler of `other` into this table; `other` wins on
    /// name collisions.
    pub fn merge(&mut self, other: ResolverTable) {
        for (_, handler) in other.handlers {
            self.insert(handler);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn OperationHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors of registered handlers, sorted by name.
    pub fn descriptors(&self) -> Vec<OperationDescriptor> {
        let mut descriptors: Vec<OperationDescriptor> =
            self.handlers.values().map(|h| h.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Handlers generated from blueprints, excluding static ones.
    pub fn synthesized_len(&self) -> usize {
        self.handlers
            .values()
            .filter(|h| h.descriptor().is_synthesized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route a call to the handler registered under `name`.
    pub async fn call(&self, name: &str, args: Arguments) -> Result<Value> {
        let span = tracing::span!(
            tracing::Level::INFO,
            "dispatch.call",
            "operation.kind" = %self.kind,
            "operation.name" = name
        );

        async {
            let handler = self.handlers.get(name).ok_or_else(|| {
                debug!("[ResolverTable] No {} operation named '{}'", self.kind, name);
                ApiError::UnknownOperation {
                    name: name.to_string(),
                }
            })?;

            debug!("[ResolverTable] Dispatching {}.{}", self.kind, name);
            let result = handler.call(args).await;
            if let Err(e) = &result {
                debug!("[ResolverTable] {}.{} failed: {}", self.kind, name, e);
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ResolverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverTable")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}

/// The pair of tables handed to the execution layer.
#[derive(Debug, Clone)]
pub struct Resolvers {
    pub query: ResolverTable,
    pub mutation: ResolverTable,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolvers {
    pub fn new() -> Self {
        Self {
            query: ResolverTable::new(OperationKind::Query),
            mutation: ResolverTable::new(OperationKind::Mutation),
        }
    }

    /// Adds a handler to the table matching its descriptor's kind.
    pub fn insert(
        &mut self,
        handler: Arc<dyn OperationHandler>,
    ) -> Option<Arc<dyn OperationHandler>> {
        match handler.descriptor().kind {
            OperationKind::Query => self.query.insert(handler),
            OperationKind::Mutation => self.mutation.insert(handler),
        }
    }

    /// `base` first, then `overlay`: overlay handlers replace same-named base ones.
    pub fn merge(base: Resolvers, overlay: Resolvers) -> Resolvers {
        let mut merged = base;
        merged.query.merge(overlay.query);
        merged.mutation.merge(overlay.mutation);
        merged
    }

    pub fn table(&self, kind: OperationKind) -> &ResolverTable {
        match kind {
            OperationKind::Query => &self.query,
            OperationKind::Mutation => &self.mutation,
        }
    }
}

/// Verbs published for `blueprint`: no list without `allow_multiple`, no
/// duplicate for system blueprints. Delete is always published, even though
/// it refuses system blueprints at call time.
pub fn published_verbs(allow_multiple: bool, is_system: bool) -> Vec<Verb> {
    Verb::ALL
        .into_iter()
        .filter(|verb| match verb {
            Verb::List => allow_multiple,
            Verb::Duplicate => !is_system,
            _ => true,
        })
        .collect()
}

/// Build handlers for every blueprint in `registry`, in load order.
///
/// `base` is inserted first, so a blueprint whose derived name matches one of
/// its entries replaces it.
pub fn synthesize(
    registry: &BlueprintRegistry,
    store: Arc<dyn InstanceStore>,
    list_defaults: &ListDefaults,
    base: Resolvers,
) -> Resolvers {
    let mut resolvers = base;

    for blueprint in registry.iter() {
        let operations = Arc::new(BlueprintOperations::new(blueprint.clone(), store.clone()));

        for verb in published_verbs(blueprint.allow_multiple, blueprint.is_system) {
            let handler = BlueprintHandler::new(verb, operations.clone(), list_defaults.clone());
            debug!(
                "[synthesize] {} -> {}.{}",
                blueprint.name,
                verb.kind(),
                handler.name()
            );
            resolvers.insert(Arc::new(handler));
        }
    }

    resolvers
}
