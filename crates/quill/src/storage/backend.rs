//! Store traits the engine is written against.
//!
//! Both traits take `&self`: implementations own their synchronization, so a
//! single store can be shared behind an `Arc` by every in-flight request.

use async_trait::async_trait;
use quill_api::{Blueprint, Instance};

use crate::storage::types::{InstanceFilter, InstanceOrder, InstancePatch, NewInstance, Result};

/// Generic persistence for blueprint instances.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn find_many(
        &self,
        filter: &InstanceFilter,
        order: InstanceOrder,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Instance>>;

    async fn find_unique(&self, id: &str) -> Result<Option<Instance>>;

    async fn create(&self, data: NewInstance) -> Result<Instance>;

    /// Fails with `StorageError::NotFound` when no row has `id`.
    async fn update(&self, id: &str, patch: InstancePatch) -> Result<Instance>;

    /// Returns the removed row. Fails with `StorageError::NotFound` when no row has `id`.
    async fn delete(&self, id: &str) -> Result<Instance>;

    async fn count(&self, filter: &InstanceFilter) -> Result<usize>;
}

/// Read access to blueprint descriptors.
#[async_trait]
pub trait BlueprintStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Blueprint>>;

    async fn find_unique(&self, id: &str) -> Result<Option<Blueprint>>;
}
