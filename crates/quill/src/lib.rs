pub mod api;
pub mod config;
pub mod core;
pub mod logging;
pub mod storage;

pub use api::{BlueprintEngine, PublishedApi, Resolvers};
pub use config::EngineConfig;
pub use quill_api::{
    ApiError, Blueprint, Document, Entity, Instance, InstanceStatus, Locale, OperationDescriptor,
    OperationKind, StorageError, Verb,
};
