use thiserror::Error;

pub mod blueprint;
pub mod instance;
pub mod locale;
pub mod operation;

pub use blueprint::Blueprint;
pub use instance::{Document, Entity, Instance, InstanceStatus};
pub use locale::Locale;
pub use operation::{OperationDescriptor, OperationKind, Verb};

/// Errors raised by a storage backend.
///
/// The engine never wraps or retries these; they reach the caller unchanged
/// through [`ApiError::Storage`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Errors surfaced by the published operation tables.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    /// Failure inside the engine itself, e.g. a result that cannot be encoded.
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::NotFound { .. } | ApiError::Storage(StorageError::NotFound { .. })
        )
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Forbidden { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
