pub mod dispatch;
pub mod engine;
pub mod handler;

pub use dispatch::{ResolverTable, Resolvers, published_verbs, synthesize};
pub use engine::{BlueprintEngine, PublishedApi};
pub use handler::{Arguments, BlueprintHandler, BlueprintQuery, BlueprintsQuery, OperationHandler};
