pub mod naming;
pub mod projection;
pub mod registry;
pub mod synthesizer;

pub use naming::{mutation_name, operation_name, plural_list_name, pluralize, query_name};
pub use projection::project;
pub use registry::BlueprintRegistry;
pub use synthesizer::{BlueprintOperations, ListFilter, ListQuery};
