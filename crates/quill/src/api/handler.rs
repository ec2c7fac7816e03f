//! Operation handlers published in the Query/Mutation tables
//!
//! A handler receives the operation's arguments as a JSON object (the
//! execution layer has already turned the request into plain JSON) and
//! returns a JSON value. Two kinds exist:
//!
//! - [`BlueprintHandler`]: one generic handler type for every synthesized
//!   operation. It carries a [`Verb`] and the [`BlueprintOperations`] of a
//!   single blueprint, and decodes arguments for that verb.
//! - Static handlers ([`BlueprintsQuery`], [`BlueprintQuery`] and anything
//!   callers register for fixed entities), which implement
//!   [`OperationHandler`] directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quill_api::{
    ApiError, Document, InstanceStatus, Locale, OperationDescriptor, OperationKind, Result, Verb,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ListDefaults;
use crate::core::naming::operation_name;
use crate::core::synthesizer::{
    BlueprintOperations, ListFilter, ListQuery, is_blank, parse_timestamp,
};
use crate::storage::{BlueprintStore, SortDirection};

/// Operation arguments, keyed by argument name.
pub type Arguments = serde_json::Map<String, Value>;

#[async_trait]
pub trait OperationHandler: Send + Sync {
    fn descriptor(&self) -> OperationDescriptor;

    async fn call(&self, args: Arguments) -> Result<Value>;
}

fn decode<T: DeserializeOwned>(operation: &str, args: Arguments) -> Result<T> {
    serde_json::from_value(Value::Object(args)).map_err(|e| {
        ApiError::invalid_input(format!("invalid arguments for {}: {}", operation, e))
    })
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("failed to encode result: {}", e)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListArgs {
    #[serde(default)]
    locale: Locale,
    #[serde(default)]
    filter: Option<FilterArgs>,
    limit: Option<usize>,
    offset: Option<usize>,
    order_by: Option<String>,
    order_direction: Option<SortDirection>,
}

#[derive(Debug, Default, Deserialize)]
struct FilterArgs {
    status: Option<String>,
    #[serde(rename = "publishedAt_gte")]
    published_at_gte: Option<Value>,
    #[serde(rename = "publishedAt_lte")]
    published_at_lte: Option<Value>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetArgs {
    id: String,
    #[serde(default)]
    locale: Locale,
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    input: Document,
    #[serde(default)]
    locale: Locale,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    id: String,
    input: Document,
    #[serde(default)]
    locale: Locale,
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: String,
}

impl ListArgs {
    fn into_query(self, defaults: &ListDefaults) -> Result<ListQuery> {
        let filter = match self.filter {
            Some(filter) => ListFilter {
                status: filter
                    .status
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<InstanceStatus>())
                    .transpose()?,
                published_at_gte: bound(filter.published_at_gte.as_ref())?,
                published_at_lte: bound(filter.published_at_lte.as_ref())?,
                search: filter.search.filter(|s| !s.is_empty()),
            },
            None => ListFilter::default(),
        };

        let order_by = match self.order_by {
            Some(field) => field.parse()?,
            None => defaults.order_by,
        };

        Ok(ListQuery {
            locale: self.locale,
            filter,
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
            order_by,
            order_direction: self.order_direction.unwrap_or(defaults.order_direction),
        })
    }
}

fn bound(value: Option<&Value>) -> Result<Option<DateTime<Utc>>> {
    value
        .filter(|v| !is_blank(v))
        .map(parse_timestamp)
        .transpose()
}

/// The single handler type behind every synthesized operation.
pub struct BlueprintHandler {
    verb: Verb,
    name: String,
    operations: Arc<BlueprintOperations>,
    list_defaults: ListDefaults,
}

impl BlueprintHandler {
    pub fn new(
        verb: Verb,
        operations: Arc<BlueprintOperations>,
        list_defaults: ListDefaults,
    ) -> Self {
        let name = operation_name(verb, operations.blueprint());
        Self {
            verb,
            name,
            operations,
            list_defaults,
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl OperationHandler for BlueprintHandler {
    fn descriptor(&self) -> OperationDescriptor {
        let blueprint = self.operations.blueprint();
        let description = match self.verb {
            Verb::List => format!("List {} instances", blueprint.display_name),
            Verb::Get => format!("Get a {} instance by id", blueprint.display_name),
            Verb::Create => format!("Create a {} instance", blueprint.display_name),
            Verb::Update => format!("Update a {} instance", blueprint.display_name),
            Verb::Delete => format!("Delete a {} instance", blueprint.display_name),
            Verb::Duplicate => format!("Duplicate a {} instance", blueprint.display_name),
        };
        OperationDescriptor::new(self.name.clone(), self.verb.kind(), description)
            .for_blueprint(self.verb, blueprint.name.clone())
    }

    async fn call(&self, args: Arguments) -> Result<Value> {
        match self.verb {
            Verb::List => {
                let args: ListArgs = decode(&self.name, args)?;
                let query = args.into_query(&self.list_defaults)?;
                encode(&self.operations.list(query).await?)
            }
            Verb::Get => {
                let args: GetArgs = decode(&self.name, args)?;
                encode(&self.operations.get(&args.id, args.locale).await?)
            }
            Verb::Create => {
                let args: CreateArgs = decode(&self.name, args)?;
                encode(&self.operations.create(args.input, args.locale).await?)
            }
            Verb::Update => {
                let args: UpdateArgs = decode(&self.name, args)?;
                encode(
                    &self
                        .operations
                        .update(&args.id, args.input, args.locale)
                        .await?,
                )
            }
            Verb::Delete => {
                let args: IdArgs = decode(&self.name, args)?;
                encode(&self.operations.delete(&args.id).await?)
            }
            Verb::Duplicate => {
                let args: IdArgs = decode(&self.name, args)?;
                encode(&self.operations.duplicate(&args.id).await?)
            }
        }
    }
}

/// `Query.blueprints`: every blueprint, ordered by name, read live from the store.
pub struct BlueprintsQuery {
    store: Arc<dyn BlueprintStore>,
}

impl BlueprintsQuery {
    pub const NAME: &'static str = "blueprints";

    pub fn new(store: Arc<dyn BlueprintStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OperationHandler for BlueprintsQuery {
    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor::new(
            Self::NAME,
            OperationKind::Query,
            "List blueprint descriptors ordered by name",
        )
    }

    async fn call(&self, _args: Arguments) -> Result<Value> {
        let mut blueprints = self.store.find_all().await?;
        blueprints.sort_by(|a, b| a.name.cmp(&b.name));
        encode(&blueprints)
    }
}

/// `Query.blueprint(id)`: one descriptor, `null` when absent.
pub struct BlueprintQuery {
    store: Arc<dyn BlueprintStore>,
}

impl BlueprintQuery {
    pub const NAME: &'static str = "blueprint";

    pub fn new(store: Arc<dyn BlueprintStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OperationHandler for BlueprintQuery {
    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor::new(
            Self::NAME,
            OperationKind::Query,
            "Get a blueprint descriptor by id",
        )
    }

    async fn call(&self, args: Arguments) -> Result<Value> {
        let args: IdArgs = decode(Self::NAME, args)?;
        encode(&self.store.find_unique(&args.id).await?)
    }
}
