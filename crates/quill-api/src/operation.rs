//! Self-describing operation metadata.
//!
//! Every handler in a published table carries an [`OperationDescriptor`] so the
//! execution layer can list what is available without calling anything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which published table an operation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => f.write_str("Query"),
            OperationKind::Mutation => f.write_str("Mutation"),
        }
    }
}

/// The six operations synthesized for every blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    List,
    Get,
    Create,
    Update,
    Delete,
    Duplicate,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::List,
        Verb::Get,
        Verb::Create,
        Verb::Update,
        Verb::Delete,
        Verb::Duplicate,
    ];

    pub fn kind(self) -> OperationKind {
        match self {
            Verb::List | Verb::Get => OperationKind::Query,
            Verb::Create | Verb::Update | Verb::Delete | Verb::Duplicate => {
                OperationKind::Mutation
            }
        }
    }

    /// Prefix used to build mutation names. Queries have none.
    pub fn mutation_prefix(self) -> Option<&'static str> {
        match self {
            Verb::Create => Some("create"),
            Verb::Update => Some("update"),
            Verb::Delete => Some("delete"),
            Verb::Duplicate => Some("duplicate"),
            Verb::List | Verb::Get => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub name: String,
    pub kind: OperationKind,
    /// `None` for static operations that are not tied to a blueprint.
    pub verb: Option<Verb>,
    pub blueprint_name: Option<String>,
    pub description: String,
}

impl OperationDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: OperationKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            verb: None,
            blueprint_name: None,
            description: description.into(),
        }
    }

    pub fn for_blueprint(mut self, verb: Verb, blueprint_name: impl Into<String>) -> Self {
        self.verb = Some(verb);
        self.blueprint_name = Some(blueprint_name.into());
        self
    }

    pub fn is_synthesized(&self) -> bool {
        self.blueprint_name.is_some()
    }
}
