//! Blueprint descriptors.
//!
//! A blueprint is a content type defined at runtime by an administrator. The
//! engine only ever reads blueprints; creating and editing them happens
//! elsewhere.

use serde::{Deserialize, Serialize};

/// Runtime-defined content-type descriptor.
///
/// `name` is the type identifier every operation name is derived from
/// (`HeroBanner` → `herobanner`, `herobanners`, `createHeroBanner`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Only controls whether a list operation is published. Writes never
    /// enforce a single instance per blueprint.
    #[serde(default)]
    pub allow_multiple: bool,
    /// System blueprints cannot have instances deleted or duplicated.
    #[serde(default)]
    pub is_system: bool,
    pub blueprint_type: String,
    /// Declared field layout. Carried for callers; instance data is never
    /// checked against it.
    #[serde(default)]
    pub field_schema: serde_json::Value,
}

impl Blueprint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            display_name: name.clone(),
            name,
            description: None,
            allow_multiple: false,
            is_system: false,
            blueprint_type: "BLOCK".to_string(),
            field_schema: serde_json::Value::Array(Vec::new()),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_allow_multiple(mut self, allow_multiple: bool) -> Self {
        self.allow_multiple = allow_multiple;
        self
    }

    pub fn with_system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn with_blueprint_type(mut self, blueprint_type: impl Into<String>) -> Self {
        self.blueprint_type = blueprint_type.into();
        self
    }

    pub fn with_field_schema(mut self, field_schema: serde_json::Value) -> Self {
        self.field_schema = field_schema;
        self
    }
}
