use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::storage::{OrderField, SortDirection};

/// Engine configuration, usually read from a YAML file.
///
/// ```yaml
/// list:
///   limit: 25
///   order_by: publishedAt
///   order_direction: asc
/// ```
///
/// Every field is optional; missing ones fall back to [`Default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub list: ListDefaults,
}

/// Values the list operations use for arguments the caller leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListDefaults {
    pub limit: usize,
    pub offset: usize,
    pub order_by: OrderField,
    pub order_direction: SortDirection,
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            order_by: OrderField::CreatedAt,
            order_direction: SortDirection::Desc,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse engine config: {}", e))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read engine config {}: {}", path.display(), e)
        })?;
        Self::from_yaml_str(&content)
    }
}
