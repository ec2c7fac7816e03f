//! Blueprint instances and their dual-locale documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ApiError, Locale};

/// Locale document: the free-form field payload of one instance in one locale.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Single-locale view of an instance as returned to callers.
pub type Entity = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl InstanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceStatus::Draft => "draft",
            InstanceStatus::Published => "published",
            InstanceStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InstanceStatus::Draft),
            "published" => Ok(InstanceStatus::Published),
            "archived" => Ok(InstanceStatus::Archived),
            other => Err(ApiError::invalid_input(format!(
                "unknown instance status '{}'",
                other
            ))),
        }
    }
}

/// One content entry belonging to a blueprint.
///
/// `data_en` and `data_ar` share field names and differ in values. They start
/// out identical at creation and drift apart as locale-scoped updates land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub blueprint_id: String,
    pub data_en: Document,
    pub data_ar: Document,
    pub status: InstanceStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub page_id: Option<String>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    pub fn document(&self, locale: Locale) -> &Document {
        match locale {
            Locale::En => &self.data_en,
            Locale::Ar => &self.data_ar,
        }
    }
}
