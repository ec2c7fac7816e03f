use chrono::{DateTime, Utc};
use quill_api::{ApiError, Document, Instance, InstanceStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub use quill_api::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Row predicate for instance queries. Every condition that is set must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceFilter {
    pub blueprint_id: Option<String>,
    pub status: Option<InstanceStatus>,
    /// Inclusive lower bound on `published_at`.
    pub published_gte: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `published_at`.
    pub published_lte: Option<DateTime<Utc>>,
    /// Case-insensitive substring matched anywhere in either locale document.
    pub search: Option<String>,
}

impl InstanceFilter {
    pub fn for_blueprint(blueprint_id: impl Into<String>) -> Self {
        Self {
            blueprint_id: Some(blueprint_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, instance: &Instance) -> bool {
        if let Some(blueprint_id) = &self.blueprint_id {
            if &instance.blueprint_id != blueprint_id {
                return false;
            }
        }

        if let Some(status) = self.status {
            if instance.status != status {
                return false;
            }
        }

        if self.published_gte.is_some() || self.published_lte.is_some() {
            // A range never matches an unpublished row
            let Some(published_at) = instance.published_at else {
                return false;
            };
            if self.published_gte.is_some_and(|gte| published_at < gte) {
                return false;
            }
            if self.published_lte.is_some_and(|lte| published_at > lte) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !document_contains(&instance.data_en, &needle)
                && !document_contains(&instance.data_ar, &needle)
            {
                return false;
            }
        }

        true
    }
}

/// Walks the whole document: keys, strings, numbers and booleans all count.
/// `needle` must already be lowercase.
pub fn document_contains(document: &Document, needle: &str) -> bool {
    document
        .iter()
        .any(|(key, value)| key.to_lowercase().contains(needle) || value_contains(value, needle))
}

fn value_contains(value: &serde_json::Value, needle: &str) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => b.to_string().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Object(map) => document_contains(map, needle),
    }
}

/// Columns instances can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    Id,
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    Order,
    Status,
}

impl OrderField {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderField::Id => "id",
            OrderField::CreatedAt => "createdAt",
            OrderField::UpdatedAt => "updatedAt",
            OrderField::PublishedAt => "publishedAt",
            OrderField::Order => "order",
            OrderField::Status => "status",
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderField {
    type Err = ApiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "id" => Ok(OrderField::Id),
            "createdAt" => Ok(OrderField::CreatedAt),
            "updatedAt" => Ok(OrderField::UpdatedAt),
            "publishedAt" => Ok(OrderField::PublishedAt),
            "order" => Ok(OrderField::Order),
            "status" => Ok(OrderField::Status),
            other => Err(ApiError::invalid_input(format!(
                "cannot order instances by '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceOrder {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl InstanceOrder {
    pub fn new(field: OrderField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Ascending comparison on the ordering column only. Unpublished rows sort
    /// after published ones, the way SQL places NULLs in ascending order.
    pub fn compare_field(&self, a: &Instance, b: &Instance) -> Ordering {
        match self.field {
            OrderField::Id => a.id.cmp(&b.id),
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderField::PublishedAt => match (a.published_at, b.published_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            OrderField::Order => a.order.cmp(&b.order),
            OrderField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }
}

/// Row to insert. The store assigns `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstance {
    pub blueprint_id: String,
    pub data_en: Document,
    pub data_ar: Document,
    pub status: InstanceStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub page_id: Option<String>,
    pub order: i64,
}

/// Column-level update. `None` leaves a column untouched; for `published_at`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstancePatch {
    pub data_en: Option<Document>,
    pub data_ar: Option<Document>,
    pub status: Option<InstanceStatus>,
    pub published_at: Option<Option<DateTime<Utc>>>,
}

impl InstancePatch {
    pub fn apply_to(self, instance: &mut Instance) {
        if let Some(data_en) = self.data_en {
            instance.data_en = data_en;
        }
        if let Some(data_ar) = self.data_ar {
            instance.data_ar = data_ar;
        }
        if let Some(status) = self.status {
            instance.status = status;
        }
        if let Some(published_at) = self.published_at {
            instance.published_at = published_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance_with(data_en: serde_json::Value, data_ar: serde_json::Value) -> Instance {
        let now = Utc::now();
        Instance {
            id: "i-1".to_string(),
            blueprint_id: "bp-1".to_string(),
            data_en: data_en.as_object().cloned().unwrap(),
            data_ar: data_ar.as_object().cloned().unwrap(),
            status: InstanceStatus::Draft,
            published_at: None,
            page_id: None,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_search_walks_nested_values_case_insensitively() {
        let instance = instance_with(
            json!({ "items": [{ "name": "Sarah Johnson", "rating": 5 }] }),
            json!({ "items": [{ "name": "سارة" }] }),
        );

        let filter = InstanceFilter {
            search: Some("JOHNSON".to_string()),
            ..InstanceFilter::default()
        };
        assert!(filter.matches(&instance));

        let filter = InstanceFilter {
            search: Some("سارة".to_string()),
            ..InstanceFilter::default()
        };
        assert!(filter.matches(&instance));

        let filter = InstanceFilter {
            search: Some("missing".to_string()),
            ..InstanceFilter::default()
        };
        assert!(!filter.matches(&instance));
    }

    #[test]
    fn test_search_matches_undeclared_keys() {
        let instance = instance_with(json!({ "internalNote": 1 }), json!({}));
        let filter = InstanceFilter {
            search: Some("internalnote".to_string()),
            ..InstanceFilter::default()
        };
        assert!(filter.matches(&instance));
    }

    #[test]
    fn test_published_range_excludes_unpublished_rows() {
        let mut instance = instance_with(json!({}), json!({}));
        let bound = Utc::now();
        let filter = InstanceFilter {
            published_lte: Some(bound),
            ..InstanceFilter::default()
        };
        assert!(!filter.matches(&instance));

        instance.published_at = Some(bound);
        assert!(filter.matches(&instance));

        let filter = InstanceFilter {
            published_gte: Some(bound + chrono::Duration::seconds(1)),
            ..InstanceFilter::default()
        };
        assert!(!filter.matches(&instance));
    }

    #[test]
    fn test_order_field_names() {
        assert_eq!("createdAt".parse::<OrderField>().unwrap(), OrderField::CreatedAt);
        assert_eq!(OrderField::PublishedAt.to_string(), "publishedAt");
        assert!("headingEn".parse::<OrderField>().is_err());
    }

    #[test]
    fn test_patch_clears_published_at() {
        let mut instance = instance_with(json!({}), json!({}));
        instance.published_at = Some(Utc::now());

        InstancePatch {
            published_at: Some(None),
            ..InstancePatch::default()
        }
        .apply_to(&mut instance);

        assert!(instance.published_at.is_none());
        assert_eq!(instance.status, InstanceStatus::Draft);
    }
}
