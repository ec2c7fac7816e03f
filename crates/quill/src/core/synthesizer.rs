//! Generic instance operations, parameterized by a blueprint
//!
//! One [`BlueprintOperations`] value exists per registered blueprint. It holds
//! nothing but the blueprint descriptor and a handle to the shared
//! [`InstanceStore`]; every blueprint gets the same six behaviours with its own
//! identity and cardinality rules applied.
//!
//! Each operation is a straight sequence of at most two store calls. Nothing
//! is transactional and there is no concurrency token: two updates racing on
//! the same `(id, locale)` resolve as last-write-wins inside the store.

use chrono::{DateTime, NaiveDate, Utc};
use quill_api::{ApiError, Blueprint, Document, Entity, InstanceStatus, Locale, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::projection::project;
use crate::storage::{
    InstanceFilter, InstanceOrder, InstancePatch, InstanceStore, NewInstance, OrderField,
    SortDirection,
};

/// Filter accepted by the list operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub status: Option<InstanceStatus>,
    pub published_at_gte: Option<DateTime<Utc>>,
    pub published_at_lte: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub locale: Locale,
    pub filter: ListFilter,
    pub limit: usize,
    pub offset: usize,
    pub order_by: OrderField,
    pub order_direction: SortDirection,
}

/// `status` and `publishedAt` split out of a create/update payload.
#[derive(Debug, Default)]
struct ReservedInput {
    status: Option<InstanceStatus>,
    /// Outer `None`: key absent. `Some(None)`: explicitly null.
    published_at: Option<Option<DateTime<Utc>>>,
}

pub struct BlueprintOperations {
    blueprint: Arc<Blueprint>,
    store: Arc<dyn InstanceStore>,
}

impl BlueprintOperations {
    pub fn new(blueprint: Arc<Blueprint>, store: Arc<dyn InstanceStore>) -> Self {
        Self { blueprint, store }
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Paginated, ordered, locale-projected instances of this blueprint.
    pub async fn list(&self, query: ListQuery) -> Result<Vec<Entity>> {
        let filter = InstanceFilter {
            blueprint_id: Some(self.blueprint.id.clone()),
            status: query.filter.status,
            published_gte: query.filter.published_at_gte,
            published_lte: query.filter.published_at_lte,
            search: query.filter.search,
        };
        let order = InstanceOrder::new(query.order_by, query.order_direction);

        let instances = self
            .store
            .find_many(&filter, order, query.limit, query.offset)
            .await?;

        Ok(instances
            .iter()
            .map(|instance| project(instance, query.locale))
            .collect())
    }

    /// `None` when the id is unknown or belongs to another blueprint.
    pub async fn get(&self, id: &str, locale: Locale) -> Result<Option<Entity>> {
        let Some(instance) = self.store.find_unique(id).await? else {
            return Ok(None);
        };

        if instance.blueprint_id != self.blueprint.id {
            debug!(
                "[BlueprintOperations] Instance {} belongs to blueprint {}, not {}",
                id, instance.blueprint_id, self.blueprint.id
            );
            return Ok(None);
        }

        Ok(Some(project(&instance, locale)))
    }

    /// Writes the payload identically into both locale documents.
    ///
    /// `allow_multiple` is not consulted: a blueprint without a list
    /// operation still accepts any number of instances.
    pub async fn create(&self, input: Document, locale: Locale) -> Result<Entity> {
        let (data, reserved) = split_reserved(input)?;

        let instance = self
            .store
            .create(NewInstance {
                blueprint_id: self.blueprint.id.clone(),
                data_en: data.clone(),
                data_ar: data,
                status: reserved.status.unwrap_or_default(),
                published_at: reserved.published_at.flatten(),
                page_id: None,
                order: 0,
            })
            .await?;

        debug!(
            "[BlueprintOperations] Created {} instance {}",
            self.blueprint.name, instance.id
        );
        Ok(project(&instance, locale))
    }

    /// Shallow-merges the payload into the `locale` document only. `status`
    /// and `publishedAt` apply to the row regardless of locale.
    ///
    /// The owning blueprint is not checked here, unlike [`Self::get`].
    pub async fn update(&self, id: &str, input: Document, locale: Locale) -> Result<Entity> {
        let (data, reserved) = split_reserved(input)?;

        let existing = self
            .store
            .find_unique(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Instance", id))?;

        let mut merged = existing.document(locale).clone();
        for (key, value) in data {
            merged.insert(key, value);
        }

        let mut patch = InstancePatch {
            status: reserved.status,
            published_at: reserved.published_at,
            ..InstancePatch::default()
        };
        match locale {
            Locale::En => patch.data_en = Some(merged),
            Locale::Ar => patch.data_ar = Some(merged),
        }

        let instance = self.store.update(id, patch).await?;
        Ok(project(&instance, locale))
    }

    /// Removes the row without checking whether a page still references it.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if self.blueprint.is_system {
            warn!(
                "[BlueprintOperations] Refused delete of {} on system blueprint {}",
                id, self.blueprint.name
            );
            return Err(ApiError::forbidden(format!(
                "Cannot delete instances of system blueprint \"{}\"",
                self.blueprint.name
            )));
        }

        self.store.delete(id).await?;
        Ok(true)
    }

    /// Copies the source row as a new draft, projected in the primary locale.
    pub async fn duplicate(&self, id: &str) -> Result<Entity> {
        if self.blueprint.is_system {
            return Err(ApiError::forbidden(format!(
                "Cannot duplicate instances of system blueprint \"{}\"",
                self.blueprint.name
            )));
        }

        let original = self
            .store
            .find_unique(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Instance", id))?;

        let copy = self
            .store
            .create(NewInstance {
                blueprint_id: original.blueprint_id,
                data_en: original.data_en,
                data_ar: original.data_ar,
                status: InstanceStatus::Draft,
                published_at: None,
                page_id: original.page_id,
                order: original.order,
            })
            .await?;

        debug!(
            "[BlueprintOperations] Duplicated {} instance {} as {}",
            self.blueprint.name, id, copy.id
        );
        Ok(project(&copy, Locale::PRIMARY))
    }
}

fn split_reserved(mut input: Document) -> Result<(Document, ReservedInput)> {
    let status = match input.remove("status") {
        None => None,
        Some(value) if is_blank(&value) => None,
        Some(Value::String(s)) => Some(s.parse::<InstanceStatus>()?),
        Some(other) => {
            return Err(ApiError::invalid_input(format!(
                "status must be a string, got {}",
                other
            )));
        }
    };

    let published_at = match input.remove("publishedAt") {
        None => None,
        Some(value) if is_blank(&value) => Some(None),
        Some(value) => Some(Some(parse_timestamp(&value)?)),
    };

    Ok((
        input,
        ReservedInput {
            status,
            published_at,
        },
    ))
}

/// `null` and `""` both count as "no value" for reserved inputs and filters.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Accepts RFC 3339 strings, bare `YYYY-MM-DD` dates (midnight UTC) and
/// millisecond epoch numbers.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(at) = DateTime::parse_from_rfc3339(s) {
                return Ok(at.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
                .ok_or_else(|| ApiError::invalid_input(format!("invalid timestamp '{}'", s)))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| ApiError::invalid_input(format!("invalid timestamp {}", n))),
        other => Err(ApiError::invalid_input(format!(
            "invalid timestamp {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn operations(blueprint: Blueprint, store: &MemoryStore) -> BlueprintOperations {
        BlueprintOperations::new(Arc::new(blueprint), Arc::new(store.clone()))
    }

    fn list_all(locale: Locale) -> ListQuery {
        ListQuery {
            locale,
            filter: ListFilter::default(),
            limit: 10,
            offset: 0,
            order_by: OrderField::CreatedAt,
            order_direction: SortDirection::Desc,
        }
    }

    #[tokio::test]
    async fn test_create_writes_both_locales_and_defaults_to_draft() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops
            .create(doc(json!({ "heading": "Welcome" })), Locale::Ar)
            .await
            .unwrap();
        assert_eq!(created["status"], "draft");
        assert_eq!(created["publishedAt"], Value::Null);

        let id = created["id"].as_str().unwrap();
        let en = ops.get(id, Locale::En).await.unwrap().unwrap();
        let ar = ops.get(id, Locale::Ar).await.unwrap().unwrap();
        assert_eq!(en["heading"], "Welcome");
        assert_eq!(ar["heading"], "Welcome");
    }

    #[tokio::test]
    async fn test_create_strips_reserved_fields_from_documents() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops
            .create(
                doc(json!({
                    "heading": "Launch",
                    "status": "published",
                    "publishedAt": "2024-03-01T09:30:00Z"
                })),
                Locale::En,
            )
            .await
            .unwrap();

        assert_eq!(created["status"], "published");
        assert_eq!(created["publishedAt"], "2024-03-01T09:30:00.000Z");

        let id = created["id"].as_str().unwrap();
        let stored = crate::storage::InstanceStore::find_unique(&store, id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.data_en.contains_key("status"));
        assert!(!stored.data_ar.contains_key("publishedAt"));
        assert_eq!(stored.status, InstanceStatus::Published);
    }

    #[tokio::test]
    async fn test_create_ignores_allow_multiple() {
        let store = MemoryStore::new();
        let ops = operations(
            Blueprint::new("bp-1", "Footer").with_allow_multiple(false),
            &store,
        );

        ops.create(Document::new(), Locale::En).await.unwrap();
        ops.create(Document::new(), Locale::En).await.unwrap();

        let filter = InstanceFilter::for_blueprint("bp-1");
        assert_eq!(store.count(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_is_locale_scoped_shallow_merge() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops
            .create(
                doc(json!({ "heading": "Welcome", "cta": { "label": "Go", "href": "/" } })),
                Locale::En,
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = ops
            .update(
                id,
                doc(json!({ "heading": "أهلا", "cta": { "label": "اذهب" } })),
                Locale::Ar,
            )
            .await
            .unwrap();
        assert_eq!(updated["heading"], "أهلا");
        // key-level merge replaces the nested object wholesale
        assert_eq!(updated["cta"], json!({ "label": "اذهب" }));

        let en = ops.get(id, Locale::En).await.unwrap().unwrap();
        assert_eq!(en["heading"], "Welcome");
        assert_eq!(en["cta"], json!({ "label": "Go", "href": "/" }));
    }

    #[tokio::test]
    async fn test_update_applies_status_globally() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops.create(Document::new(), Locale::En).await.unwrap();
        let id = created["id"].as_str().unwrap();

        ops.update(
            id,
            doc(json!({ "status": "published", "publishedAt": "2024-06-01" })),
            Locale::En,
        )
        .await
        .unwrap();

        let ar = ops.get(id, Locale::Ar).await.unwrap().unwrap();
        assert_eq!(ar["status"], "published");
        assert_eq!(ar["publishedAt"], "2024-06-01T00:00:00.000Z");
        // reserved keys never land in the documents
        assert_eq!(ar.len(), 5);

        let cleared = ops
            .update(id, doc(json!({ "publishedAt": null })), Locale::Ar)
            .await
            .unwrap();
        assert_eq!(cleared["publishedAt"], Value::Null);
        assert_eq!(cleared["status"], "published");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let err = ops
            .update("missing", Document::new(), Locale::En)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_through_other_blueprint_is_none() {
        let store = MemoryStore::new();
        let banners = operations(Blueprint::new("bp-1", "HeroBanner"), &store);
        let footers = operations(Blueprint::new("bp-2", "Footer"), &store);

        let created = banners.create(Document::new(), Locale::En).await.unwrap();
        let id = created["id"].as_str().unwrap();

        assert!(footers.get(id, Locale::En).await.unwrap().is_none());
        assert!(banners.get("missing", Locale::En).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_system_blueprint_is_forbidden_and_keeps_row() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "SiteHeader").with_system(true), &store);

        let created = ops.create(Document::new(), Locale::En).await.unwrap();
        let id = created["id"].as_str().unwrap();

        let err = ops.delete(id).await.unwrap_err();
        assert!(err.is_forbidden());
        assert!(ops.get(id, Locale::En).await.unwrap().is_some());

        let err = ops.duplicate(id).await.unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops.create(Document::new(), Locale::En).await.unwrap();
        let id = created["id"].as_str().unwrap();

        assert!(ops.delete(id).await.unwrap());
        assert!(ops.get(id, Locale::En).await.unwrap().is_none());

        // the store's own NotFound comes through unchanged
        let err = ops.delete(id).await.unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_resets_status_and_copies_documents() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops
            .create(
                doc(json!({ "heading": "Welcome", "status": "published" })),
                Locale::En,
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();
        ops.update(id, doc(json!({ "heading": "مرحبا" })), Locale::Ar)
            .await
            .unwrap();

        let copy = ops.duplicate(id).await.unwrap();
        assert_ne!(copy["id"], created["id"]);
        assert_eq!(copy["status"], "draft");
        assert_eq!(copy["heading"], "Welcome");

        let copy_id = copy["id"].as_str().unwrap();
        let copy_ar = ops.get(copy_id, Locale::Ar).await.unwrap().unwrap();
        assert_eq!(copy_ar["heading"], "مرحبا");

        let err = ops.duplicate("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_and_projects() {
        let store = MemoryStore::new();
        let ops = operations(
            Blueprint::new("bp-1", "Testimonial").with_allow_multiple(true),
            &store,
        );
        let other = operations(Blueprint::new("bp-2", "Footer"), &store);

        ops.create(doc(json!({ "quote": "Exceptional design" })), Locale::En)
            .await
            .unwrap();
        ops.create(
            doc(json!({
                "quote": "Professional",
                "status": "published",
                "publishedAt": "2024-02-10"
            })),
            Locale::En,
        )
        .await
        .unwrap();
        other
            .create(doc(json!({ "quote": "Exceptional footer" })), Locale::En)
            .await
            .unwrap();

        let all = ops.list(list_all(Locale::En)).await.unwrap();
        assert_eq!(all.len(), 2);
        // newest first by default ordering
        assert_eq!(all[0]["quote"], "Professional");

        let mut query = list_all(Locale::En);
        query.filter.search = Some("EXCEPTIONAL".to_string());
        let found = ops.list(query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["quote"], "Exceptional design");

        let mut query = list_all(Locale::En);
        query.filter.status = Some(InstanceStatus::Published);
        query.filter.published_at_gte = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        query.filter.published_at_lte = Some(Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap());
        let published = ops.list(query).await.unwrap();
        assert_eq!(published.len(), 1);

        let mut query = list_all(Locale::En);
        query.limit = 1;
        query.offset = 1;
        query.order_direction = SortDirection::Asc;
        let page = ops.list(query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["quote"], "Professional");
    }

    #[tokio::test]
    async fn test_store_failures_propagate_unchanged() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);
        store.set_unavailable(true).unwrap();

        let err = ops.create(Document::new(), Locale::En).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Storage(crate::storage::StorageError::BackendError(_))
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-01-02")).unwrap(), expected);
        assert_eq!(
            parse_timestamp(&json!("2024-01-02T03:00:00+03:00")).unwrap(),
            expected
        );
        assert_eq!(
            parse_timestamp(&json!(expected.timestamp_millis())).unwrap(),
            expected
        );
        assert!(parse_timestamp(&json!("next tuesday")).is_err());
        assert!(parse_timestamp(&json!(true)).is_err());
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        let err = split_reserved(doc(json!({ "status": "live" }))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput { .. }));
        let err = split_reserved(doc(json!({ "status": 1 }))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput { .. }));
    }

    #[test]
    fn test_blank_reserved_inputs_count_as_absent() {
        let (data, reserved) =
            split_reserved(doc(json!({ "status": "", "publishedAt": "", "title": "" }))).unwrap();
        assert!(reserved.status.is_none());
        assert_eq!(reserved.published_at, Some(None));
        // only reserved keys are interpreted; ordinary fields keep their empty strings
        assert_eq!(data["title"], "");
    }

    #[tokio::test]
    async fn test_create_with_blank_status_and_date_is_unpublished_draft() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops
            .create(
                doc(json!({ "heading": "Hi", "status": "", "publishedAt": "" })),
                Locale::En,
            )
            .await
            .unwrap();
        assert_eq!(created["status"], "draft");
        assert_eq!(created["publishedAt"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_with_blank_date_clears_published_at() {
        let store = MemoryStore::new();
        let ops = operations(Blueprint::new("bp-1", "HeroBanner"), &store);

        let created = ops
            .create(
                doc(json!({ "status": "published", "publishedAt": "2024-06-01" })),
                Locale::En,
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = ops
            .update(id, doc(json!({ "publishedAt": "", "status": "" })), Locale::En)
            .await
            .unwrap();
        assert_eq!(updated["publishedAt"], Value::Null);
        // a blank status leaves the current one in place
        assert_eq!(updated["status"], "published");
    }
}
