//! Locale projection: the single-locale view of a dual-locale instance.

use chrono::{DateTime, SecondsFormat, Utc};
use quill_api::{Entity, Instance, Locale};
use serde_json::Value;

pub const RESERVED_KEYS: [&str; 5] = ["id", "status", "publishedAt", "createdAt", "updatedAt"];

/// `{ id, ...document(locale), status, publishedAt, createdAt, updatedAt }`
///
/// The locale document is copied first and the metadata keys are written
/// afterwards, so a stored field named `id` or `status` can never replace the
/// row's own value.
pub fn project(instance: &Instance, locale: Locale) -> Entity {
    let mut entity = instance.document(locale).clone();

    entity.insert("id".to_string(), Value::String(instance.id.clone()));
    entity.insert(
        "status".to_string(),
        Value::String(instance.status.as_str().to_string()),
    );
    entity.insert(
        "publishedAt".to_string(),
        instance
            .published_at
            .map(timestamp)
            .unwrap_or(Value::Null),
    );
    entity.insert("createdAt".to_string(), timestamp(instance.created_at));
    entity.insert("updatedAt".to_string(), timestamp(instance.updated_at));

    entity
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
