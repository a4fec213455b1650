//! Task record normalization
//!
//! Turns the JSON the task service returns into canonical [`Task`] values.
//!
//! # Envelopes
//!
//! A listing may arrive as a bare array or as an object wrapping the array
//! under `content` or `items`.
//!
//! # Field names
//!
//! Each canonical field has an ordered list of source keys. The first key that
//! is present and not `null` wins; a field with no source falls back to
//! empty/absent. Besides the canonical camelCase names the service may use a
//! Portuguese naming scheme (`titulo`, `descricao`, `criadoEm`, ...) or
//! snake_case timestamps.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::models::{Task, TaskId, TaskStatus};
use crate::repo::RepoError;

pub const ID_KEYS: &[&str] = &["id"];
pub const TITLE_KEYS: &[&str] = &["title", "titulo"];
pub const DESCRIPTION_KEYS: &[&str] = &["description", "descricao"];
pub const STATUS_KEYS: &[&str] = &["status"];
pub const CREATED_AT_KEYS: &[&str] = &["createdAt", "criadoEm", "created_at"];
pub const UPDATED_AT_KEYS: &[&str] = &["updatedAt", "atualizadoEm", "updated_at"];
pub const COMPLETED_AT_KEYS: &[&str] = &["completedAt", "concluidoEm"];
pub const DELETED_AT_KEYS: &[&str] = &["deletedAt", "deletadoEm"];

/// Keys a listing envelope may wrap its array under, in order
pub const ENVELOPE_KEYS: &[&str] = &["content", "items"];

/// First value among `keys` that is present and not null
pub fn first_present<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match first_present(raw, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn timestamp_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    parse_timestamp(first_present(raw, keys)?)
}

/// Parse a timestamp given as RFC 3339, as a zone-less ISO date-time (read as
/// UTC) or as epoch milliseconds. Anything else is treated as absent.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Normalize one raw task record
///
/// `fallback_status` is used when the record carries no recognizable status,
/// e.g. trash listings where the status is implied by the endpoint.
pub fn normalize_task(raw: &Value, fallback_status: Option<TaskStatus>) -> Result<Task, RepoError> {
    let raw = raw
        .as_object()
        .ok_or_else(|| RepoError::Decode(format!("task record is not an object: {}", raw)))?;

    let id = text_field(raw, ID_KEYS)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RepoError::Decode("task record has no id".to_string()))?;

    let status = text_field(raw, STATUS_KEYS)
        .and_then(|s| TaskStatus::from_str(&s))
        .or(fallback_status)
        .ok_or_else(|| RepoError::Decode(format!("task {} has no valid status", id)))?;

    Ok(Task {
        id: TaskId::new(id),
        title: text_field(raw, TITLE_KEYS).unwrap_or_default(),
        description: text_field(raw, DESCRIPTION_KEYS).filter(|d| !d.is_empty()),
        status,
        created_at: timestamp_field(raw, CREATED_AT_KEYS),
        updated_at: timestamp_field(raw, UPDATED_AT_KEYS),
        completed_at: timestamp_field(raw, COMPLETED_AT_KEYS),
        deleted_at: timestamp_field(raw, DELETED_AT_KEYS),
    })
}

/// Normalize a listing response (bare array or enveloped array)
pub fn normalize_list(data: &Value, fallback_status: Option<TaskStatus>) -> Result<Vec<Task>, RepoError> {
    let items = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match first_present(map, ENVELOPE_KEYS) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(RepoError::Decode(format!("listing envelope does not hold an array: {}", other)))
            }
            None => &[],
        },
        other => return Err(RepoError::Decode(format!("unexpected listing shape: {}", other))),
    };

    items.iter().map(|raw| normalize_task(raw, fallback_status)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_record() {
        let raw = json!({
            "id": "t-1",
            "title": "Buy milk",
            "description": "2 liters",
            "status": "ACTIVE",
            "createdAt": "2025-03-01T10:00:00Z",
            "updatedAt": "2025-03-01T11:00:00Z"
        });
        let task = normalize_task(&raw, None).unwrap();
        assert_eq!(task.id, TaskId::new("t-1"));
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description.as_deref(), Some("2 liters"));
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.created_at, Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()));
        assert!(task.completed_at.is_none());
        assert!(task.deleted_at.is_none());
    }

    #[test]
    fn test_alternate_field_names_fill_canonical_fields() {
        let raw = json!({
            "id": 42,
            "titulo": "Comprar leite",
            "descricao": "integral",
            "status": "DELETED",
            "criadoEm": "2025-03-01T10:00:00",
            "atualizadoEm": "2025-03-02T10:00:00",
            "concluidoEm": "2025-03-02T09:00:00",
            "deletadoEm": "2025-03-02T10:00:00"
        });
        let task = normalize_task(&raw, None).unwrap();
        assert_eq!(task.id.as_str(), "42");
        assert_eq!(task.title, "Comprar leite");
        assert_eq!(task.description.as_deref(), Some("integral"));
        assert_eq!(task.created_at, Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()));
        assert_eq!(task.updated_at, Some(Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap()));
        assert_eq!(task.completed_at, Some(Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap()));
        assert_eq!(task.deleted_at, Some(Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_canonical_name_wins_over_alternate() {
        let raw = json!({ "id": "1", "status": "ACTIVE", "title": "canonical", "titulo": "alternate" });
        assert_eq!(normalize_task(&raw, None).unwrap().title, "canonical");

        // null counts as absent
        let raw = json!({ "id": "1", "status": "ACTIVE", "title": null, "titulo": "alternate" });
        assert_eq!(normalize_task(&raw, None).unwrap().title, "alternate");
    }

    #[test]
    fn test_snake_case_timestamps() {
        let raw = json!({ "id": "1", "status": "ACTIVE", "created_at": 1_740_823_200_000i64 });
        let task = normalize_task(&raw, None).unwrap();
        assert_eq!(task.created_at, Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let raw = json!({ "id": "1", "status": "COMPLETED" });
        let task = normalize_task(&raw, None).unwrap();
        assert_eq!(task.title, "");
        assert!(task.description.is_none());
        assert!(task.created_at.is_none());
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn test_fallback_status() {
        let raw = json!({ "id": "1", "title": "x" });
        assert!(normalize_task(&raw, None).is_err());
        assert_eq!(normalize_task(&raw, Some(TaskStatus::Deleted)).unwrap().status, TaskStatus::Deleted);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let raw = json!({ "title": "x", "status": "ACTIVE" });
        assert!(matches!(normalize_task(&raw, None), Err(RepoError::Decode(_))));
    }

    #[test]
    fn test_unparseable_timestamp_is_absent() {
        let raw = json!({ "id": "1", "status": "DELETED", "deletedAt": "yesterday" });
        assert!(normalize_task(&raw, None).unwrap().deleted_at.is_none());
    }

    #[test]
    fn test_list_envelopes() {
        let record = json!({ "id": "1", "title": "a", "status": "ACTIVE" });

        let bare = json!([record.clone()]);
        assert_eq!(normalize_list(&bare, None).unwrap().len(), 1);

        let paged = json!({ "content": [record.clone()], "totalElements": 1 });
        assert_eq!(normalize_list(&paged, None).unwrap().len(), 1);

        let items = json!({ "items": [record.clone(), record] });
        assert_eq!(normalize_list(&items, None).unwrap().len(), 2);

        let empty = json!({ "total": 0 });
        assert!(normalize_list(&empty, None).unwrap().is_empty());

        assert!(normalize_list(&json!("nope"), None).is_err());
    }
}
