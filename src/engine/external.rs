use serde_json::{Map, Value};

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertResult};
use crate::model::external_item::ExternalItem;
use crate::model::schema_object::SchemaObject;

/// This converter only handles incidents; the tag is fixed.
const ITEM_TYPE: &str = "incident";

/// Schema fields promoted into the flat properties map, as
/// (schema path, properties key). Included only when present and non-null;
/// `closed_at` is handled separately because it must always appear.
const PROPERTY_FIELDS: &[(&str, &str)] = &[
    ("source_id", "number"),
    ("priority", "priority"),
    ("status", "status"),
    ("category", "category"),
    ("reporter.name", "reporter_name"),
    ("assignee.name", "assignee_name"),
];

/// Wrap a SchemaObject into the downstream envelope. Pure mapping; the only
/// failure is a schema object without a usable identifier.
pub fn build_external_item(
    schema: &SchemaObject,
    source: &str,
    options: &ConvertOptions,
) -> ConvertResult<ExternalItem> {
    let external_id = schema.id().ok_or_else(|| {
        ConvertError::Validation("schema object has no `id` to use as external_id".to_string())
    })?;

    let mut properties = Map::new();
    for (path, key) in PROPERTY_FIELDS {
        if let Some(value) = schema.get(path) {
            if !value.is_null() {
                properties.insert((*key).to_string(), value.clone());
            }
        }
    }
    properties.insert(
        "closed_at".to_string(),
        schema.closed_at().cloned().unwrap_or(Value::Null),
    );
    if let Some(Value::Object(extra)) = schema.get("properties") {
        for (key, value) in extra {
            properties.insert(key.clone(), value.clone());
        }
    }

    let created_at = match schema.created_at() {
        Some(Value::String(ts)) => Some(ts.clone()),
        _ => None,
    };

    Ok(ExternalItem {
        external_id,
        source: source.to_string(),
        item_type: ITEM_TYPE.to_string(),
        title: schema.get("title").cloned(),
        content: schema.get("description").cloned(),
        properties,
        created_at,
        raw: if options.preserve_raw {
            schema.raw().cloned()
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> SchemaObject {
        serde_json::from_value(value).unwrap()
    }

    fn full_schema() -> SchemaObject {
        schema(json!({
            "id": "c1b2c3d4e5f6",
            "source_id": "INC0001234",
            "title": "Can't read email",
            "description": "User can't access email.",
            "reporter": {"id": "681cca", "name": "Joe Employee"},
            "assignee": {"id": "46b870", "name": "Don Goodliffe"},
            "priority": "1",
            "status": "2",
            "category": "network",
            "created_at": "2025-08-20T12:34:56Z",
            "closed_at": null
        }))
    }

    #[test]
    fn envelope_carries_fixed_fields() {
        let item =
            build_external_item(&full_schema(), "servicenow", &ConvertOptions::default())
                .unwrap();
        assert_eq!(item.external_id, "c1b2c3d4e5f6");
        assert_eq!(item.source, "servicenow");
        assert_eq!(item.item_type, "incident");
        assert_eq!(item.title, Some(json!("Can't read email")));
        assert_eq!(item.content, Some(json!("User can't access email.")));
        assert_eq!(item.created_at, Some("2025-08-20T12:34:56Z".to_string()));
    }

    #[test]
    fn properties_follow_the_allow_list() {
        let item =
            build_external_item(&full_schema(), "servicenow", &ConvertOptions::default())
                .unwrap();
        assert_eq!(item.properties.get("number"), Some(&json!("INC0001234")));
        assert_eq!(item.properties.get("priority"), Some(&json!("1")));
        assert_eq!(item.properties.get("status"), Some(&json!("2")));
        assert_eq!(item.properties.get("category"), Some(&json!("network")));
        assert_eq!(
            item.properties.get("reporter_name"),
            Some(&json!("Joe Employee"))
        );
        assert_eq!(
            item.properties.get("assignee_name"),
            Some(&json!("Don Goodliffe"))
        );
        // title/description are promoted to the top level, never duplicated
        assert!(item.properties.get("title").is_none());
    }

    #[test]
    fn null_closed_at_stays_present_in_properties() {
        let item =
            build_external_item(&full_schema(), "servicenow", &ConvertOptions::default())
                .unwrap();
        assert_eq!(item.properties.get("closed_at"), Some(&Value::Null));
    }

    #[test]
    fn absent_allow_list_fields_are_skipped() {
        let item = build_external_item(
            &schema(json!({"id": "abc", "closed_at": null})),
            "servicenow",
            &ConvertOptions::default(),
        )
        .unwrap();
        assert!(item.properties.get("number").is_none());
        assert!(item.properties.get("assignee_name").is_none());
        assert_eq!(item.properties.get("closed_at"), Some(&Value::Null));
    }

    #[test]
    fn override_properties_are_carried_through() {
        let item = build_external_item(
            &schema(json!({
                "id": "abc",
                "closed_at": null,
                "properties": {"ticket_owner": "network-team"}
            })),
            "servicenow",
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(
            item.properties.get("ticket_owner"),
            Some(&json!("network-team"))
        );
    }

    #[test]
    fn missing_id_fails_validation() {
        let err = build_external_item(
            &schema(json!({"title": "no id"})),
            "servicenow",
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Validation(_)));
    }

    #[test]
    fn empty_id_fails_validation() {
        let err = build_external_item(
            &schema(json!({"id": ""})),
            "servicenow",
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Validation(_)));
    }

    #[test]
    fn raw_is_copied_only_when_preserved() {
        let with_raw = schema(json!({
            "id": "abc",
            "closed_at": null,
            "raw": {"sys_id": "abc", "junk": "kept"}
        }));

        let kept = build_external_item(
            &with_raw,
            "servicenow",
            &ConvertOptions {
                preserve_raw: true,
                ..ConvertOptions::default()
            },
        )
        .unwrap();
        assert_eq!(kept.raw, Some(json!({"sys_id": "abc", "junk": "kept"})));

        let dropped =
            build_external_item(&with_raw, "servicenow", &ConvertOptions::default()).unwrap();
        assert_eq!(dropped.raw, None);
    }
}
