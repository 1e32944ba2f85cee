use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The canonical normalized incident: a JSON object keyed by destination
/// path, with a fixed core (`id`, `title`, `reporter`, timestamps, ...) plus
/// whatever nested attributes mapping overrides introduce. Backed by
/// serde_json's ordered map, so serializing the same object twice yields
/// identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaObject(Map<String, Value>);

impl SchemaObject {
    pub(crate) fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The stable identifier, stringified the way downstream consumers
    /// expect it. Empty strings count as missing.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Dot-path lookup, e.g. `get("reporter.name")`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut value = self.0.get(segments.next()?)?;
        for segment in segments {
            value = value.as_object()?.get(segment)?;
        }
        Some(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn created_at(&self) -> Option<&Value> {
        self.0.get("created_at")
    }

    pub fn closed_at(&self) -> Option<&Value> {
        self.0.get("closed_at")
    }

    pub fn raw(&self) -> Option<&Value> {
        self.0.get("raw")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<SchemaObject> for Value {
    fn from(object: SchemaObject) -> Self {
        Value::Object(object.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> SchemaObject {
        match value {
            Value::Object(map) => SchemaObject::from_map(map),
            _ => panic!("test object must be a JSON object"),
        }
    }

    #[test]
    fn id_requires_non_empty_string() {
        assert_eq!(object(json!({"id": "abc"})).id(), Some("abc".to_string()));
        assert_eq!(object(json!({"id": ""})).id(), None);
        assert_eq!(object(json!({"title": "x"})).id(), None);
    }

    #[test]
    fn numeric_id_is_stringified() {
        assert_eq!(object(json!({"id": 42})).id(), Some("42".to_string()));
    }

    #[test]
    fn get_walks_dot_paths() {
        let obj = object(json!({"reporter": {"id": "u1", "name": "Ada"}}));
        assert_eq!(obj.get("reporter.name"), Some(&json!("Ada")));
        assert_eq!(obj.get("reporter.email"), None);
        assert_eq!(obj.get("assignee.name"), None);
    }

    #[test]
    fn serialization_is_transparent() {
        let obj = object(json!({"id": "a", "title": "t"}));
        let text = serde_json::to_string(&obj).unwrap();
        assert_eq!(text, r#"{"id":"a","title":"t"}"#);
        let back: SchemaObject = serde_json::from_str(&text).unwrap();
        assert_eq!(back, obj);
    }
}
