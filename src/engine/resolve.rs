use serde_json::{Map, Value};

use crate::error::{ConvertError, ConvertResult};
use crate::model::RawRecord;

/// Resolution result for one source field path. The engine matches on this
/// exhaustively; shape detection happens here and nowhere else.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Scalar(Value),
    Reference { id: Value, name: Value },
    Missing,
}

/// Look up `path` (dot-separated) in `record`.
///
/// An absent path at any depth is `Missing`, not an error; resolution only
/// fails when the path traverses through a value that is not an object.
pub fn resolve(record: &RawRecord, path: &str) -> ConvertResult<ResolvedValue> {
    let mut current: &Map<String, Value> = record;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(value) = current.get(segment) else {
            return Ok(ResolvedValue::Missing);
        };
        if segments.peek().is_none() {
            return Ok(classify(value));
        }
        match value {
            Value::Object(inner) => current = inner,
            // ServiceNow nulls out unset fields; descending into one is the
            // same as the field being absent.
            Value::Null => return Ok(ResolvedValue::Missing),
            _ => {
                return Err(ConvertError::Resolution {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
        }
    }

    Ok(ResolvedValue::Missing)
}

/// ServiceNow emits references in two shapes: `{value, display_value}` from
/// the display-value API and `{link, value}` from the plain table API. Both
/// carry the stable id under `value`; only the first carries a label.
fn classify(value: &Value) -> ResolvedValue {
    match value {
        Value::Object(obj) if obj.contains_key("value") => ResolvedValue::Reference {
            id: obj.get("value").cloned().unwrap_or(Value::Null),
            name: obj.get("display_value").cloned().unwrap_or(Value::Null),
        },
        other => ResolvedValue::Scalar(other.clone()),
    }
}
