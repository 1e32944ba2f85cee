pub mod external_item;
pub mod schema_object;

/// One source record as supplied by the caller: field name to scalar or
/// reference-object value.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
