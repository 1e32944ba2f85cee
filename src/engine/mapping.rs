use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use super::resolve::{self, ResolvedValue};
use super::timestamp::{self, Normalized};
use super::{Conversion, Diagnostic};
use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertResult, FieldFailure};
use crate::model::schema_object::SchemaObject;
use crate::model::RawRecord;

/// One source-path-to-destination-path association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    pub source: String,
    pub dest: String,
}

/// Default incident mapping: ServiceNow field to schema destination.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("sys_id", "id"),
    ("number", "source_id"),
    ("short_description", "title"),
    ("description", "description"),
    ("opened_by", "reporter"),
    ("assigned_to", "assignee"),
    ("priority", "priority"),
    ("state", "status"),
    ("category", "category"),
    ("opened_at", "created_at"),
    ("closed_at", "closed_at"),
];

/// The effective, immutable rule set for a conversion run. Destination paths
/// are unique; an override replaces the default rule sharing its destination
/// and is appended otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    rules: Vec<MappingRule>,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(source, dest)| MappingRule {
                    source: (*source).to_string(),
                    dest: (*dest).to_string(),
                })
                .collect(),
        }
    }
}

impl MappingTable {
    /// Merge override entries (source path -> destination path) over the
    /// default table. Two overrides sharing a destination are rejected
    /// rather than silently last-wins, since mapping documents are parsed
    /// from unordered maps.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> ConvertResult<Self> {
        let mut table = Self::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for (source, dest) in overrides {
            if !seen.insert(dest.as_str()) {
                return Err(ConvertError::DuplicateDestination { dest: dest.clone() });
            }
            match table.rules.iter_mut().find(|rule| rule.dest == *dest) {
                Some(rule) => rule.source = source.clone(),
                None => table.rules.push(MappingRule {
                    source: source.clone(),
                    dest: dest.clone(),
                }),
            }
        }

        Ok(table)
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }
}

/// Walk the effective table over one record and assemble the SchemaObject.
///
/// Strict policy: field-level failures are collected and the record aborts
/// with a single aggregated error. Lenient policy: each failure downgrades
/// to an omitted destination plus a diagnostic entry.
pub fn map_record(
    record: &RawRecord,
    table: &MappingTable,
    options: &ConvertOptions,
) -> ConvertResult<Conversion> {
    let lenient = options.timestamp_policy.is_lenient();
    let mut out = Map::new();
    let mut failures: Vec<FieldFailure> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for rule in table.rules() {
        match resolve::resolve(record, &rule.source) {
            Err(err) => {
                if lenient {
                    push_diagnostic(&mut diagnostics, rule, err.to_string());
                } else {
                    failures.push(FieldFailure {
                        source: rule.source.clone(),
                        dest: rule.dest.clone(),
                        message: err.to_string(),
                    });
                }
            }
            Ok(ResolvedValue::Reference { id, name }) => {
                insert_path(&mut out, &format!("{}.id", rule.dest), id);
                insert_path(&mut out, &format!("{}.name", rule.dest), name);
            }
            Ok(ResolvedValue::Missing) => {
                // Timestamps are conventionally present-as-null to signal
                // "known absent"; everything else stays omitted.
                if is_timestamp_dest(&rule.dest) {
                    insert_path(&mut out, &rule.dest, Value::Null);
                }
            }
            Ok(ResolvedValue::Scalar(value)) => {
                if is_timestamp_dest(&rule.dest) {
                    apply_timestamp(
                        &mut out,
                        rule,
                        value,
                        options,
                        &mut failures,
                        &mut diagnostics,
                    );
                } else if !is_unset_scalar(&value) {
                    insert_path(&mut out, &rule.dest, value);
                }
            }
        }
    }

    if !failures.is_empty() {
        return Err(ConvertError::Conversion { failures });
    }

    if options.preserve_raw {
        out.insert("raw".to_string(), Value::Object(record.clone()));
    }

    tracing::debug!(
        "mapped record into {} field(s), {} diagnostic(s)",
        out.len(),
        diagnostics.len()
    );

    Ok(Conversion {
        object: SchemaObject::from_map(out),
        diagnostics,
    })
}

fn apply_timestamp(
    out: &mut Map<String, Value>,
    rule: &MappingRule,
    value: Value,
    options: &ConvertOptions,
    failures: &mut Vec<FieldFailure>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let raw = match &value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    };

    match timestamp::normalize(raw.as_deref(), &rule.source, options.timestamp_policy) {
        Ok(Normalized::Absent) => insert_path(out, &rule.dest, Value::Null),
        Ok(Normalized::Canonical(ts)) => insert_path(out, &rule.dest, Value::String(ts)),
        Ok(Normalized::Unparsed(original)) => {
            // timestamp destinations hold canonical values only; the
            // unparsed original is left unset
            push_diagnostic(
                diagnostics,
                rule,
                format!("unrecognized timestamp `{original}` left unset"),
            );
        }
        Err(err) => failures.push(FieldFailure {
            source: rule.source.clone(),
            dest: rule.dest.clone(),
            message: err.to_string(),
        }),
    }
}

fn push_diagnostic(diagnostics: &mut Vec<Diagnostic>, rule: &MappingRule, message: String) {
    tracing::warn!("{} -> {}: {}", rule.source, rule.dest, message);
    diagnostics.push(Diagnostic {
        source: rule.source.clone(),
        dest: rule.dest.clone(),
        message,
    });
}

/// Destinations whose final segment ends in `_at` hold timestamps.
fn is_timestamp_dest(dest: &str) -> bool {
    dest.rsplit('.')
        .next()
        .map_or(false, |leaf| leaf.ends_with("_at"))
}

/// ServiceNow marks unset fields with an empty string.
fn is_unset_scalar(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

/// Write `value` at a dot-notation destination, creating intermediate
/// objects as needed.
fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}
