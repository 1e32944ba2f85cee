use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Error-handling mode for per-field failures during mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    #[default]
    Strict,
    Lenient,
}

impl TimestampPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampPolicy::Strict => "strict",
            TimestampPolicy::Lenient => "lenient",
        }
    }

    pub fn is_lenient(&self) -> bool {
        matches!(self, TimestampPolicy::Lenient)
    }
}

/// Engine options, shared immutably across every conversion in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    pub preserve_raw: bool,
    pub timestamp_policy: TimestampPolicy,
}

/// Mapping/options document merged over the default table. The `mappings`
/// table maps one source field path to one destination path.
#[derive(Debug, Deserialize, Default)]
pub struct MappingDocument {
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
    #[serde(default)]
    pub preserve_raw: bool,
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,
}

impl MappingDocument {
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            preserve_raw: self.preserve_raw,
            timestamp_policy: self.timestamp_policy,
        }
    }
}

/// Load a mapping document, picking the parser from the file extension:
/// `.yaml`/`.yml` and `.toml` are recognized, everything else is read as
/// JSON.
pub fn load_mapping(path: &Path) -> Result<MappingDocument> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping document {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let document = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML mapping {}", path.display()))?,
        Some("toml") => toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML mapping {}", path.display()))?,
        _ => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON mapping {}", path.display()))?,
    };

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn json_yaml_and_toml_parse_to_the_same_document() {
        let dir = tempfile::tempdir().unwrap();
        let json = write_temp(
            &dir,
            "map.json",
            r#"{"mappings": {"u_ticket_owner": "properties.ticket_owner"}, "preserve_raw": true}"#,
        );
        let yaml = write_temp(
            &dir,
            "map.yaml",
            "mappings:\n  u_ticket_owner: properties.ticket_owner\npreserve_raw: true\n",
        );
        let toml = write_temp(
            &dir,
            "map.toml",
            "preserve_raw = true\n\n[mappings]\nu_ticket_owner = \"properties.ticket_owner\"\n",
        );

        for path in [json, yaml, toml] {
            let doc = load_mapping(&path).unwrap();
            assert_eq!(
                doc.mappings.get("u_ticket_owner").map(String::as_str),
                Some("properties.ticket_owner"),
                "mismatch for {}",
                path.display()
            );
            assert!(doc.preserve_raw);
            assert_eq!(doc.timestamp_policy, TimestampPolicy::Strict);
        }
    }

    #[test]
    fn empty_document_defaults_to_strict_and_no_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "map.json", "{}");
        let doc = load_mapping(&path).unwrap();
        assert!(doc.mappings.is_empty());
        assert!(!doc.preserve_raw);
        assert_eq!(doc.timestamp_policy, TimestampPolicy::Strict);
    }

    #[test]
    fn lenient_policy_parses_from_lowercase() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "map.json", r#"{"timestamp_policy": "lenient"}"#);
        let doc = load_mapping(&path).unwrap();
        assert!(doc.timestamp_policy.is_lenient());
    }

    #[test]
    fn unknown_policy_value_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "map.json", r#"{"timestamp_policy": "sloppy"}"#);
        assert!(load_mapping(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_mapping(&dir.path().join("nope.json"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("nope.json"));
    }
}
