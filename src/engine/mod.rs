pub mod external;
pub mod mapping;
pub mod resolve;
pub mod timestamp;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{ConvertOptions, MappingDocument};
use crate::error::{ConvertError, ConvertResult};
use crate::model::external_item::ExternalItem;
use crate::model::schema_object::SchemaObject;
use crate::model::RawRecord;
use self::mapping::MappingTable;

/// One lenient-policy field failure, downgraded to an omission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub source: String,
    pub dest: String,
    pub message: String,
}

/// A successful conversion: the normalized object plus any diagnostics
/// collected under the lenient policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub object: SchemaObject,
    pub diagnostics: Vec<Diagnostic>,
}

/// Batch result, partial-success: a failed record never affects siblings.
#[derive(Debug, Default)]
pub struct Batch {
    pub converted: Vec<Conversion>,
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug)]
pub struct RecordFailure {
    pub index: usize,
    pub error: ConvertError,
}

/// The conversion engine: one effective mapping table plus options, built
/// once and shared by reference into every call, so a batch can be fanned
/// out across threads without coordination.
#[derive(Debug, Default)]
pub struct Converter {
    table: MappingTable,
    options: ConvertOptions,
}

impl Converter {
    pub fn new(table: MappingTable, options: ConvertOptions) -> Self {
        Self { table, options }
    }

    /// Build a converter from override entries, validating destination
    /// uniqueness.
    pub fn with_overrides(
        overrides: &BTreeMap<String, String>,
        options: ConvertOptions,
    ) -> ConvertResult<Self> {
        Ok(Self::new(MappingTable::with_overrides(overrides)?, options))
    }

    /// Build a converter from a loaded mapping document, with `options`
    /// already merged by the caller (CLI flags win over document values).
    pub fn from_document(document: &MappingDocument, options: ConvertOptions) -> ConvertResult<Self> {
        Self::with_overrides(&document.mappings, options)
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Normalize one raw record into a SchemaObject.
    pub fn convert(&self, record: &RawRecord) -> ConvertResult<Conversion> {
        mapping::map_record(record, &self.table, &self.options)
    }

    /// Wrap a SchemaObject into the downstream envelope under the
    /// caller-supplied source tag.
    pub fn convert_to_external_item(
        &self,
        schema: &SchemaObject,
        source: &str,
    ) -> ConvertResult<ExternalItem> {
        external::build_external_item(schema, source, &self.options)
    }

    /// Convert a batch of independent records, continuing past per-record
    /// failures.
    pub fn convert_batch(&self, records: &[RawRecord]) -> Batch {
        let mut batch = Batch::default();
        for (index, record) in records.iter().enumerate() {
            match self.convert(record) {
                Ok(conversion) => batch.converted.push(conversion),
                Err(error) => {
                    tracing::error!("record {index}: {error}");
                    batch.failures.push(RecordFailure { index, error });
                }
            }
        }
        batch
    }
}
