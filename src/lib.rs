//! Normalizes ServiceNow incident JSON into a canonical schema object and
//! wraps it into an external item envelope for downstream ingestion.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use config::{ConvertOptions, MappingDocument, TimestampPolicy};
pub use engine::mapping::{MappingRule, MappingTable};
pub use engine::{Batch, Conversion, Converter, Diagnostic, RecordFailure};
pub use error::{ConvertError, ConvertResult, FieldFailure};
pub use model::external_item::ExternalItem;
pub use model::schema_object::SchemaObject;
pub use model::RawRecord;
