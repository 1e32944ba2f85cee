use std::fmt;

/// A single field-level failure collected while walking the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub source: String,
    pub dest: String,
    pub message: String,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.source, self.dest, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot resolve `{path}`: `{segment}` is not an object")]
    Resolution { path: String, segment: String },
    #[error("unrecognized timestamp `{value}` at `{path}`")]
    Normalization { path: String, value: String },
    #[error("record conversion failed: {}", summarize(.failures))]
    Conversion { failures: Vec<FieldFailure> },
    #[error("external item validation failed: {0}")]
    Validation(String),
    #[error("duplicate mapping destination `{dest}`")]
    DuplicateDestination { dest: String },
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

fn summarize(failures: &[FieldFailure]) -> String {
    failures
        .iter()
        .map(FieldFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
