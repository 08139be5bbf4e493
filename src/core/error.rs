//! Error types for the codec
//!
//! Validation and schema failures are raised before any wire interaction;
//! protocol failures carry the server's reason verbatim; decode failures abort
//! the whole response so no partially built result escapes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CodecError {
    /// Whether the failure was raised before anything reached the wire
    pub fn is_validation(&self) -> bool {
        matches!(self, CodecError::Validation(_) | CodecError::Schema(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Row set is empty")]
    EmptyRows,

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Row {row}: field '{field}' does not exist in the collection schema")]
    UnknownField { row: usize, field: String },

    #[error("Row {row}: field '{field}' expects {expected} vector elements, found {actual}")]
    DimensionMismatch {
        row: usize,
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),

    #[error("Collection schema has no vector field")]
    MissingVectorField,

    #[error("Search request carries no query vectors")]
    NoQueryVectors,

    #[error("Field '{0}' is not a vector field of the collection")]
    NotAVectorField(String),

    #[error("nq is {nq} but {vectors} query vectors were supplied")]
    QueryCountMismatch { nq: i64, vectors: usize },

    #[error("round_decimal must be between -1 and {max}, got {value}")]
    InvalidRoundDecimal { value: i64, max: u32 },

    #[error("Row {row}: no value for field '{field}'")]
    MissingValue { row: usize, field: String },

    #[error("Row {row}: field '{field}' expects {expected}")]
    InvalidValue {
        row: usize,
        field: String,
        expected: &'static str,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Vector field '{field}' has no dimension")]
    MissingDimension { field: String },

    #[error("Field '{field}' has invalid dimension '{value}'")]
    InvalidDimension { field: String, value: String },

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),
}

/// Non-zero status returned by the server
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct ProtocolError {
    pub code: i32,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Field '{field}' entry {index} is not valid JSON: {source}")]
    InvalidJson {
        field: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field '{field}' carries unexpected {kind} data")]
    UnexpectedDiscriminant { field: String, kind: &'static str },

    #[error("Field '{0}' carries no data")]
    MissingColumnData(String),

    #[error("Vector field '{field}' holds {len} elements, not a multiple of {width}")]
    RaggedVector {
        field: String,
        len: usize,
        width: usize,
    },

    #[error("Vector field '{field}' has invalid dimension {dim}")]
    InvalidDimension { field: String, dim: i64 },

    #[error("Top-k counts require {expected} scores, response holds {actual}")]
    TruncatedScores { expected: usize, actual: usize },

    #[error("Query {query} reports negative top-k {topk}")]
    InvalidTopK { query: usize, topk: i64 },

    #[error("Search response carries scores but no ids")]
    MissingIds,

    #[error("Column '{field}' has no entry at position {index}")]
    ColumnTooShort { field: String, index: usize },

    #[error("Malformed wire message: {0}")]
    Wire(#[from] prost::DecodeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
