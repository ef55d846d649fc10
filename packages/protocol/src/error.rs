//! Error types for wire decoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected an array, found {0}")]
    NotAnArray(&'static str),

    #[error("Empty instruction")]
    EmptyInstruction,

    #[error("Instruction tag must be a string")]
    InvalidTag,

    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("Missing {field} in `{instruction}` instruction")]
    MissingField {
        instruction: &'static str,
        field: &'static str,
    },

    #[error("Unexpected trailing fields in `{instruction}` instruction: {count}")]
    UnexpectedFields {
        instruction: &'static str,
        count: usize,
    },

    #[error("Invalid index in `{instruction}` instruction: {value}")]
    InvalidIndex {
        instruction: &'static str,
        value: String,
    },

    #[error("Invalid {field} in `{instruction}` instruction: {value}")]
    InvalidString {
        instruction: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid node description: {0}")]
    InvalidNode(String),

    #[error("Invalid report: {0}")]
    InvalidReport(String),
}

/// JSON type name used in error messages
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
