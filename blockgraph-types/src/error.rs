use thiserror::Error;

/// Errors raised while constructing or converting the value primitives in this crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("error parsing '{input}' as {dtype}: {reason}")]
    ParseError {
        input: String,
        dtype: String,
        reason: String,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("unsupported data type: {0}")]
    UnsupportedType(String),
}
