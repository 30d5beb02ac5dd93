use blockgraph_types::TypesError;
use thiserror::Error;

/// Errors raised by the block graph engine.
///
/// Parsing, identifier, and container-misuse errors (the first few variants
/// here) surface immediately from the call that triggered them. Block-level
/// validity (a block with unconnected inputs, say) does not raise one of
/// these — it lives in [`crate::block::Block::has_error`] and is collected
/// with [`crate::model::Model::get_all_errors`]. Compile-time failures
/// (type propagation, scheduling, codegen) surface from the compile call.
/// A successfully compiled model's `step`/`reset` never return this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
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

    #[error("{0} is out of range")]
    OutOfRange(String),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("duplicate connection: {0}")]
    DuplicateConnection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("null input: {0}")]
    NullInput(String),

    #[error("unconnected: {0}")]
    Unconnected(String),

    #[error("type propagation did not converge")]
    TypePropagationDivergent,

    #[error("unresolvable cycle in the block graph")]
    UnresolvableCycle,

    #[error("compile error: {0}")]
    CompileError(String),

    #[error("unsupported data type: {0}")]
    UnsupportedType(String),

    #[error("unknown block: {0}")]
    UnknownBlock(String),

    #[error("unsupported codegen language: {0}")]
    UnsupportedLanguage(String),

    #[error("io error: {0}")]
    IoError(String),
}

impl From<TypesError> for ModelError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidIdentifier(s) => ModelError::InvalidIdentifier(s),
            TypesError::ParseError { input, dtype, reason } => ModelError::ParseError { input, dtype, reason },
            TypesError::TypeMismatch { expected, found } => ModelError::TypeMismatch { expected, found },
            TypesError::UnsupportedType(s) => ModelError::UnsupportedType(s),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A non-fatal, block-scoped validity problem (unconnected input, mismatched
/// types on a port, and the like). These never propagate as a [`ModelError`];
/// they accumulate on the block and are surfaced through
/// [`crate::block::Block::has_error`] and [`crate::model::Model::get_all_errors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockError {
    pub block_id: String,
    pub message: String,
}

impl BlockError {
    pub fn new(block_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BlockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block '{}': {}", self.block_id, self.message)
    }
}
