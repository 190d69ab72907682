//! Errors from typed parsing.

use crate::error::validation_error::ValidationError;

/// Why [`parse_as`](crate::SchemaExt::parse_as) produced no value.
#[derive(Debug, thiserror::Error)]
pub enum TypedParseError {
    /// The input failed validation.
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),

    /// The validated value does not fit the target type.
    #[error("validated value does not deserialize: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl TypedParseError {
    /// The validation error, if validation was what failed.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            TypedParseError::Invalid(err) => Some(err),
            TypedParseError::Deserialize(_) => None,
        }
    }
}
