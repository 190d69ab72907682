//! Schema definition errors.
//!
//! These are raised while a schema is being *built*, never while a value is
//! being validated. A [`SchemaBuildError`] means the schema itself is wrong.

use serde_json::Value;

use crate::error::validation_error::ValidationError;

/// Errors returned by schema constructors that reject their configuration.
#[derive(Debug, thiserror::Error)]
pub enum SchemaBuildError {
    /// A `default` value does not satisfy the schema it defaults.
    #[error("default value {value} is rejected by its schema: {source}")]
    InvalidDefault {
        value: Value,
        #[source]
        source: ValidationError,
    },

    /// A `prefault` value does not satisfy the schema it feeds.
    #[error("prefault value {value} is rejected by its schema: {source}")]
    InvalidPrefault {
        value: Value,
        #[source]
        source: ValidationError,
    },

    /// A `catch` fallback does not satisfy the schema it replaces.
    #[error("fallback value {value} is rejected by its schema: {source}")]
    InvalidFallback {
        value: Value,
        #[source]
        source: ValidationError,
    },

    /// `safe_extend` was given a key the shape already declares.
    #[error("key '{0}' already exists in the object shape")]
    KeyCollision(String),

    /// A discriminated union option is not an object schema.
    #[error("discriminated union option {index} is not an object schema")]
    OptionNotObject { index: usize },

    /// A discriminated union option does not declare the discriminator key.
    #[error("discriminated union option {index} does not declare discriminator '{discriminator}'")]
    MissingDiscriminator { index: usize, discriminator: String },

    /// The discriminator field of an option is not a literal or enum schema.
    #[error(
        "discriminator '{discriminator}' of option {index} must be a literal or enum schema"
    )]
    DiscriminatorNotLiteral { index: usize, discriminator: String },

    /// Two options share a discriminator value.
    #[error("duplicate discriminator value {value} for '{discriminator}'")]
    DuplicateDiscriminator { discriminator: String, value: Value },

    /// A string pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
