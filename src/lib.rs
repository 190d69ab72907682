//! # Inquest
//!
//! A composable validation engine for JSON-like values that accumulates ALL
//! validation issues instead of stopping at the first one.
//!
//! ## Overview
//!
//! Schemas are built from small pieces (strings, numbers, objects, unions,
//! codecs and so on) and validate a [`serde_json::Value`] into a new output
//! value. Every failure is an [`Issue`] carrying a machine-readable kind, a
//! human message and the [`JsonPath`] where it happened. Issues accumulate
//! through stillwater's `Validation` type, so one run reports every problem.
//!
//! ## Core Types
//!
//! - [`Schema`]: factory for every schema kind
//! - [`SchemaLike`]: the validator contract every schema implements
//! - [`SchemaExt`]: parse, encode and wrapping combinators on every schema
//! - [`ValidationError`]: a non-empty collection of [`Issue`]s, with tree,
//!   flattened and pretty views
//! - [`ValidationContext`]: per-run settings such as the message resolver,
//!   depth limit and direction
//!
//! ## Example
//!
//! ```rust
//! use inquest::{Schema, SchemaExt};
//! use serde_json::json;
//!
//! let signup = Schema::object()
//!     .field("email", Schema::string().pattern("^[^@]+@[^@]+$").unwrap())
//!     .field("age", Schema::int().min(13.0))
//!     .strict();
//!
//! let output = signup.parse(&json!({"email": "ada@example.com", "age": 36})).unwrap();
//! assert_eq!(output["age"], json!(36));
//!
//! // Every problem is reported, each at its own path.
//! let err = signup
//!     .parse(&json!({"email": "nope", "age": 7, "extra": true}))
//!     .unwrap_err();
//! assert_eq!(err.len(), 3);
//! println!("{}", err.prettify());
//! ```

pub mod error;
pub mod locale;
pub mod path;
pub mod schema;
pub mod validation;

pub use error::{
    flatten, format_nested, prettify, to_json, treeify, ErrorTree, FlattenedError, Issue, IssueKind,
    SchemaBuildError, SizeOrigin, TypedParseError, ValidationError,
};
pub use locale::{EnglishMessages, MessageResolver};
pub use path::{JsonPath, PathSegment};
pub use schema::{
    AnySchema, ArraySchema, BooleanSchema, BrandSchema, Branded, CatchSchema, CodecSchema,
    CustomSchema, DefaultSchema, DiscriminatedUnionSchema, DynSchema, EnumSchema,
    IntersectionSchema, LazySchema, LiteralSchema, NeverSchema, NullSchema, NullableSchema,
    NullishSchema, NumberSchema, ObjectSchema, OptionalSchema, PipeSchema, PrefaultSchema,
    PreprocessSchema, ReadonlySchema, RecordMode, RecordSchema, RefineOptions, RefineSchema,
    RefinementCtx, Schema, SchemaExt, SchemaKind, SchemaLike, StringSchema, SuperRefineSchema,
    TransformSchema, TupleSchema, UnionSchema, UnknownKeys, XorSchema,
};
pub use validation::{Direction, ValidationContext, DEFAULT_MAX_DEPTH};

/// Result of running a schema: the output, or every issue found.
pub type ValidationResult<T> = stillwater::Validation<T, ValidationError>;

/// The names most programs need.
///
/// ```rust
/// use inquest::prelude::*;
/// use serde_json::json;
///
/// let result: ValidationResult<_> = Schema::boolean().safe_parse(&json!(true));
/// assert!(result.is_success());
/// ```
pub mod prelude {
    pub use crate::{
        DynSchema, Issue, IssueKind, JsonPath, Schema, SchemaExt, SchemaLike, ValidationContext,
        ValidationError, ValidationResult,
    };
}
