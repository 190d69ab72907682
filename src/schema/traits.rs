//! The validator contract.
//!
//! Every schema implements [`SchemaLike`]. The trait is object safe, so
//! schemas of different types compose through [`DynSchema`]
//! (`Arc<dyn SchemaLike>`), and every aggregate stores its children that way.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{IssueKind, ValidationError};
use crate::path::JsonPath;
use crate::schema::object::ObjectSchema;
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// A shared, type-erased schema.
pub type DynSchema = Arc<dyn SchemaLike>;

/// Capability tag identifying what a schema is.
///
/// Tags are assigned by each schema type and never derived from type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    Null,
    Any,
    Never,
    Literal,
    Enum,
    Custom,
    Object,
    Array,
    Tuple,
    Record,
    Union,
    Xor,
    DiscriminatedUnion,
    Intersection,
    Lazy,
    Codec,
    Optional,
    Nullable,
    Nullish,
    Default,
    Prefault,
    Catch,
    Readonly,
    Brand,
    Refine,
    SuperRefine,
    Transform,
    Preprocess,
    Pipe,
}

/// An inline check an object applies to a field instead of calling into the
/// field's schema.
///
/// Only unconstrained leaves offer one: when the check passes, the full
/// validation would have returned the input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastCheck {
    String,
    Number,
    Boolean,
    Null,
    Any,
}

impl FastCheck {
    /// Returns true if `value` passes without further validation.
    #[inline]
    pub fn check(&self, value: &Value) -> bool {
        match self {
            FastCheck::String => value.is_string(),
            FastCheck::Number => value.is_number(),
            FastCheck::Boolean => value.is_boolean(),
            FastCheck::Null => value.is_null(),
            FastCheck::Any => true,
        }
    }
}

/// A schema that validates JSON values.
///
/// `validate` checks a present value; `validate_missing` handles an absent one
/// (a missing object key or tuple slot). A `Success(None)` from
/// `validate_missing` means the value stays absent in the output.
///
/// The async methods default to the synchronous result. Schemas that hold
/// async callbacks, and aggregates that hold such schemas, override them.
///
/// # Example
///
/// ```rust
/// use inquest::{JsonPath, Schema, SchemaLike, ValidationContext};
/// use serde_json::json;
///
/// let name = Schema::string().min_len(1);
/// let ctx = ValidationContext::new();
///
/// assert!(name.validate(&json!("Ada"), &JsonPath::root(), &ctx).is_success());
/// assert!(name.validate_missing(&JsonPath::root(), &ctx).is_failure());
/// ```
pub trait SchemaLike: Send + Sync {
    /// Validates a present value.
    fn validate(&self, value: &Value, path: &JsonPath, ctx: &ValidationContext)
        -> ValidationResult<Value>;

    /// Validates an absent value. Fails with `invalid_type` unless overridden.
    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        ctx.fail(
            IssueKind::invalid_type(self.accepts().to_string(), "undefined"),
            path,
            None,
        )
    }

    /// Asynchronous form of [`validate`](SchemaLike::validate).
    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        future::ready(self.validate(value, path, ctx)).boxed()
    }

    /// Asynchronous form of [`validate_missing`](SchemaLike::validate_missing).
    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        future::ready(self.validate_missing(path, ctx)).boxed()
    }

    /// The capability tag of this schema.
    fn kind(&self) -> SchemaKind;

    /// JSON types this schema could accept. May over-approximate.
    fn accepts(&self) -> TypeSet {
        TypeSet::ALL
    }

    /// True if an absent value can succeed.
    fn accepts_missing(&self) -> bool {
        false
    }

    /// The inline check for the object fast path, if this is an
    /// unconstrained leaf.
    fn fast_check(&self) -> Option<FastCheck> {
        None
    }

    /// Returns the object schema if this is one.
    fn as_object(&self) -> Option<&ObjectSchema> {
        None
    }

    /// The fixed set of values this schema accepts, for literal and enum
    /// schemas.
    fn discriminator_values(&self) -> Option<Vec<Value>> {
        None
    }

    /// The wrapped schema if this is an `optional` wrapper.
    fn unwrap_optional(&self) -> Option<DynSchema> {
        None
    }

    /// Converts into a shared schema without double wrapping.
    fn into_shared(self) -> DynSchema
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

impl SchemaLike for Arc<dyn SchemaLike> {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        (**self).validate(value, path, ctx)
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        (**self).validate_missing(path, ctx)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        (**self).validate_async(value, path, ctx)
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        (**self).validate_missing_async(path, ctx)
    }

    fn kind(&self) -> SchemaKind {
        (**self).kind()
    }

    fn accepts(&self) -> TypeSet {
        (**self).accepts()
    }

    fn accepts_missing(&self) -> bool {
        (**self).accepts_missing()
    }

    fn fast_check(&self) -> Option<FastCheck> {
        (**self).fast_check()
    }

    fn as_object(&self) -> Option<&ObjectSchema> {
        (**self).as_object()
    }

    fn discriminator_values(&self) -> Option<Vec<Value>> {
        (**self).discriminator_values()
    }

    fn unwrap_optional(&self) -> Option<DynSchema> {
        (**self).unwrap_optional()
    }

    fn into_shared(self) -> DynSchema
    where
        Self: Sized + 'static,
    {
        self
    }
}

/// Reports a wrong-typed input.
pub(crate) fn type_mismatch<T>(
    expected: &str,
    value: &Value,
    path: &JsonPath,
    ctx: &ValidationContext,
    message: Option<&str>,
) -> ValidationResult<T> {
    let kind = IssueKind::invalid_type(expected, ValueType::of(value).name());
    Validation::Failure(ValidationError::single(ctx.issue_with_message(
        kind,
        path,
        Some(value),
        message,
    )))
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<DynSchema>();
    assert_sync::<DynSchema>();
};
