//! Entry points and combinators available on every schema.

use std::fmt::Display;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stillwater::Validation;

use crate::error::{SchemaBuildError, TypedParseError, ValidationError};
use crate::path::JsonPath;
use crate::schema::array::ArraySchema;
use crate::schema::effects::{
    Callback, Predicate, PreprocessSchema, RefineOptions, RefineSchema, RefinementCtx,
    SuperRefineSchema, TransformSchema,
};
use crate::schema::intersection::IntersectionSchema;
use crate::schema::pipe::PipeSchema;
use crate::schema::traits::SchemaLike;
use crate::schema::union::UnionSchema;
use crate::schema::wrappers::{
    BrandSchema, CatchSchema, DefaultSchema, NullableSchema, NullishSchema, OptionalSchema,
    PrefaultSchema, ReadonlySchema,
};
use crate::validation::{Direction, ValidationContext};
use crate::ValidationResult;

fn log_outcome<T>(result: ValidationResult<T>, operation: &'static str) -> ValidationResult<T> {
    if let Validation::Failure(err) = &result {
        tracing::trace!(operation, issues = err.len(), "validation failed");
    }
    result
}

/// Parsing, encoding and wrapping for any [`SchemaLike`].
///
/// Implemented for every schema. The `safe_*` methods return a
/// [`ValidationResult`] holding either the output or every issue found; the
/// plain variants convert that into a `Result`.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let age = Schema::int().non_negative().optional();
///
/// assert!(age.safe_parse(&json!(30)).is_success());
/// assert_eq!(age.safe_parse_missing().into_result().unwrap(), None);
/// assert_eq!(age.parse(&json!(-1)).unwrap_err().first().code(), "too_small");
/// ```
pub trait SchemaExt: SchemaLike + Sized + 'static {
    /// Validates `value` with a default context.
    fn safe_parse(&self, value: &Value) -> ValidationResult<Value> {
        self.safe_parse_with(value, &ValidationContext::new())
    }

    /// Validates `value` with the given context.
    fn safe_parse_with(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult<Value> {
        log_outcome(self.validate(value, &JsonPath::root(), ctx), "parse")
    }

    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.safe_parse(value).into_result()
    }

    fn parse_with(&self, value: &Value, ctx: &ValidationContext) -> Result<Value, ValidationError> {
        self.safe_parse_with(value, ctx).into_result()
    }

    /// Validates an absent value. `Success(None)` means the output is absent
    /// too.
    fn safe_parse_missing(&self) -> ValidationResult<Option<Value>> {
        let ctx = ValidationContext::new();
        log_outcome(self.validate_missing(&JsonPath::root(), &ctx), "parse_missing")
    }

    /// Validates then deserializes the output into `T`.
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Deserialize)]
    /// struct Point { x: f64, y: f64 }
    ///
    /// let schema = Schema::object()
    ///     .field("x", Schema::number())
    ///     .field("y", Schema::number());
    /// let p: Point = schema.parse_as(&json!({"x": 1, "y": 2, "z": 3})).unwrap();
    /// assert_eq!((p.x, p.y), (1.0, 2.0));
    /// ```
    fn parse_as<T: DeserializeOwned>(&self, value: &Value) -> Result<T, TypedParseError> {
        let output = self.parse(value)?;
        Ok(serde_json::from_value(output)?)
    }

    /// Validates many inputs in parallel. Results keep the input order.
    fn safe_parse_par(&self, values: &[Value]) -> Vec<ValidationResult<Value>> {
        values.par_iter().map(|value| self.safe_parse(value)).collect()
    }

    /// Validates `value`, awaiting async refinements and transforms.
    fn safe_parse_async<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let ctx = ValidationContext::new();
            self.safe_parse_async_with(value, &ctx).await
        }
        .boxed()
    }

    fn safe_parse_async_with<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let path = JsonPath::root();
            let result = self.validate_async(value, &path, ctx).await;
            log_outcome(result, "parse_async")
        }
        .boxed()
    }

    fn parse_async<'a>(
        &'a self,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ValidationError>> {
        self.safe_parse_async(value).map(Validation::into_result).boxed()
    }

    /// Alias for [`safe_parse`](SchemaExt::safe_parse), paired with
    /// [`safe_encode`](SchemaExt::safe_encode).
    fn safe_decode(&self, value: &Value) -> ValidationResult<Value> {
        self.safe_parse(value)
    }

    fn decode(&self, value: &Value) -> Result<Value, ValidationError> {
        self.parse(value)
    }

    /// Runs the schema in the encode direction.
    ///
    /// Codecs apply their encode function and validate their input side.
    /// Preprocessors pass values through and one-way transforms fail with
    /// `encode_failed`.
    fn safe_encode(&self, value: &Value) -> ValidationResult<Value> {
        let ctx = ValidationContext::new().with_direction(Direction::Encode);
        log_outcome(self.validate(value, &JsonPath::root(), &ctx), "encode")
    }

    fn encode(&self, value: &Value) -> Result<Value, ValidationError> {
        self.safe_encode(value).into_result()
    }

    fn safe_encode_async<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let ctx = ValidationContext::new().with_direction(Direction::Encode);
            let path = JsonPath::root();
            let result = self.validate_async(value, &path, &ctx).await;
            log_outcome(result, "encode_async")
        }
        .boxed()
    }

    fn encode_async<'a>(
        &'a self,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ValidationError>> {
        self.safe_encode_async(value).map(Validation::into_result).boxed()
    }

    /// Accepts an absent value in addition to what `self` accepts.
    fn optional(self) -> OptionalSchema {
        OptionalSchema::new(self.into_shared())
    }

    /// Accepts `null` in addition to what `self` accepts.
    fn nullable(self) -> NullableSchema {
        NullableSchema::new(self.into_shared())
    }

    /// Accepts both `null` and an absent value.
    fn nullish(self) -> NullishSchema {
        NullishSchema::new(self.into_shared())
    }

    /// Replaces an absent value with `value`, which must itself pass.
    fn default(self, value: Value) -> Result<DefaultSchema, SchemaBuildError> {
        DefaultSchema::new(self.into_shared(), value)
    }

    /// Validates `value` in place of an absent input.
    fn prefault(self, value: Value) -> Result<PrefaultSchema, SchemaBuildError> {
        PrefaultSchema::new(self.into_shared(), value)
    }

    /// Replaces any failure with `fallback`.
    fn catch(self, fallback: Value) -> Result<CatchSchema, SchemaBuildError> {
        CatchSchema::new(self.into_shared(), fallback)
    }

    /// Adds a check on the output. A false result becomes a custom issue
    /// with `message`.
    fn refine<F>(self, check: F, message: impl Into<String>) -> RefineSchema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_with(check, RefineOptions::new().message(message))
    }

    fn refine_with<F>(self, check: F, options: RefineOptions) -> RefineSchema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        RefineSchema::new(self.into_shared(), Predicate::sync(check), options)
    }

    /// Adds an async check. Sync entry points report `async_unsupported`.
    fn refine_async<F, Fut>(self, check: F, message: impl Into<String>) -> RefineSchema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        RefineSchema::new(
            self.into_shared(),
            Predicate::asynchronous(check),
            RefineOptions::new().message(message),
        )
    }

    /// Adds a check that reports any number of issues at any path.
    fn super_refine<F>(self, refinement: F) -> SuperRefineSchema
    where
        F: Fn(&Value, &mut RefinementCtx<'_>) + Send + Sync + 'static,
    {
        SuperRefineSchema::new(self.into_shared(), refinement)
    }

    /// Converts the output. An `Err` becomes a `transform` issue.
    fn transform<F, E>(self, f: F) -> TransformSchema
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Display,
    {
        TransformSchema::new(self.into_shared(), Callback::fallible(f))
    }

    /// Converts the output with a function that cannot fail.
    fn map<F>(self, f: F) -> TransformSchema
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        TransformSchema::new(self.into_shared(), Callback::infallible(f))
    }

    fn transform_async<F, Fut, E>(self, f: F) -> TransformSchema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Display,
    {
        TransformSchema::new(self.into_shared(), Callback::asynchronous(f))
    }

    /// Converts the input before `self` sees it.
    fn preprocess<F, E>(self, f: F) -> PreprocessSchema
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Display,
    {
        PreprocessSchema::new(Callback::fallible(f), self.into_shared())
    }

    /// Tags the output type with `B`.
    fn brand<B: 'static>(self) -> BrandSchema<B> {
        BrandSchema::new(self.into_shared())
    }

    fn readonly(self) -> ReadonlySchema {
        ReadonlySchema::new(self.into_shared())
    }

    /// Applies a reusable schema building step.
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt, StringSchema};
    ///
    /// fn slug(s: StringSchema) -> StringSchema {
    ///     s.min_len(1).max_len(64)
    /// }
    ///
    /// let schema = Schema::string().apply(slug);
    /// assert!(schema.parse(&serde_json::json!("")).is_err());
    /// ```
    fn apply<R, F>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }

    /// Feeds the output of `self` into `next`.
    fn pipe<S: SchemaLike + 'static>(self, next: S) -> PipeSchema {
        PipeSchema::new(self.into_shared(), next.into_shared())
    }

    /// A union of `self` and `other`.
    fn or<S: SchemaLike + 'static>(self, other: S) -> UnionSchema {
        UnionSchema::new(vec![self.into_shared(), other.into_shared()])
    }

    /// An intersection of `self` and `other`.
    fn and<S: SchemaLike + 'static>(self, other: S) -> IntersectionSchema {
        IntersectionSchema::new(self.into_shared(), other.into_shared())
    }

    /// An array of `self`.
    fn array(self) -> ArraySchema {
        ArraySchema::new(self.into_shared())
    }
}

impl<S: SchemaLike + 'static> SchemaExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_parse_as_reports_both_failure_kinds() {
        #[derive(Debug, Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }

        let schema = Schema::object().field("name", Schema::string());
        let err = schema.parse_as::<Named>(&json!({})).unwrap_err();
        assert_eq!(err.validation_error().map(|e| e.first().code()), Some("invalid_type"));

        let err = Schema::any().parse_as::<Named>(&json!(5)).unwrap_err();
        assert!(matches!(err, TypedParseError::Deserialize(_)));
    }

    #[test]
    fn test_parallel_results_keep_order() {
        let schema = Schema::number().min(0.0);
        let inputs: Vec<Value> = (-2..3).map(|n| json!(n)).collect();
        let results = schema.safe_parse_par(&inputs);
        let ok: Vec<bool> = results.iter().map(|r| r.is_success()).collect();
        assert_eq!(ok, vec![false, false, true, true, true]);
    }

    #[test]
    fn test_or_and_array_sugar() {
        let id = Schema::string().or(Schema::int()).array();
        assert!(id.parse(&json!(["a", 1])).is_ok());
        assert!(id.parse(&json!([true])).is_err());

        let both = Schema::number().and(Schema::number().max(3.0));
        assert!(both.parse(&json!(4)).is_err());
    }

    #[test]
    fn test_transforms_are_one_way() {
        let schema = Schema::string().map(|v| json!(v.as_str().map(str::len)));
        assert_eq!(schema.parse(&json!("abc")).unwrap(), json!(3));
        assert_eq!(schema.encode(&json!("abc")).unwrap_err().first().code(), "encode_failed");
    }

    #[test]
    fn test_preprocess_sugar() {
        let schema = Schema::number().preprocess(|v| match v {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|n| json!(n))
                .map_err(|e| e.to_string()),
            other => Ok(other),
        });
        assert_eq!(schema.parse(&json!(" 4 ")).unwrap(), json!(4.0));
    }
}
